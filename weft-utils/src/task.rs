//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{self, Instant};

/// Handle to a background task of a routing instance.
///
/// The socket Rx/Tx loops and every timer below run under one of these.
/// Abort is tied to drop, so tearing down the owning state reclaims all
/// of an instance's background work without extra bookkeeping.
#[derive(Debug)]
pub struct Task<T> {
    handle: tokio::task::JoinHandle<T>,
}

/// One-shot timer with a fixed duration, armed at creation.
///
/// This is what drives neighbor expiry and the SPF hold-down: both are
/// deadlines that get pushed back (a hello arrived, the topology changed
/// again) an arbitrary number of times before they fire. Dropping the
/// handle disarms the timer.
///
/// Under the `testing` feature the timer is an inert stub; tests trigger
/// expiry by injecting the corresponding event directly.
#[derive(Debug)]
pub struct TimeoutTask {
    #[cfg(not(feature = "testing"))]
    _task: Task<()>,
    #[cfg(not(feature = "testing"))]
    restartp: UnboundedSender<()>,
}

/// Repeating ticker with a fixed period, used to pace hello emission.
///
/// The first tick fires as soon as the task starts, so a fresh instance
/// announces itself immediately. The callback runs once per tick for as
/// long as the handle lives.
#[derive(Debug)]
pub struct IntervalTask {
    #[cfg(not(feature = "testing"))]
    _task: Task<()>,
}

// ===== impl Task =====

impl<T> Task<T> {
    /// Spawns an asynchronous task tied to the returned handle.
    pub fn spawn<Fut>(future: Fut) -> Task<T>
    where
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        Task {
            handle: tokio::task::spawn(future),
        }
    }
}

impl<T> Future for Task<T> {
    type Output = Result<T, tokio::task::JoinError>;

    fn poll(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx)
    }
}

impl<T> Drop for Task<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ===== impl TimeoutTask =====

impl TimeoutTask {
    /// Arms a timer that runs the provided async closure once the
    /// duration elapses without an intervening [`TimeoutTask::restart`].
    #[cfg(not(feature = "testing"))]
    pub fn new<F, Fut>(timeout: Duration, cb: F) -> TimeoutTask
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (restartp, mut restartc) = mpsc::unbounded_channel();

        let _task = Task::spawn(async move {
            let sleep = time::sleep(timeout);
            tokio::pin!(sleep);

            loop {
                tokio::select! {
                    // Deadline reached.
                    _ = &mut sleep => {
                        (cb)().await;
                        break;
                    }
                    msg = restartc.recv() => match msg {
                        // Deadline pushed back a full duration.
                        Some(()) => {
                            sleep.as_mut().reset(Instant::now() + timeout);
                        }
                        // Handle dropped; the task dies with it.
                        None => break,
                    },
                }
            }
        });

        TimeoutTask { _task, restartp }
    }

    /// Pushes the deadline a full duration into the future again.
    pub fn restart(&mut self) {
        #[cfg(not(feature = "testing"))]
        {
            // A failed send means the timer already fired and its event
            // is in flight; the event handler resolves the race.
            let _ = self.restartp.send(());
        }
    }
}

// ===== impl IntervalTask =====

impl IntervalTask {
    /// Starts a ticker that runs the provided async closure on every
    /// tick, beginning immediately.
    #[cfg(not(feature = "testing"))]
    pub fn new<F, Fut>(interval: Duration, mut cb: F) -> IntervalTask
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let _task = Task::spawn(async move {
            let mut ticker = time::interval(interval);
            loop {
                ticker.tick().await;
                (cb)().await;
            }
        });

        IntervalTask { _task }
    }
}
