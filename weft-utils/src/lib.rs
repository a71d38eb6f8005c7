//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

#![cfg_attr(
    feature = "testing",
    allow(dead_code, unused_variables, unused_imports)
)]

pub mod addr;
pub mod bytes;
pub mod task;
