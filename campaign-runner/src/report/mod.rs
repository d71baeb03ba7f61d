// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The result tree and its reporter (§4.A).

mod node;
mod reporter;

pub use node::ResultNode;
pub use reporter::{EventGroupHandle, Reporter};
