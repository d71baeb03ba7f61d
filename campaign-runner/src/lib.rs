// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The campaign test execution engine.
//!
//! This crate is organized the way the system it drives is organized: a
//! [`resource`] topology, a [`case`] model with its preconditions, a [`list`]
//! loader, the [`runner`] that ties lifecycle execution together, an
//! [`events`] scheduler with its resource lock pool, a [`modules`] manager for
//! pluggable pre/parallel/post hooks, and a [`report`] tree that every other
//! piece writes into.

pub mod case;
pub mod errors;
pub mod events;
pub mod list;
pub mod log;
pub mod modules;
pub mod report;
pub mod resource;
pub mod runner;
pub mod settings;

pub use errors::EngineError;
