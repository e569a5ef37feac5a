// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/mod.rs
//
// Application layer: state, messages, update rules and the command runtime.

pub mod message;
pub mod model;
pub mod runtime;
pub mod update;

pub use message::AppMessage;
pub use model::{AppModel, Page, ToolMode};
pub use runtime::App;
pub use update::{Command, FuseJob, update};
