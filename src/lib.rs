// SPDX-License-Identifier: GPL-3.0-or-later
// src/lib.rs
//
// Merge a person photo into a group photo with a hosted image model.

pub mod app;
pub mod assets;
pub mod client;
pub mod config;
pub mod constant;
pub mod domain;
pub mod error;
pub mod storage;
