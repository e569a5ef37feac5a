// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/mod.rs
//
// Image inputs, crop and mask geometry, and the scenario list.

pub mod crop;
pub mod geometry;
pub mod mask;
pub mod scenario;
pub mod upload;
