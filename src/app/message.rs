// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/message.rs
//
// Application messages: events, user actions, and internal signals.

use crate::domain::crop::AspectRatio;
use crate::domain::geometry::CropRect;
use crate::domain::upload::{ImageHandle, PhotoSlot};

#[derive(Debug, Clone)]
pub enum AppMessage {
    // Uploads.
    Upload {
        slot: PhotoSlot,
        image: ImageHandle,
    },

    // Crop operations. Pointer positions are container pixels.
    OpenCropper(PhotoSlot),
    CropLayout {
        width: f32,
        height: f32,
    },
    CropDragStart {
        x: f32,
        y: f32,
    },
    CropDragMove {
        x: f32,
        y: f32,
    },
    CropDragEnd,
    SetAspect(AspectRatio),
    ResetCrop,
    SetCropRegion(CropRect),
    ApplyCrop,
    CancelCrop,

    // Scenarios.
    SelectScenario(String),
    OpenScenarioForm,
    AddScenario,
    RemoveScenario(usize),
    ScenarioLabelChanged {
        index: usize,
        label: String,
    },
    ScenarioDescriptionChanged {
        index: usize,
        description: String,
    },
    SaveScenarios,
    CancelScenarioForm,

    // Generation.
    Generate,
    FusionFinished(Result<ImageHandle, String>),

    // Results.
    ImportResult(ImageHandle),
    SelectResult(usize),

    // Mask editor. Pointer positions are container pixels.
    OpenMaskEditor,
    MaskLayout {
        width: f32,
        height: f32,
    },
    MaskStrokeStart {
        x: f32,
        y: f32,
    },
    MaskStrokeMove {
        x: f32,
        y: f32,
    },
    MaskStrokeEnd,
    SetBrushSize(f32),
    ClearMask,
    MaskPromptChanged(String),
    GenerateInpaint,
    InpaintFinished(Result<ImageHandle, String>),
    CloseMaskEditor,

    // Errors.
    ShowError(String),
    ClearError,
}
