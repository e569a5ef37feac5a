// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/model.rs
//
// Application state.

use crate::config::AppConfig;
use crate::domain::crop::CropSession;
use crate::domain::mask::MaskEditor;
use crate::domain::scenario::{Scenario, ScenarioList};
use crate::domain::upload::{ImageHandle, PhotoSlot};

// =============================================================================
// Enums
// =============================================================================

#[derive(Debug, Clone)]
pub enum Page {
    Main,
    /// Scenario editing form over a working copy of the list.
    ScenarioForm(ScenarioList),
}

#[derive(Debug, Clone)]
pub enum ToolMode {
    None,
    Crop(CropSession),
    Mask(MaskEditor),
}

// =============================================================================
// Model
// =============================================================================

#[derive(Debug, Clone)]
pub struct AppModel {
    // Inputs.
    pub person: Option<ImageHandle>,
    pub group: Option<ImageHandle>,

    // Scenarios.
    pub scenarios: ScenarioList,
    pub selected_scenario: String,

    // Results.
    pub results: Vec<ImageHandle>,
    pub selected_result: usize,

    // Tools.
    pub page: Page,
    pub tool: ToolMode,
    pub brush_size: f32,
    pub crop_view: (f32, f32),
    pub mask_view: (f32, f32),

    // UI state.
    pub is_loading: bool,
    pub error: Option<String>,
}

impl AppModel {
    pub fn new(config: &AppConfig, scenarios: ScenarioList) -> Self {
        let selected_scenario = scenarios.first().value.clone();
        Self {
            person: None,
            group: None,
            scenarios,
            selected_scenario,
            results: Vec::new(),
            selected_result: 0,
            page: Page::Main,
            tool: ToolMode::None,
            brush_size: config.brush_size,
            crop_view: (config.crop_view_width, config.crop_view_height),
            mask_view: (config.mask_view_width, config.mask_view_height),
            is_loading: false,
            error: None,
        }
    }

    pub fn photo(&self, slot: PhotoSlot) -> Option<&ImageHandle> {
        match slot {
            PhotoSlot::Person => self.person.as_ref(),
            PhotoSlot::Group => self.group.as_ref(),
        }
    }

    /// Replace a photo. Earlier results no longer match the inputs.
    pub fn set_photo(&mut self, slot: PhotoSlot, image: ImageHandle) {
        match slot {
            PhotoSlot::Person => self.person = Some(image),
            PhotoSlot::Group => self.group = Some(image),
        }
        self.results.clear();
        self.selected_result = 0;
        self.clear_error();
    }

    /// The selected scenario, or the first one if the selection is gone.
    pub fn selected_scenario(&self) -> &Scenario {
        self.scenarios
            .find(&self.selected_scenario)
            .unwrap_or_else(|| self.scenarios.first())
    }

    /// Point the selection at an existing scenario.
    pub fn ensure_scenario_selected(&mut self) {
        if self.scenarios.find(&self.selected_scenario).is_none() {
            self.selected_scenario = self.scenarios.first().value.clone();
        }
    }

    pub fn has_both_photos(&self) -> bool {
        self.person.is_some() && self.group.is_some()
    }

    pub fn can_generate(&self) -> bool {
        self.has_both_photos() && self.selected_scenario().has_prompt() && !self.is_loading
    }

    pub fn current_result(&self) -> Option<&ImageHandle> {
        self.results.get(self.selected_result)
    }

    pub fn set_error<S: Into<String>>(&mut self, msg: S) {
        let msg = msg.into();
        log::warn!("{msg}");
        self.error = Some(msg);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}
