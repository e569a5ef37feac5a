// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/update.rs
//
// State transitions. Side effects are returned as commands for the runtime.

use super::message::AppMessage;
use super::model::{AppModel, Page, ToolMode};
use crate::domain::crop::CropSession;
use crate::domain::mask::{MaskEdit, MaskEditor};
use crate::domain::scenario::{Scenario, ScenarioList};
use crate::domain::upload::ImageHandle;
use crate::error::MissingInput;

/// Inputs of one fusion request.
#[derive(Debug, Clone)]
pub struct FuseJob {
    pub person: ImageHandle,
    pub group: ImageHandle,
    pub scenario: Scenario,
}

/// Work the runtime performs after an update.
#[derive(Debug, Clone)]
pub enum Command {
    None,
    Fuse(FuseJob),
    Inpaint(MaskEdit),
    PersistScenarios(ScenarioList),
}

pub fn update(model: &mut AppModel, message: AppMessage) -> Command {
    match message {
        AppMessage::Upload { slot, image } => {
            log::info!("Loaded {} as {slot}", image.file_name());
            // The mask editor works on a result, and results are about to go.
            let stale = match &model.tool {
                ToolMode::Crop(session) => session.slot == slot,
                ToolMode::Mask(_) => true,
                ToolMode::None => false,
            };
            if stale {
                model.tool = ToolMode::None;
            }
            model.set_photo(slot, image);
        }

        // Cropper.
        AppMessage::OpenCropper(slot) => {
            let Some(source) = model.photo(slot).cloned() else {
                log::warn!("No {slot} to crop");
                return Command::None;
            };
            match CropSession::open(slot, source, model.crop_view) {
                Ok(session) => model.tool = ToolMode::Crop(session),
                Err(e) => model.set_error(format!("Failed to open {slot} for cropping: {e}")),
            }
        }
        AppMessage::CropLayout { width, height } => {
            if let ToolMode::Crop(session) = &mut model.tool {
                session.layout((width, height));
            }
            model.crop_view = (width, height);
        }
        AppMessage::CropDragStart { x, y } => {
            if let ToolMode::Crop(session) = &mut model.tool {
                session.pointer_down(x, y);
            }
        }
        AppMessage::CropDragMove { x, y } => {
            if let ToolMode::Crop(session) = &mut model.tool {
                session.pointer_move(x, y);
            }
        }
        AppMessage::CropDragEnd => {
            if let ToolMode::Crop(session) = &mut model.tool {
                session.pointer_up();
            }
        }
        AppMessage::SetAspect(aspect) => {
            if let ToolMode::Crop(session) = &mut model.tool {
                session.selection.set_aspect(aspect);
            }
        }
        AppMessage::ResetCrop => {
            if let ToolMode::Crop(session) = &mut model.tool {
                session.selection.reset();
            }
        }
        AppMessage::SetCropRegion(rect) => {
            if let ToolMode::Crop(session) = &mut model.tool {
                session.selection.set_rect(rect);
            }
        }
        AppMessage::ApplyCrop => {
            let ToolMode::Crop(session) = &model.tool else {
                return Command::None;
            };
            match session.save() {
                Ok(cropped) => {
                    let slot = session.slot;
                    model.tool = ToolMode::None;
                    model.set_photo(slot, cropped);
                }
                Err(e) => model.set_error(format!("Failed to crop image: {e}")),
            }
        }
        AppMessage::CancelCrop => {
            if matches!(model.tool, ToolMode::Crop(_)) {
                model.tool = ToolMode::None;
            }
        }

        // Scenarios.
        AppMessage::SelectScenario(value) => {
            if model.scenarios.find(&value).is_some() {
                model.selected_scenario = value;
            } else {
                model.set_error(format!("Unknown scenario \"{value}\"."));
            }
        }
        AppMessage::OpenScenarioForm => {
            model.page = Page::ScenarioForm(model.scenarios.clone());
        }
        AppMessage::AddScenario => {
            if let Page::ScenarioForm(draft) = &mut model.page {
                draft.add_new(chrono::Utc::now().timestamp_millis());
            }
        }
        AppMessage::RemoveScenario(index) => {
            if let Page::ScenarioForm(draft) = &mut model.page
                && let Err(e) = draft.remove(index)
            {
                model.set_error(e.to_string());
            }
        }
        AppMessage::ScenarioLabelChanged { index, label } => {
            if let Page::ScenarioForm(draft) = &mut model.page
                && let Err(e) = draft.set_label(index, &label)
            {
                model.set_error(e.to_string());
            }
        }
        AppMessage::ScenarioDescriptionChanged { index, description } => {
            if let Page::ScenarioForm(draft) = &mut model.page
                && let Err(e) = draft.set_description(index, &description)
            {
                model.set_error(e.to_string());
            }
        }
        AppMessage::SaveScenarios => {
            let Page::ScenarioForm(draft) = &model.page else {
                return Command::None;
            };
            if let Err(e) = draft.validate() {
                model.set_error(e.to_string());
                return Command::None;
            }
            model.scenarios = draft.clone();
            model.page = Page::Main;
            model.ensure_scenario_selected();
            model.clear_error();
            return Command::PersistScenarios(model.scenarios.clone());
        }
        AppMessage::CancelScenarioForm => {
            model.page = Page::Main;
        }

        // Generation.
        AppMessage::Generate => {
            if model.is_loading {
                log::warn!("Generation already in progress");
                return Command::None;
            }
            let (Some(person), Some(group)) = (model.person.clone(), model.group.clone()) else {
                model.set_error(MissingInput::BothPhotos.to_string());
                return Command::None;
            };
            let scenario = model.selected_scenario().clone();
            if !scenario.has_prompt() {
                model.set_error(MissingInput::ScenarioPrompt.to_string());
                return Command::None;
            }
            model.is_loading = true;
            model.clear_error();
            return Command::Fuse(FuseJob {
                person,
                group,
                scenario,
            });
        }
        AppMessage::FusionFinished(result) => {
            model.is_loading = false;
            match result {
                Ok(image) => {
                    model.results = vec![image];
                    model.selected_result = 0;
                }
                Err(msg) => model.set_error(msg),
            }
        }

        // Results.
        AppMessage::ImportResult(image) => {
            model.results.push(image);
            model.selected_result = model.results.len() - 1;
        }
        AppMessage::SelectResult(index) => {
            if index < model.results.len() {
                model.selected_result = index;
            }
        }

        // Mask editor.
        AppMessage::OpenMaskEditor => {
            let Some(target) = model.current_result().cloned() else {
                model.set_error(MissingInput::GeneratedImage.to_string());
                return Command::None;
            };
            match MaskEditor::open(target, model.mask_view, model.brush_size) {
                Ok(editor) => model.tool = ToolMode::Mask(editor),
                Err(e) => model.set_error(format!("Failed to load image for mask editing: {e}")),
            }
        }
        AppMessage::MaskLayout { width, height } => {
            if let ToolMode::Mask(editor) = &mut model.tool {
                editor.layout((width, height));
            }
            model.mask_view = (width, height);
        }
        AppMessage::MaskStrokeStart { x, y } => {
            if let ToolMode::Mask(editor) = &mut model.tool {
                editor.pointer_down(x, y);
            }
        }
        AppMessage::MaskStrokeMove { x, y } => {
            if let ToolMode::Mask(editor) = &mut model.tool {
                editor.pointer_move(x, y);
            }
        }
        AppMessage::MaskStrokeEnd => {
            if let ToolMode::Mask(editor) = &mut model.tool {
                editor.pointer_up();
            }
        }
        AppMessage::SetBrushSize(size) => {
            if let ToolMode::Mask(editor) = &mut model.tool {
                editor.canvas.set_brush_size(size);
                model.brush_size = editor.canvas.brush_size();
            } else {
                model.brush_size = size;
            }
        }
        AppMessage::ClearMask => {
            if let ToolMode::Mask(editor) = &mut model.tool {
                editor.canvas.clear();
            }
        }
        AppMessage::MaskPromptChanged(prompt) => {
            if let ToolMode::Mask(editor) = &mut model.tool {
                editor.prompt = prompt;
            }
        }
        AppMessage::GenerateInpaint => {
            if model.is_loading {
                log::warn!("Generation already in progress");
                return Command::None;
            }
            let ToolMode::Mask(editor) = &model.tool else {
                model.set_error(MissingInput::GeneratedImage.to_string());
                return Command::None;
            };
            match editor.build() {
                Ok(edit) => {
                    model.is_loading = true;
                    model.clear_error();
                    return Command::Inpaint(edit);
                }
                Err(e) => model.set_error(e.to_string()),
            }
        }
        AppMessage::InpaintFinished(result) => {
            model.is_loading = false;
            match result {
                Ok(image) => {
                    // Only an edit of the image still open in the editor is kept.
                    let target = match &model.tool {
                        ToolMode::Mask(editor) => {
                            model.results.iter().position(|r| *r == editor.target)
                        }
                        _ => None,
                    };
                    let Some(index) = target else {
                        log::warn!("Dropping edit of an image that is no longer shown");
                        return Command::None;
                    };
                    model.results[index] = image;
                    model.selected_result = index;
                    model.tool = ToolMode::None;
                }
                Err(msg) => model.set_error(msg),
            }
        }
        AppMessage::CloseMaskEditor => {
            if matches!(model.tool, ToolMode::Mask(_)) {
                model.tool = ToolMode::None;
            }
        }

        // Errors.
        AppMessage::ShowError(msg) => model.set_error(msg),
        AppMessage::ClearError => model.clear_error(),
    }

    Command::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::domain::crop::AspectRatio;
    use crate::domain::geometry::CropRect;
    use crate::domain::upload::PhotoSlot;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn image(w: u32, h: u32) -> ImageHandle {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([5, 6, 7, 255])));
        ImageHandle::from_image(&img, "img.png").unwrap()
    }

    fn model() -> AppModel {
        let config = AppConfig {
            mask_view_width: 200.0,
            mask_view_height: 200.0,
            crop_view_width: 200.0,
            crop_view_height: 200.0,
            ..AppConfig::default()
        };
        AppModel::new(&config, ScenarioList::defaults())
    }

    fn with_photos() -> AppModel {
        let mut m = model();
        update(&mut m, AppMessage::Upload { slot: PhotoSlot::Person, image: image(4, 4) });
        update(&mut m, AppMessage::Upload { slot: PhotoSlot::Group, image: image(8, 4) });
        m
    }

    #[test]
    fn generate_requires_both_photos() {
        let mut m = model();
        update(&mut m, AppMessage::Upload { slot: PhotoSlot::Person, image: image(4, 4) });
        assert!(matches!(update(&mut m, AppMessage::Generate), Command::None));
        assert_eq!(m.error.as_deref(), Some("Please upload two images to begin."));
        assert!(!m.is_loading);
    }

    #[test]
    fn generate_requires_scenario_prompt() {
        let mut m = with_photos();
        update(&mut m, AppMessage::OpenScenarioForm);
        if let Page::ScenarioForm(draft) = &mut m.page {
            draft.set_description(0, "  ").unwrap();
            m.scenarios = draft.clone();
        }
        assert!(matches!(update(&mut m, AppMessage::Generate), Command::None));
        assert_eq!(
            m.error.as_deref(),
            Some("Please add a description to the selected scenario before generating.")
        );
    }

    #[test]
    fn loading_flag_blocks_duplicate_submissions() {
        let mut m = with_photos();
        let first = update(&mut m, AppMessage::Generate);
        assert!(matches!(first, Command::Fuse(_)));
        assert!(m.is_loading);
        assert!(!m.can_generate());
        assert!(matches!(update(&mut m, AppMessage::Generate), Command::None));
    }

    #[test]
    fn failed_generation_keeps_previous_result() {
        let mut m = with_photos();
        let previous = image(2, 2);
        update(&mut m, AppMessage::Generate);
        update(&mut m, AppMessage::FusionFinished(Ok(previous.clone())));
        assert_eq!(m.results, vec![previous.clone()]);

        update(&mut m, AppMessage::Generate);
        update(&mut m, AppMessage::FusionFinished(Err("network down".into())));
        assert_eq!(m.results, vec![previous]);
        assert_eq!(m.error.as_deref(), Some("network down"));
        assert!(!m.is_loading);
    }

    #[test]
    fn new_upload_clears_results_and_error() {
        let mut m = with_photos();
        update(&mut m, AppMessage::FusionFinished(Ok(image(2, 2))));
        update(&mut m, AppMessage::ShowError("old".into()));
        update(&mut m, AppMessage::Upload { slot: PhotoSlot::Group, image: image(3, 3) });
        assert!(m.results.is_empty());
        assert!(m.error.is_none());
    }

    #[test]
    fn applied_crop_replaces_the_slot() {
        let mut m = with_photos();
        update(&mut m, AppMessage::OpenCropper(PhotoSlot::Group));
        assert!(matches!(m.tool, ToolMode::Crop(_)));
        update(&mut m, AppMessage::SetAspect(AspectRatio::Free));
        update(&mut m, AppMessage::SetCropRegion(CropRect::new(0.0, 0.0, 50.0, 100.0)));
        update(&mut m, AppMessage::ApplyCrop);

        assert!(matches!(m.tool, ToolMode::None));
        let group = m.group.as_ref().unwrap();
        assert_eq!(group.file_name(), "cropped_image.png");
        assert_eq!(group.dimensions().unwrap(), (4, 4));
    }

    #[test]
    fn removing_last_scenario_in_form_is_reported() {
        let mut m = model();
        update(&mut m, AppMessage::OpenScenarioForm);
        for _ in 0..3 {
            update(&mut m, AppMessage::RemoveScenario(0));
        }
        assert!(m.error.is_none());
        update(&mut m, AppMessage::RemoveScenario(0));
        assert_eq!(m.error.as_deref(), Some("There must be at least one scenario."));

        let Page::ScenarioForm(draft) = &m.page else {
            panic!("form closed");
        };
        assert_eq!(draft.len(), 1);
    }

    #[test]
    fn saving_form_persists_and_fixes_selection() {
        let mut m = model();
        let second = m.scenarios.get(1).unwrap().value.clone();
        update(&mut m, AppMessage::SelectScenario(second));
        assert_eq!(m.selected_scenario().value, "person-on-the-left");
        update(&mut m, AppMessage::OpenScenarioForm);
        update(&mut m, AppMessage::RemoveScenario(1));
        update(&mut m, AppMessage::AddScenario);
        update(&mut m, AppMessage::ScenarioLabelChanged { index: 3, label: "Front Row".into() });

        // Blank description blocks the save.
        assert!(matches!(update(&mut m, AppMessage::SaveScenarios), Command::None));
        assert!(matches!(m.page, Page::ScenarioForm(_)));

        update(&mut m, AppMessage::ScenarioDescriptionChanged {
            index: 3,
            description: "Kneel in the front row.".into(),
        });
        let Command::PersistScenarios(saved) = update(&mut m, AppMessage::SaveScenarios) else {
            panic!("expected persist command");
        };
        assert_eq!(saved.len(), 4);
        assert!(saved.find("front-row").is_some());
        assert!(matches!(m.page, Page::Main));
        assert_eq!(m.selected_scenario, m.scenarios.first().value);
    }

    #[test]
    fn inpaint_replaces_selected_result_and_closes_editor() {
        let mut m = with_photos();
        update(&mut m, AppMessage::FusionFinished(Ok(image(100, 100))));
        update(&mut m, AppMessage::OpenMaskEditor);
        assert!(matches!(m.tool, ToolMode::Mask(_)));

        // Nothing painted yet.
        update(&mut m, AppMessage::MaskPromptChanged("a hat".into()));
        assert!(matches!(update(&mut m, AppMessage::GenerateInpaint), Command::None));
        assert!(m.error.is_some());

        update(&mut m, AppMessage::MaskStrokeStart { x: 100.0, y: 100.0 });
        update(&mut m, AppMessage::MaskStrokeMove { x: 120.0, y: 100.0 });
        update(&mut m, AppMessage::MaskStrokeEnd);
        let Command::Inpaint(edit) = update(&mut m, AppMessage::GenerateInpaint) else {
            panic!("expected inpaint command");
        };
        assert_eq!(edit.prompt, "a hat");
        assert_eq!(edit.mask.dimensions().unwrap(), (100, 100));

        let edited = image(100, 100);
        update(&mut m, AppMessage::InpaintFinished(Ok(edited.clone())));
        assert_eq!(m.current_result(), Some(&edited));
        assert_eq!(m.results.len(), 1);
        assert!(matches!(m.tool, ToolMode::None));
    }

    #[test]
    fn upload_closes_the_mask_editor() {
        let mut m = with_photos();
        update(&mut m, AppMessage::FusionFinished(Ok(image(100, 100))));
        update(&mut m, AppMessage::OpenMaskEditor);
        assert!(matches!(m.tool, ToolMode::Mask(_)));

        update(&mut m, AppMessage::Upload { slot: PhotoSlot::Person, image: image(5, 5) });
        assert!(matches!(m.tool, ToolMode::None));
        assert!(m.results.is_empty());
        assert!(matches!(update(&mut m, AppMessage::GenerateInpaint), Command::None));

        // A request still in flight comes back after the upload.
        update(&mut m, AppMessage::InpaintFinished(Ok(image(100, 100))));
        assert!(m.results.is_empty());
        assert!(m.current_result().is_none());
    }

    #[test]
    fn mask_editor_needs_a_result() {
        let mut m = with_photos();
        update(&mut m, AppMessage::OpenMaskEditor);
        assert!(matches!(m.tool, ToolMode::None));
        assert_eq!(m.error.as_deref(), Some("There is no generated image to edit."));
    }
}
