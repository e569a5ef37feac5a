// SPDX-License-Identifier: GPL-3.0-or-later
// src/client/prompt.rs
//
// Prompt text for the two request shapes.

use crate::assets;
use crate::domain::scenario::Scenario;
use crate::error::FusionError;

/// Compositing instructions with the scenario's placement filled in.
pub fn fusion(scenario: &Scenario) -> Result<String, FusionError> {
    let template = assets::text(assets::FUSION_PROMPT)?;
    Ok(assets::render(
        &template,
        &[
            ("label", scenario.label.trim()),
            ("description", scenario.description.trim()),
        ],
    ))
}

/// Inpainting instructions around the user's replacement text.
pub fn inpaint(instruction: &str) -> Result<String, FusionError> {
    let template = assets::text(assets::INPAINT_PROMPT)?;
    Ok(assets::render(&template, &[("prompt", instruction.trim())]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_filled() {
        let scenario = Scenario {
            label: "Back".into(),
            value: "back".into(),
            description: " Behind the others. ".into(),
        };
        let text = fusion(&scenario).unwrap();
        assert!(text.contains("\"Back\""));
        assert!(text.contains("\"Behind the others.\""));
        assert!(!text.contains('{'));

        let text = inpaint("a tree").unwrap();
        assert!(text.contains("\"a tree\""));
        assert!(!text.contains("{prompt}"));
    }
}
