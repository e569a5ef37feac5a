// SPDX-License-Identifier: GPL-3.0-or-later
// src/assets.rs
//
// Embedded prompt templates and the default scenario list.

use rust_embed::RustEmbed;

use crate::error::FusionError;

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

pub const FUSION_PROMPT: &str = "prompts/fusion.txt";
pub const INPAINT_PROMPT: &str = "prompts/inpaint.txt";
pub const DEFAULT_SCENARIOS: &str = "scenarios.json";

/// Embedded text asset.
pub fn text(name: &str) -> Result<String, FusionError> {
    let file = Assets::get(name).ok_or_else(|| FusionError::Asset(name.to_string()))?;
    String::from_utf8(file.data.into_owned()).map_err(|_| FusionError::Asset(name.to_string()))
}

/// Fill `{key}` placeholders of a template.
///
/// Substituted values are never scanned again. Unknown placeholders stay as is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_are_embedded() {
        assert!(text(FUSION_PROMPT).unwrap().contains("{description}"));
        assert!(text(INPAINT_PROMPT).unwrap().contains("{prompt}"));
        assert!(text("nope.txt").is_err());
    }

    #[test]
    fn render_replaces_every_occurrence() {
        let out = render("{a} and {a} but {b}", &[("a", "x"), ("b", "y")]);
        assert_eq!(out, "x and x but y");
    }

    #[test]
    fn substituted_values_are_not_expanded() {
        let out = render(
            "{label}: {description}",
            &[("label", "Odd {description}"), ("description", "Stand left.")],
        );
        assert_eq!(out, "Odd {description}: Stand left.");
    }

    #[test]
    fn unknown_placeholders_are_kept() {
        assert_eq!(render("{x} {a} {", &[("a", "1")]), "{x} 1 {");
    }
}
