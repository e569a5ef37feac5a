// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/scenario.rs
//
// Named placement prompts and the never-empty list that holds them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::assets;
use crate::constant::NEW_SCENARIO_PREFIX;
use crate::error::ScenarioError;

/// A named text prompt describing how the two photos are merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub label: String,
    /// Unique key.
    pub value: String,
    /// Prompt text sent to the model.
    pub description: String,
}

impl Scenario {
    pub fn has_prompt(&self) -> bool {
        !self.description.trim().is_empty()
    }
}

/// Ordered scenario list with at least one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Scenario>", into = "Vec<Scenario>")]
pub struct ScenarioList(Vec<Scenario>);

impl TryFrom<Vec<Scenario>> for ScenarioList {
    type Error = ScenarioError;

    fn try_from(items: Vec<Scenario>) -> Result<Self, Self::Error> {
        Self::new(items)
    }
}

impl From<ScenarioList> for Vec<Scenario> {
    fn from(list: ScenarioList) -> Self {
        list.0
    }
}

impl ScenarioList {
    /// Rejects an empty list and duplicate keys.
    pub fn new(items: Vec<Scenario>) -> Result<Self, ScenarioError> {
        if items.is_empty() {
            return Err(ScenarioError::LastScenario);
        }
        let list = Self(items);
        list.check_unique()?;
        Ok(list)
    }

    /// The embedded seed list.
    pub fn defaults() -> Self {
        assets::text(assets::DEFAULT_SCENARIOS)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_else(|| {
                log::error!("Embedded default scenarios are unreadable, using a single fallback");
                Self(vec![Scenario {
                    label: "Person in the Centre".to_string(),
                    value: "person-in-the-centre".to_string(),
                    description: "Insert the person from the first image in the centre of the group in the second image.".to_string(),
                }])
            })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for the `len` convention.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Scenario> {
        self.0.get(index)
    }

    pub fn first(&self) -> &Scenario {
        &self.0[0]
    }

    pub fn find(&self, value: &str) -> Option<&Scenario> {
        self.0.iter().find(|s| s.value == value)
    }

    pub fn position(&self, value: &str) -> Option<usize> {
        self.0.iter().position(|s| s.value == value)
    }

    /// Append an empty scenario with a provisional key. Returns its index.
    pub fn add_new(&mut self, now_millis: i64) -> usize {
        let label = format!("New Scenario {}", self.0.len() + 1);
        let value = self.unique_value(&format!("{NEW_SCENARIO_PREFIX}{now_millis}"), None);
        self.0.push(Scenario {
            label,
            value,
            description: String::new(),
        });
        self.0.len() - 1
    }

    /// Remove an entry. The last remaining entry cannot be removed.
    pub fn remove(&mut self, index: usize) -> Result<Scenario, ScenarioError> {
        if self.0.len() <= 1 {
            return Err(ScenarioError::LastScenario);
        }
        if index >= self.0.len() {
            return Err(ScenarioError::NoSuchIndex(index));
        }
        Ok(self.0.remove(index))
    }

    /// Change a label. A provisional key is re-derived from the new label.
    pub fn set_label(&mut self, index: usize, label: &str) -> Result<(), ScenarioError> {
        let derived = self
            .0
            .get(index)
            .ok_or(ScenarioError::NoSuchIndex(index))?
            .value
            .starts_with(NEW_SCENARIO_PREFIX);

        let slug = slugify(label);
        let value = (derived && !slug.is_empty()).then(|| self.unique_value(&slug, Some(index)));

        let scenario = &mut self.0[index];
        scenario.label = label.to_string();
        if let Some(value) = value {
            scenario.value = value;
        }
        Ok(())
    }

    pub fn set_description(&mut self, index: usize, description: &str) -> Result<(), ScenarioError> {
        let scenario = self
            .0
            .get_mut(index)
            .ok_or(ScenarioError::NoSuchIndex(index))?;
        scenario.description = description.to_string();
        Ok(())
    }

    /// Every label and description must be filled in before saving.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        for (i, s) in self.0.iter().enumerate() {
            if s.label.trim().is_empty() {
                return Err(ScenarioError::EmptyLabel(i + 1));
            }
            if !s.has_prompt() {
                return Err(ScenarioError::EmptyDescription(s.label.clone()));
            }
        }
        self.check_unique()
    }

    fn check_unique(&self) -> Result<(), ScenarioError> {
        let mut seen = HashSet::new();
        for s in &self.0 {
            if !seen.insert(s.value.as_str()) {
                return Err(ScenarioError::DuplicateValue(s.value.clone()));
            }
        }
        Ok(())
    }

    /// `base`, or `base-2`, `base-3`, ... whichever no other entry uses.
    fn unique_value(&self, base: &str, except: Option<usize>) -> String {
        let taken = |candidate: &str| {
            self.0
                .iter()
                .enumerate()
                .any(|(i, s)| Some(i) != except && s.value == candidate)
        };
        if !taken(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

/// Lowercase, whitespace runs become `-`.
pub fn slugify(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
