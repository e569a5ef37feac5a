// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/runtime.rs
//
// Drives the update loop and executes the commands it returns.

use std::collections::VecDeque;

use super::message::AppMessage;
use super::model::AppModel;
use super::update::{self, Command};
use crate::client::{FusionService, ImageGenerator};
use crate::config::AppConfig;
use crate::storage::ScenarioStore;

pub struct App<G> {
    pub model: AppModel,
    service: FusionService<G>,
    store: ScenarioStore,
}

impl<G: ImageGenerator> App<G> {
    /// Scenarios are loaded from `store`; the defaults stand in when it is empty.
    pub fn new(config: &AppConfig, service: FusionService<G>, store: ScenarioStore) -> Self {
        let scenarios = store.load();
        log::debug!("Loaded {} scenarios", scenarios.len());
        Self {
            model: AppModel::new(config, scenarios),
            service,
            store,
        }
    }

    pub fn service(&self) -> &FusionService<G> {
        &self.service
    }

    /// Apply `message` and every follow-up message its commands produce.
    pub async fn dispatch(&mut self, message: AppMessage) {
        let mut queue = VecDeque::from([message]);
        while let Some(message) = queue.pop_front() {
            let command = update::update(&mut self.model, message);
            if let Some(next) = self.run(command).await {
                queue.push_back(next);
            }
        }
    }

    async fn run(&self, command: Command) -> Option<AppMessage> {
        match command {
            Command::None => None,
            Command::Fuse(job) => {
                let result = self
                    .service
                    .fuse(&job.person, &job.group, &job.scenario)
                    .await
                    .map_err(|e| {
                        log::error!("Fusion failed: {e}");
                        e.to_string()
                    });
                Some(AppMessage::FusionFinished(result))
            }
            Command::Inpaint(edit) => {
                let result = self
                    .service
                    .inpaint(&edit.original, &edit.mask, &edit.prompt)
                    .await
                    .map_err(|e| {
                        log::error!("Inpainting failed: {e}");
                        e.to_string()
                    });
                Some(AppMessage::InpaintFinished(result))
            }
            Command::PersistScenarios(scenarios) => match self.store.save(&scenarios) {
                Ok(()) => None,
                Err(e) => {
                    log::error!("Failed to save scenarios: {e:#}");
                    Some(AppMessage::ShowError(format!("Could not save scenarios: {e}")))
                }
            },
        }
    }
}
