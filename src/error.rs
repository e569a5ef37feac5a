// SPDX-License-Identifier: GPL-3.0-or-later
// src/error.rs
//
// Error types shared by the client, the domain and the controller.

use std::fmt;

use thiserror::Error;

/// The three kinds of failure a user is told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Required input is missing; the user can fix it and try again.
    MissingInput,
    /// The model answered but did not return an image.
    ModelResponse,
    /// Network, I/O, or anything else unexpected.
    Unexpected,
}

/// Input the user still has to provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingInput {
    BothPhotos,
    ScenarioPrompt,
    GeneratedImage,
    MaskPrompt,
    MaskArea,
    ApiKey,
}

impl fmt::Display for MissingInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::BothPhotos => "Please upload two images to begin.",
            Self::ScenarioPrompt => {
                "Please add a description to the selected scenario before generating."
            }
            Self::GeneratedImage => "There is no generated image to edit.",
            Self::MaskPrompt => "Please describe what you want to generate in the masked area.",
            Self::MaskArea => "Please paint over the area you want to change.",
            Self::ApiKey => "No API key configured. Set GEMINI_API_KEY or add api_key to the config.",
        };
        f.write_str(msg)
    }
}

/// Which request produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fusion,
    Inpaint,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fusion => write!(f, "Image generation"),
            Self::Inpaint => write!(f, "Image editing"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FusionError {
    #[error("{0}")]
    MissingInput(MissingInput),

    #[error("{operation} failed to produce an image.{}", reason_suffix(.reason))]
    NoImage {
        operation: Operation,
        reason: Option<String>,
    },

    #[error("Model service error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid image data in response: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("Missing embedded asset {0}")]
    Asset(String),
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|r| format!(" ({r})"))
        .unwrap_or_default()
}

impl FusionError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingInput(_) => ErrorClass::MissingInput,
            Self::NoImage { .. } => ErrorClass::ModelResponse,
            _ => ErrorClass::Unexpected,
        }
    }
}

impl From<MissingInput> for FusionError {
    fn from(missing: MissingInput) -> Self {
        Self::MissingInput(missing)
    }
}

/// Rejected upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please upload a valid image file.")]
    NotAnImage,

    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Violated scenario list rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    #[error("There must be at least one scenario.")]
    LastScenario,

    #[error("Scenario {0} does not exist.")]
    NoSuchIndex(usize),

    #[error("The label of scenario {0} cannot be empty.")]
    EmptyLabel(usize),

    #[error("The description for \"{0}\" cannot be empty. Give the model some detail about what this scenario looks like.")]
    EmptyDescription(String),

    #[error("Scenario key \"{0}\" is used more than once.")]
    DuplicateValue(String),
}
