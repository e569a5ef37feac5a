// SPDX-License-Identifier: GPL-3.0-or-later
// src/client/mod.rs
//
// Generation client: prompt building on top of a pluggable model transport.

pub mod gemini;
pub mod prompt;

use std::future::Future;

use image::ImageFormat;

use self::gemini::{GenerateContentRequest, GenerateContentResponse, Part};
use crate::constant::DEFAULT_MIME;
use crate::domain::scenario::Scenario;
use crate::domain::upload::ImageHandle;
use crate::error::{FusionError, MissingInput, Operation};

/// Transport to a hosted image model.
pub trait ImageGenerator {
    fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> impl Future<Output = Result<GenerateContentResponse, FusionError>> + Send;
}

/// Fusion and inpainting requests.
#[derive(Debug, Clone)]
pub struct FusionService<G> {
    generator: G,
}

impl<G: ImageGenerator> FusionService<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Composite the person from `person` into `group` following `scenario`.
    pub async fn fuse(
        &self,
        person: &ImageHandle,
        group: &ImageHandle,
        scenario: &Scenario,
    ) -> Result<ImageHandle, FusionError> {
        if !scenario.has_prompt() {
            return Err(MissingInput::ScenarioPrompt.into());
        }
        log::info!(
            "Requesting fusion of {} and {} with scenario \"{}\"",
            person.file_name(),
            group.file_name(),
            scenario.value
        );

        let request = GenerateContentRequest::image_only(vec![
            Part::image(person),
            Part::image(group),
            Part::text(prompt::fusion(scenario)?),
        ]);
        self.request_image(request, Operation::Fusion).await
    }

    /// Regenerate the white area of `mask` on `original` from `instruction`.
    pub async fn inpaint(
        &self,
        original: &ImageHandle,
        mask: &ImageHandle,
        instruction: &str,
    ) -> Result<ImageHandle, FusionError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(MissingInput::MaskPrompt.into());
        }
        log::info!("Requesting masked edit of {}", original.file_name());

        let request = GenerateContentRequest::image_only(vec![
            Part::image(original),
            Part::image(mask),
            Part::text(prompt::inpaint(instruction)?),
        ]);
        self.request_image(request, Operation::Inpaint).await
    }

    async fn request_image(
        &self,
        request: GenerateContentRequest,
        operation: Operation,
    ) -> Result<ImageHandle, FusionError> {
        let response = self.generator.generate_content(request).await?;
        let handle = extract_image(&response, operation)?;
        log::info!(
            "{operation} returned {} ({} bytes)",
            handle.mime_type(),
            handle.bytes().len()
        );
        Ok(handle)
    }
}

/// Exactly one image out of a response, or `NoImage`.
pub fn extract_image(
    response: &GenerateContentResponse,
    operation: Operation,
) -> Result<ImageHandle, FusionError> {
    let Some(inline) = response.first_image() else {
        if let Some(text) = response.text() {
            log::warn!("Model answered with text only: {text}");
        }
        return Err(FusionError::NoImage {
            operation,
            reason: response.failure_reason(),
        });
    };

    let stem = match operation {
        Operation::Fusion => "fusion",
        Operation::Inpaint => "edit",
    };
    let mime_type = match inline.mime_type.trim() {
        "" => DEFAULT_MIME,
        mime => mime,
    };
    let ext = ImageFormat::from_mime_type(mime_type)
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("png");

    Ok(ImageHandle::from_base64(
        &inline.data,
        mime_type,
        format!("{stem}.{ext}"),
    )?)
}
