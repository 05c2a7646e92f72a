//! Text-to-image generation with style presets.

use serde::{Deserialize, Serialize};

use crate::ai::{AiError, ImageProvider, ImageReference, ImageRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageStyle {
    #[default]
    Photorealistic,
    Cinematic,
    DigitalArt,
    Cyberpunk,
}

impl ImageStyle {
    pub fn label(self) -> &'static str {
        match self {
            ImageStyle::Photorealistic => "Photorealistic",
            ImageStyle::Cinematic => "Cinematic",
            ImageStyle::DigitalArt => "Digital art",
            ImageStyle::Cyberpunk => "Cyberpunk",
        }
    }

    /// Prompt with the style preset applied
    pub fn apply(self, prompt: &str) -> String {
        format!("{} style. {}", self.label(), prompt.trim())
    }
}

pub struct VisionStudio {
    model: String,
}

impl VisionStudio {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    pub fn render<P: ImageProvider + ?Sized>(
        &self,
        provider: &P,
        prompt: &str,
        style: ImageStyle,
    ) -> Result<ImageReference, AiError> {
        if prompt.trim().is_empty() {
            return Err(AiError::InvalidRequest("please provide a prompt".to_string()));
        }

        let request = ImageRequest::new(&self.model, style.apply(prompt));
        log::info!("Generating {} image with {}", style.label(), self.model);
        provider.generate_image(&request)
    }
}
