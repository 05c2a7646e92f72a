use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use cogni_lib::ai::ImageReference;
use cogni_lib::assistant::{ImageStyle, VisionStudio};

use crate::app::App;
use crate::OutputFormat;

const DEFAULT_OUTPUT: &str = "cogni-image.png";

pub fn run(
    app: &App,
    prompt: &str,
    style: ImageStyle,
    output: Option<&Path>,
    format: &OutputFormat,
) -> Result<()> {
    let studio = VisionStudio::new(app.config().models.image.clone());
    let image = studio
        .render(app.client(), prompt, style)
        .context("Image generation failed")?;

    let location = match &image {
        ImageReference::Url(url) => url.clone(),
        ImageReference::Base64(data) => {
            let path = output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
            let bytes = STANDARD.decode(data).context("Image data is not valid base64")?;
            fs::write(&path, bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            path.display().to_string()
        }
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({ "style": style, "image": location })
            );
        }
        OutputFormat::Plain => println!("{}", location),
    }

    Ok(())
}
