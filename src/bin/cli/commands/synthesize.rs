use std::io::Write;
use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::{bail, Context, Result};

use cogni_lib::documents;
use cogni_lib::study::{ProcessingMode, SynthesisError, SynthesisProgress};
use cogni_lib::StudyError;

use crate::app::App;
use crate::render::terminal::{bar, paint, render_bundle, Color};
use crate::OutputFormat;

/// Command-line overrides of the configured study options
pub struct Overrides {
    pub creativity: Option<f64>,
    pub mode: Option<ProcessingMode>,
    pub chunk_size: Option<usize>,
}

pub fn run(
    app: &mut App,
    source: &str,
    overrides: Overrides,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let text = if source == "-" {
        crate::read_stdin()?
    } else {
        documents::extract_text(Path::new(source))
            .with_context(|| format!("Failed to read {}", source))?
    };

    let mut options = app.lab.default_options()?;
    if let Some(creativity) = overrides.creativity {
        if !(0.0..=1.0).contains(&creativity) {
            bail!("--creativity must be between 0.0 and 1.0");
        }
        options.creativity = creativity;
    }
    if let Some(mode) = overrides.mode {
        options.mode = mode;
    }
    if let Some(size) = overrides.chunk_size {
        options.chunk_size = NonZeroUsize::new(size).context("--chunk-size must be positive")?;
    }

    let today = app.today();
    let show_progress = matches!(format, OutputFormat::Plain);
    let on_progress = |p: SynthesisProgress| {
        if show_progress {
            eprint!("\rSynthesizing {} {}/{} chunks", bar(p.fraction(), 20), p.completed, p.total);
            let _ = std::io::stderr().flush();
        }
    };

    let result = app.lab.synthesize_document(&text, &options, today, on_progress);
    if show_progress {
        eprintln!();
    }

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(StudyError::Synthesis(SynthesisError::MissingCredentials)) => {
            bail!("No API key configured. Set OPENAI_API_KEY or api_key in the config file.");
        }
        Err(StudyError::Synthesis(SynthesisError::NoContentProduced { chunks, notices })) => {
            for notice in &notices {
                eprintln!("  {}", notice);
            }
            bail!("No study material was produced from {} chunk(s)", chunks);
        }
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        OutputFormat::Plain => {
            println!("{}", render_bundle(&outcome.report.bundle, use_color));
            println!();

            for notice in &outcome.report.notices {
                println!("{}", paint(&format!("warning: {}", notice), Color::YELLOW, use_color));
            }

            println!(
                "{}/{} chunks succeeded, {} card(s) added to review",
                outcome.report.chunks_succeeded, outcome.report.chunks_total, outcome.nodes_created
            );
            let mut reward = format!("+{} XP", outcome.xp_awarded);
            if outcome.levels_gained > 0 {
                reward.push_str(&format!(", level up! Now level {}", outcome.profile.level));
            }
            println!("{}", paint(&reward, Color::GREEN, use_color));
        }
    }

    Ok(())
}
