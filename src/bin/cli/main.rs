mod app;
mod commands;
mod render;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use cogni_lib::assistant::ImageStyle;
use cogni_lib::documents;
use cogni_lib::study::ProcessingMode;

#[derive(Parser)]
#[command(name = "cogni-cli", about = "Study assistant: synthesis, spaced repetition and tutoring", version)]
struct Cli {
    /// Config file (default: {config_dir}/cogni/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database holding cards and the profile
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum ModeArg {
    HighFidelity,
    Fast,
}

impl From<ModeArg> for ProcessingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::HighFidelity => ProcessingMode::HighFidelity,
            ModeArg::Fast => ProcessingMode::Fast,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum StyleArg {
    Photorealistic,
    Cinematic,
    DigitalArt,
    Cyberpunk,
}

impl From<StyleArg> for ImageStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Photorealistic => ImageStyle::Photorealistic,
            StyleArg::Cinematic => ImageStyle::Cinematic,
            StyleArg::DigitalArt => ImageStyle::DigitalArt,
            StyleArg::Cyberpunk => ImageStyle::Cyberpunk,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Turn a document into flashcards, a quiz and a concept map
    Synthesize {
        /// Document path (.txt, .md, .html) or "-" for stdin
        source: String,
        /// Sampling temperature, 0.0 - 1.0
        #[arg(long)]
        creativity: Option<f64>,
        /// Model tier
        #[arg(long)]
        mode: Option<ModeArg>,
        /// Characters per chunk
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Review due cards, rating each 0-5
    Review {
        /// Stop after this many cards
        #[arg(long, default_value = "20")]
        count: usize,
    },

    /// List cards due today
    Due,

    /// List all cards
    Cards,

    /// Show XP, level and card counts
    Profile,

    /// Delete every card (the profile is kept)
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Solve a math problem step by step
    Solve {
        /// The question (use "-" to read from stdin)
        question: Option<String>,
        /// Image of the problem
        #[arg(long)]
        image: Option<PathBuf>,
        /// Keep asking follow-up questions after the first answer
        #[arg(long)]
        chat: bool,
    },

    /// Generate an illustration
    Imagine {
        /// What to draw
        prompt: String,
        /// Style preset
        #[arg(long, default_value = "photorealistic")]
        style: StyleArg,
        /// Where to save base64 image data
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Read text from stdin when the argument is "-" or input is piped
fn resolve_content(content: Option<String>) -> anyhow::Result<Option<String>> {
    match content.as_deref() {
        Some("-") => Ok(Some(read_stdin()?)),
        Some(_) => Ok(content),
        None => {
            if !stdin_is_tty() {
                let buf = read_stdin()?;
                Ok(if buf.is_empty() { None } else { Some(buf) })
            } else {
                Ok(None)
            }
        }
    }
}

/// All of stdin, decoded the same way as document files
fn read_stdin() -> anyhow::Result<String> {
    documents::read_text(std::io::stdin().lock()).context("Failed to read stdin")
}

/// Check if stdin is a terminal (not piped)
fn stdin_is_tty() -> bool {
    unsafe { libc_isatty(0) != 0 }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let mut app = app::App::new(cli.config.as_deref(), cli.db.as_deref())?;

    match cli.command {
        Command::Synthesize { source, creativity, mode, chunk_size } => {
            commands::synthesize::run(
                &mut app,
                &source,
                commands::synthesize::Overrides {
                    creativity,
                    mode: mode.map(Into::into),
                    chunk_size,
                },
                &cli.format,
                use_color,
            )?;
        }
        Command::Review { count } => {
            commands::review::run(&mut app, count, &cli.format, use_color)?;
        }
        Command::Due => {
            commands::cards::run(&app, true, &cli.format, use_color)?;
        }
        Command::Cards => {
            commands::cards::run(&app, false, &cli.format, use_color)?;
        }
        Command::Profile => {
            commands::profile::run(&app, &cli.format, use_color)?;
        }
        Command::Clear { yes } => {
            commands::clear::run(&mut app, yes, &cli.format)?;
        }
        Command::Solve { question, image, chat } => {
            let question = resolve_content(question)?.unwrap_or_default();
            commands::solve::run(&app, &question, image.as_deref(), chat, &cli.format, use_color)?;
        }
        Command::Imagine { prompt, style, output } => {
            commands::imagine::run(&app, &prompt, style.into(), output.as_deref(), &cli.format)?;
        }
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}
