use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};

use cogni_lib::assistant::{ImageAttachment, MathTutor};

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub fn run(
    app: &App,
    question: &str,
    image: Option<&Path>,
    chat: bool,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let attachment = image
        .map(ImageAttachment::from_path)
        .transpose()
        .context("Failed to load image")?;

    let mut tutor = MathTutor::new(app.config().models.high_fidelity.clone());

    match format {
        OutputFormat::Json => {
            let answer = tutor
                .ask(app.client(), question, attachment.as_ref())
                .context("Math solver request failed")?;
            println!(
                "{}",
                serde_json::json!({ "question": question, "answer": answer })
            );
            return Ok(());
        }
        OutputFormat::Plain => {
            tutor
                .ask_streaming(app.client(), question, attachment.as_ref(), print_token)
                .context("Math solver request failed")?;
            println!();
        }
    }

    if !chat {
        return Ok(());
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}", paint("\n> ", Color::CYAN, use_color));
        std::io::stdout().flush()?;
        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() || line == "q" {
            break;
        }
        // A failed follow-up leaves the conversation as it was
        match tutor.ask_streaming(app.client(), line, None, print_token) {
            Ok(_) => println!(),
            Err(e) => eprintln!("{}", paint(&format!("error: {}", e), Color::RED, use_color)),
        }
    }

    Ok(())
}

/// Print a streamed piece of the answer as soon as it arrives
fn print_token(token: &str) {
    print!("{}", token);
    let _ = std::io::stdout().flush();
}
