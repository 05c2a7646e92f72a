use std::io::{BufRead, Write};

use anyhow::Result;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &mut App, yes: bool, format: &OutputFormat) -> Result<()> {
    if !yes {
        print!("Delete every card in {}? [y/N] ", app.db_path.display());
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let removed = app.lab.clear()?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "removed": removed }));
        }
        OutputFormat::Plain => {
            println!("Removed {} card(s).", removed);
        }
    }

    Ok(())
}
