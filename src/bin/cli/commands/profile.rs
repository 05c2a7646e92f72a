use anyhow::Result;

use cogni_lib::flashcards::XP_PER_LEVEL;

use crate::app::App;
use crate::render::terminal::{bar, paint, Color};
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let stats = app.lab.stats(app.today())?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Plain => {
            let profile = &stats.profile;
            println!(
                "{}",
                paint(&format!("Level {}", profile.level), Color::BOLD, use_color)
            );
            println!(
                "{} {}/{} XP",
                bar(profile.progress(), 20),
                profile.xp,
                XP_PER_LEVEL
            );
            println!();
            println!("Cards:    {}", stats.total_cards);
            println!(
                "Due now:  {}",
                paint(&stats.due_cards.to_string(), Color::CYAN, use_color)
            );
        }
    }

    Ok(())
}
