use std::io::{self, BufRead, Write};

use anyhow::Result;

use cogni_lib::flashcards::algorithm::{format_interval, preview_intervals};
use cogni_lib::flashcards::{UserProfile, XP_PER_LEVEL};

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

/// Interactive review: show a random due card, reveal on Enter, read a 0-5
/// rating. `q` stops early.
///
/// With `--format json` the session itself goes to stderr so stdout carries
/// only the final summary.
pub fn run(app: &mut App, count: usize, format: &OutputFormat, use_color: bool) -> Result<()> {
    let mut out: Box<dyn Write> = if session_to_stderr(format) {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    };

    let today = app.today();
    let mut rng = rand::thread_rng();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    let mut reviewed = 0;
    let mut xp_total = 0;

    'cards: while reviewed < count {
        let Some(node) = app.lab.next_due(today, &mut rng)? else {
            if reviewed == 0 {
                writeln!(out, "Nothing due. Come back later.")?;
            }
            break;
        };

        writeln!(out)?;
        writeln!(out, "{}", paint(&node.question, Color::BOLD, use_color))?;
        prompt(&mut out, "(Enter to reveal, q to quit) ")?;
        match lines.next().transpose()? {
            Some(line) if line.trim() == "q" => break,
            Some(_) => {}
            None => break,
        }

        writeln!(out, "{}", paint(&node.answer, Color::CYAN, use_color))?;
        let [again, hard, good, easy] = preview_intervals(node.easiness, node.interval, today);
        writeln!(
            out,
            "{}",
            paint(
                &format!(
                    "0-2 again ({})  3 hard ({})  4 good ({})  5 easy ({})",
                    format_interval(again),
                    format_interval(hard),
                    format_interval(good),
                    format_interval(easy)
                ),
                Color::DIM,
                use_color
            )
        )?;

        let quality = loop {
            prompt(&mut out, "Rating 0-5: ")?;
            let Some(line) = lines.next().transpose()? else {
                break 'cards;
            };
            let line = line.trim();
            if line == "q" {
                break 'cards;
            }
            match line.parse::<u8>() {
                Ok(q) if q <= 5 => break q,
                _ => writeln!(out, "{}", paint("Enter a number from 0 to 5", Color::RED, use_color))?,
            }
        };

        let outcome = app.lab.submit_review(node.id, quality, today)?;
        reviewed += 1;
        xp_total += outcome.xp_awarded;

        writeln!(
            out,
            "Next review in {} (+{} XP)",
            format_interval(outcome.result.interval),
            outcome.xp_awarded
        )?;
        if outcome.levels_gained > 0 {
            writeln!(
                out,
                "{}",
                paint(&format!("Level up! Now level {}", outcome.profile.level), Color::GREEN, use_color)
            )?;
        }
    }

    let profile = app.lab.profile()?;
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "reviewed": reviewed,
                    "xpAwarded": xp_total,
                    "profile": profile,
                })
            );
        }
        OutputFormat::Plain => {
            if reviewed > 0 {
                println!();
                println!("{}", summary_line(reviewed, xp_total, &profile));
            }
        }
    }

    Ok(())
}

fn prompt(out: &mut dyn Write, text: &str) -> Result<()> {
    write!(out, "{}", text)?;
    out.flush()?;
    Ok(())
}

/// Prompts and cards must stay off stdout when it carries JSON
fn session_to_stderr(format: &OutputFormat) -> bool {
    matches!(format, OutputFormat::Json)
}

fn summary_line(reviewed: usize, xp: u32, profile: &UserProfile) -> String {
    format!(
        "Reviewed {} card(s), +{} XP. Level {} ({}/{} XP)",
        reviewed, xp, profile.level, profile.xp, XP_PER_LEVEL
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_session_writes_to_stderr() {
        assert!(session_to_stderr(&OutputFormat::Json));
        assert!(!session_to_stderr(&OutputFormat::Plain));
    }

    #[test]
    fn test_summary_line_uses_level_threshold() {
        let profile = UserProfile { xp: 15, level: 3 };
        assert_eq!(
            summary_line(3, 15, &profile),
            format!("Reviewed 3 card(s), +15 XP. Level 3 (15/{} XP)", XP_PER_LEVEL)
        );
    }
}
