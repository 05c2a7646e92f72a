use cogni_lib::flashcards::MemoryNode;
use cogni_lib::study::StudyArtifactBundle;

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
}

/// Wrap text in a color when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// `[#####-----]` style bar for a 0.0 - 1.0 fraction
pub fn bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Shorten to `max` characters, marking the cut with an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max {
        single_line
    } else {
        let cut: String = single_line.chars().take(max.saturating_sub(1)).collect();
        format!("{}\u{2026}", cut)
    }
}

/// One row per card: id prefix, due date, interval, easiness, question
pub fn render_nodes(nodes: &[MemoryNode], use_color: bool) -> String {
    let mut lines = Vec::with_capacity(nodes.len() + 2);
    lines.push(paint(
        &format!("{:<8} {:<10} {:>5} {:>5}  {}", "ID", "Due", "Ivl", "EF", "Question"),
        Color::BOLD,
        use_color,
    ));
    lines.push("\u{2500}".repeat(60));

    for node in nodes {
        let id = node.id.to_string();
        lines.push(format!(
            "{:<8} {:<10} {:>4}d {:>5.2}  {}",
            &id[..8],
            node.next_review.format("%Y-%m-%d"),
            node.interval,
            node.easiness,
            truncate(&node.question, 50)
        ));
    }

    lines.join("\n")
}

/// Summary of a synthesized bundle
pub fn render_bundle(bundle: &StudyArtifactBundle, use_color: bool) -> String {
    let mut lines = Vec::new();

    lines.push(paint(
        &format!("Flashcards ({})", bundle.flashcards.len()),
        Color::BOLD,
        use_color,
    ));
    for (i, card) in bundle.flashcards.iter().enumerate() {
        lines.push(format!("  {}. {}", i + 1, card.question));
        lines.push(paint(&format!("     {}", card.answer), Color::DIM, use_color));
    }

    if !bundle.quiz.is_empty() {
        lines.push(String::new());
        lines.push(paint(
            &format!("Quiz ({})", bundle.quiz.len()),
            Color::BOLD,
            use_color,
        ));
        for (i, item) in bundle.quiz.iter().enumerate() {
            lines.push(format!("  {}. {}", i + 1, item.question));
            for option in &item.options {
                let marker = if *option == item.answer { "*" } else { " " };
                lines.push(format!("     {} {}", marker, option));
            }
        }
    }

    if let Some(map) = &bundle.concept_map {
        lines.push(String::new());
        lines.push(paint("Concept map", Color::BOLD, use_color));
        lines.extend(map.lines().map(|l| format!("  {}", l)));
    }

    if let Some(vision) = &bundle.vision_prompt {
        lines.push(String::new());
        lines.push(paint("Vision prompt", Color::BOLD, use_color));
        lines.push(format!("  {}", vision));
    }

    lines.join("\n")
}
