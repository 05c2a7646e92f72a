use anyhow::Result;

use crate::app::App;
use crate::render::terminal::render_nodes;
use crate::OutputFormat;

/// List stored cards, or only those due today
pub fn run(app: &App, due_only: bool, format: &OutputFormat, use_color: bool) -> Result<()> {
    let nodes = if due_only {
        app.lab.due_nodes(app.today())?
    } else {
        app.lab.list_nodes()?
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&nodes)?);
        }
        OutputFormat::Plain => {
            if nodes.is_empty() {
                if due_only {
                    println!("Nothing due. Come back later.");
                } else {
                    println!("No cards yet. Run `cogni-cli synthesize <file>` to create some.");
                }
                return Ok(());
            }

            println!("{}", render_nodes(&nodes, use_color));
            let label = if due_only { "due" } else { "total" };
            println!("\n{} card(s) {}", nodes.len(), label);
        }
    }

    Ok(())
}
