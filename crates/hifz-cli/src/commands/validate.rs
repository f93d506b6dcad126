//! The `hifz validate` command.

use std::path::PathBuf;

use anyhow::Result;

use hifz_core::parser::{load_passages, validate_passage};

pub fn execute(passage_path: PathBuf) -> Result<()> {
    let passages = load_passages(&passage_path)?;

    let mut total_warnings = 0;

    for passage in &passages {
        println!(
            "Passage: {} ({} units, {} words)",
            passage.name,
            passage.units.len(),
            passage.word_count()
        );

        let warnings = validate_passage(passage);
        for w in &warnings {
            let prefix = w
                .unit
                .map(|key| format!("  [{key}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if passages.is_empty() {
        println!("No passages found.");
    } else if total_warnings == 0 {
        println!("All passages valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
