//! The `hifz preview` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use hifz_core::config::load_config_from;
use hifz_core::hiding::{hide_threshold, should_hide};
use hifz_core::model::UnitKey;

pub fn execute(
    unit: String,
    words: usize,
    difficulty: Option<i32>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let key: UnitKey = unit.parse().context("invalid --unit")?;
    let difficulty = match difficulty {
        Some(d) => d,
        None => load_config_from(config_path.as_deref())?.default_difficulty,
    };

    let unit_key = key.to_string();
    let hidden: Vec<usize> = (0..words)
        .filter(|&i| should_hide(&unit_key, i, words, difficulty))
        .collect();

    println!(
        "Unit {key}: {words} words, difficulty {difficulty} (threshold {}%)",
        hide_threshold(difficulty)
    );
    let pattern: Vec<&str> = (0..words)
        .map(|i| if hidden.contains(&i) { "#" } else { "." })
        .collect();
    println!("  {}", pattern.join(" "));
    if hidden.is_empty() {
        println!("No words hidden.");
    } else {
        let keys: Vec<String> = hidden.iter().map(|&i| key.word_key(i + 1)).collect();
        println!("Hidden ({} of {words}): {}", hidden.len(), keys.join(", "));
    }

    Ok(())
}
