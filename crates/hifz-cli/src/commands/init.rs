//! The `hifz init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_once(Path::new("hifz.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("passages").context("failed to create passages/")?;
    write_once(Path::new("passages/al-fatiha.toml"), EXAMPLE_PASSAGE)?;

    std::fs::create_dir_all("sessions").context("failed to create sessions/")?;
    write_once(Path::new("sessions/example.toml"), EXAMPLE_SESSION)?;

    println!("\nNext steps:");
    println!("  1. Run: hifz validate --passage passages/al-fatiha.toml");
    println!("  2. Run: hifz preview --unit 1:7 --words 9 --difficulty 3");
    println!(
        "  3. Run: hifz resolve --passage passages/al-fatiha.toml --session sessions/example.toml"
    );

    Ok(())
}

fn write_once(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# hifz configuration

# full_hide, first_letter, random_blank, keyword_mode,
# translation_recall, audio_recall, context_recall, reverse_recall
default_hide_mode = "full_hide"

# 1-5, used by random_blank
default_difficulty = 2

# text or json
output_format = "text"
"#;

const EXAMPLE_PASSAGE: &str = r#"[passage]
id = "al-fatiha"
name = "Al-Fatiha"

[[units]]
key = "1:1"
page = 1
words = ["بِسْمِ", "ٱللَّهِ", "ٱلرَّحْمَٰنِ", "ٱلرَّحِيمِ"]

[[units]]
key = "1:2"
page = 1
words = ["ٱلْحَمْدُ", "لِلَّهِ", "رَبِّ", "ٱلْعَٰلَمِينَ"]

[[units]]
key = "1:3"
page = 1
words = ["ٱلرَّحْمَٰنِ", "ٱلرَّحِيمِ"]

[[units]]
key = "1:4"
page = 1
words = ["مَٰلِكِ", "يَوْمِ", "ٱلدِّينِ"]

[[units]]
key = "1:5"
page = 1
words = ["إِيَّاكَ", "نَعْبُدُ", "وَإِيَّاكَ", "نَسْتَعِينُ"]

[[units]]
key = "1:6"
page = 1
words = ["ٱهْدِنَا", "ٱلصِّرَٰطَ", "ٱلْمُسْتَقِيمَ"]

[[units]]
key = "1:7"
page = 1
words = ["صِرَٰطَ", "ٱلَّذِينَ", "أَنْعَمْتَ", "عَلَيْهِمْ", "غَيْرِ", "ٱلْمَغْضُوبِ", "عَلَيْهِمْ", "وَلَا", "ٱلضَّآلِّينَ"]
"#;

const EXAMPLE_SESSION: &str = r#"# Reciting 1:2 after one attempt at 1:1
current = "1:2"

[config]
hide_mode = "first_letter"
is_hidden = true

[live]
unit = "1:2"
correct_keys = ["1:2:1"]
current_key = "1:2:1"
is_listening = true

[[results]]
unit = "1:1"
sequence = 1
statuses = ["correct", "correct", "wrong", "correct"]
"#;
