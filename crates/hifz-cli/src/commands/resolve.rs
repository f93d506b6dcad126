//! The `hifz resolve` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use tokio::sync::mpsc;

use hifz_core::config::load_config_from;
use hifz_core::driver::{DriverEvent, SessionDriver};
use hifz_core::engine::Session;
use hifz_core::mock::MockScorer;
use hifz_core::model::Passage;
use hifz_core::overlay::{RenderPlan, WordState};
use hifz_core::parser::{parse_passage, parse_scenario};
use hifz_core::policy::RecallTrigger;
use hifz_core::words::hint_text;

pub async fn execute(
    passage_path: PathBuf,
    session_path: PathBuf,
    recite: Option<String>,
    format: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let passage = parse_passage(&passage_path)?;
    let scenario = parse_scenario(&session_path)?;

    let mut session = scenario.replay(passage, &config.hide_mode(), config.default_difficulty)?;
    tracing::debug!(
        current = ?session.current(),
        results = session.accumulator().len(),
        version = session.config().version,
        "scenario replayed"
    );

    if let Some(transcript) = recite {
        session = score_offline(session, transcript).await?;
    }

    let plan = session
        .render(&scenario.weakness)
        .context("session has no current unit")?;

    let format = format.unwrap_or(config.output_format);
    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        _ => print_text(&session, &plan),
    }

    Ok(())
}

/// Score `transcript` against the current unit with the built-in aligner.
async fn score_offline(session: Session, transcript: String) -> Result<Session> {
    let unit = session.current().context("session has no current unit")?;
    let driver = SessionDriver::new(session, Arc::new(MockScorer::new()));

    let (tx, rx) = mpsc::channel(4);
    let running = tokio::spawn(driver.run(rx));
    tx.send(DriverEvent::Recited { unit, transcript })
        .await
        .context("session driver stopped early")?;
    tx.send(DriverEvent::Finish)
        .await
        .context("session driver stopped early")?;

    running.await.context("session driver panicked")
}

fn print_text(session: &Session, plan: &RenderPlan) {
    let passage: &Passage = session.passage();
    let mode = plan
        .mode
        .map(|m| m.to_string())
        .unwrap_or_else(|| format!("{} (showing all)", session.config().hide_mode));

    if let Some(current) = session.current() {
        println!("Passage: {}, unit {current}, mode {mode}", passage.name);
    }
    match plan.trigger {
        Some(RecallTrigger::ShowTranslation(unit)) => println!("Recall from translation of {unit}"),
        Some(RecallTrigger::PlayAudio(unit)) => println!("Recall from audio of {unit}"),
        None => {}
    }
    if let Some(anchor) = &plan.anchor {
        println!("Anchor: {} ({})", anchor.text, anchor.key);
    }

    let mut table = Table::new();
    table.set_header(vec!["", "Key", "Shown", "State"]);

    for entry in &plan.entries {
        let text = word_text(passage, &entry.key).unwrap_or_default();
        let shown = match entry.state {
            WordState::Hidden => "____".to_string(),
            WordState::Hinted => hint_text(&text),
            WordState::Mistake => match plan.mistake_details.get(&entry.key) {
                Some(recited) => format!("{text} (said: {recited})"),
                None => text,
            },
            WordState::Correct | WordState::Revealed => text,
        };
        table.add_row(vec![
            Cell::new(if entry.is_current { ">" } else { "" }),
            Cell::new(&entry.key),
            Cell::new(shown),
            Cell::new(state_label(entry.state)),
        ]);
    }

    println!("{table}");
    let [hidden, hinted, mistakes, correct, revealed] = plan.counts();
    println!(
        "{hidden} hidden, {hinted} hinted, {mistakes} mistake(s), {correct} correct, {revealed} revealed"
    );
}

fn word_text(passage: &Passage, key: &str) -> Option<String> {
    passage
        .units
        .iter()
        .flat_map(|u| u.words.iter())
        .find(|w| w.key == key)
        .map(|w| w.text.clone())
}

fn state_label(state: WordState) -> &'static str {
    match state {
        WordState::Hidden => "hidden",
        WordState::Hinted => "hinted",
        WordState::Mistake => "mistake",
        WordState::Correct => "correct",
        WordState::Revealed => "revealed",
    }
}
