//! Hide policies and the session hide configuration.
//!
//! `resolve_hidden` turns a unit's words plus a [`SessionHideConfig`] into the
//! static hiding decision for that render. Live recognition signals are
//! layered on top of this by [`crate::overlay::merge`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::hiding::{should_hide, MAX_DIFFICULTY};
use crate::model::{Unit, UnitKey, UnitRange};
use crate::words::is_particle;

/// The eight hiding policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HideMode {
    FullHide,
    FirstLetter,
    RandomBlank,
    KeywordMode,
    TranslationRecall,
    AudioRecall,
    ContextRecall,
    ReverseRecall,
}

impl HideMode {
    pub const ALL: [HideMode; 8] = [
        HideMode::FullHide,
        HideMode::FirstLetter,
        HideMode::RandomBlank,
        HideMode::KeywordMode,
        HideMode::TranslationRecall,
        HideMode::AudioRecall,
        HideMode::ContextRecall,
        HideMode::ReverseRecall,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HideMode::FullHide => "full_hide",
            HideMode::FirstLetter => "first_letter",
            HideMode::RandomBlank => "random_blank",
            HideMode::KeywordMode => "keyword_mode",
            HideMode::TranslationRecall => "translation_recall",
            HideMode::AudioRecall => "audio_recall",
            HideMode::ContextRecall => "context_recall",
            HideMode::ReverseRecall => "reverse_recall",
        }
    }

    /// Policies that act on the unit as a whole rather than word by word.
    pub fn is_whole_unit(self) -> bool {
        matches!(
            self,
            HideMode::TranslationRecall
                | HideMode::AudioRecall
                | HideMode::ContextRecall
                | HideMode::ReverseRecall
        )
    }
}

impl fmt::Display for HideMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HideMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        HideMode::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| format!("unknown hide mode: {s}"))
    }
}

/// A hide mode as configured, which may name a mode this build does not know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModeSetting {
    Known(HideMode),
    Unrecognized(String),
}

impl ModeSetting {
    pub fn mode(&self) -> Option<HideMode> {
        match self {
            ModeSetting::Known(m) => Some(*m),
            ModeSetting::Unrecognized(_) => None,
        }
    }
}

impl From<HideMode> for ModeSetting {
    fn from(mode: HideMode) -> Self {
        ModeSetting::Known(mode)
    }
}

impl From<String> for ModeSetting {
    fn from(raw: String) -> Self {
        match raw.parse() {
            Ok(mode) => ModeSetting::Known(mode),
            Err(_) => ModeSetting::Unrecognized(raw),
        }
    }
}

impl From<&str> for ModeSetting {
    fn from(raw: &str) -> Self {
        ModeSetting::from(raw.to_string())
    }
}

impl From<ModeSetting> for String {
    fn from(setting: ModeSetting) -> Self {
        match setting {
            ModeSetting::Known(mode) => mode.as_str().to_string(),
            ModeSetting::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for ModeSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeSetting::Known(mode) => write!(f, "{mode}"),
            ModeSetting::Unrecognized(raw) => write!(f, "{raw} (unrecognized)"),
        }
    }
}

/// Hiding configuration of one session.
///
/// Updated only through [`SessionHideConfig::reduce`], which bumps `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHideConfig {
    pub hide_mode: ModeSetting,
    /// 1–5; only `random_blank` reads it.
    pub hide_difficulty: i32,
    /// Master switch. When false every word is shown.
    pub is_hidden: bool,
    /// Words the user tapped open.
    #[serde(default)]
    pub manually_revealed_keys: BTreeSet<String>,
    pub unit_range: UnitRange,
    #[serde(default)]
    pub version: u64,
}

/// One update to a [`SessionHideConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HideAction {
    SetMode(ModeSetting),
    SetDifficulty(i32),
    SetHidden(bool),
    ToggleHidden,
    RevealWord(String),
    ClearRevealed,
    SetRange(UnitRange),
}

impl SessionHideConfig {
    pub fn new(hide_mode: impl Into<ModeSetting>, unit_range: UnitRange) -> Self {
        Self {
            hide_mode: hide_mode.into(),
            hide_difficulty: 2,
            is_hidden: true,
            manually_revealed_keys: BTreeSet::new(),
            unit_range,
            version: 0,
        }
    }

    /// Apply `action`, returning the next configuration.
    pub fn reduce(&self, action: HideAction) -> SessionHideConfig {
        let mut next = self.clone();
        match action {
            HideAction::SetMode(mode) => {
                if let ModeSetting::Unrecognized(raw) = &mode {
                    tracing::warn!(mode = %raw, "unrecognized hide mode, words will be shown");
                }
                next.hide_mode = mode;
            }
            HideAction::SetDifficulty(level) => {
                let clamped = level.clamp(0, MAX_DIFFICULTY);
                if clamped != level {
                    tracing::warn!(level, clamped, "hide difficulty out of range");
                }
                next.hide_difficulty = clamped;
            }
            HideAction::SetHidden(hidden) => next.is_hidden = hidden,
            HideAction::ToggleHidden => next.is_hidden = !next.is_hidden,
            HideAction::RevealWord(key) => {
                next.manually_revealed_keys.insert(key);
            }
            HideAction::ClearRevealed => next.manually_revealed_keys.clear(),
            HideAction::SetRange(range) => next.unit_range = range,
        }
        next.version = self.version + 1;
        next
    }

    pub fn is_revealed(&self, key: &str) -> bool {
        self.manually_revealed_keys.contains(key)
    }
}

/// Side effect a whole-unit policy asks the surrounding app to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "unit", rename_all = "snake_case")]
pub enum RecallTrigger {
    ShowTranslation(UnitKey),
    PlayAudio(UnitKey),
}

/// The always-visible last word in `reverse_recall`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub key: String,
    pub text: String,
}

/// Static hiding decision for one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Mode that produced this decision; `None` when it fell back to showing everything.
    pub mode: Option<HideMode>,
    /// Every word key covered, in reading order.
    pub keys: Vec<String>,
    pub hidden: BTreeSet<String>,
    /// Hidden words that show their first letter. Always a subset of `hidden`.
    pub hinted: BTreeSet<String>,
    /// Set for whole-unit policies while hiding is on.
    pub unit_hidden: bool,
    pub anchor: Option<Anchor>,
    pub trigger: Option<RecallTrigger>,
}

impl Resolution {
    fn showing_all(keys: Vec<String>) -> Self {
        Self {
            mode: None,
            keys,
            hidden: BTreeSet::new(),
            hinted: BTreeSet::new(),
            unit_hidden: false,
            anchor: None,
            trigger: None,
        }
    }

    /// True when no word is hidden or hinted.
    pub fn reveals_everything(&self) -> bool {
        self.hidden.is_empty()
    }
}

/// Resolve which words of `current` are hidden under `config`.
///
/// `context` holds neighbouring units rendered alongside the current one
/// (used by `context_recall`); their words are never hidden.
pub fn resolve_hidden(current: &Unit, context: &[Unit], config: &SessionHideConfig) -> Resolution {
    let mut units: Vec<&Unit> = context.iter().filter(|u| u.key != current.key).collect();
    units.push(current);
    units.sort_by_key(|u| u.key);
    let keys = units
        .iter()
        .flat_map(|u| u.keys().map(String::from))
        .collect();

    let mut res = Resolution::showing_all(keys);
    let mode = match &config.hide_mode {
        ModeSetting::Known(mode) => *mode,
        ModeSetting::Unrecognized(raw) => {
            tracing::warn!(mode = %raw, unit = %current.key, "unrecognized hide mode, showing all words");
            return res;
        }
    };
    res.mode = Some(mode);

    if mode == HideMode::ReverseRecall {
        res.anchor = current.words.last().map(|w| Anchor {
            key: w.key.clone(),
            text: w.text.clone(),
        });
    }

    if !config.is_hidden {
        return res;
    }

    let unit_key = current.key.to_string();
    let total = current.len();
    for (i, word) in current.words.iter().enumerate() {
        let open = config.is_revealed(&word.key);
        let hide = match mode {
            HideMode::FullHide | HideMode::FirstLetter | HideMode::ContextRecall => !open,
            HideMode::RandomBlank => {
                !open && should_hide(&unit_key, i, total, config.hide_difficulty)
            }
            HideMode::KeywordMode => !open && is_particle(&word.text),
            HideMode::TranslationRecall | HideMode::AudioRecall => true,
            HideMode::ReverseRecall => !open && i + 1 < total,
        };
        if hide {
            res.hidden.insert(word.key.clone());
            if mode == HideMode::FirstLetter {
                res.hinted.insert(word.key.clone());
            }
        }
    }

    res.unit_hidden = mode.is_whole_unit();
    res.trigger = match mode {
        HideMode::TranslationRecall => Some(RecallTrigger::ShowTranslation(current.key)),
        HideMode::AudioRecall => Some(RecallTrigger::PlayAudio(current.key)),
        _ => None,
    };
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> UnitRange {
        UnitRange::new(UnitKey::new(2, 1), UnitKey::new(2, 7))
    }

    fn five_words() -> Unit {
        Unit::from_texts(UnitKey::new(2, 5), &["أُولَٰئِكَ", "عَلَىٰ", "هُدًى", "مِّن", "رَّبِّهِمْ"])
    }

    fn config(mode: HideMode) -> SessionHideConfig {
        SessionHideConfig::new(mode, range())
    }

    fn set(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn hide_mode_display_and_parse() {
        for mode in HideMode::ALL {
            assert_eq!(mode.to_string().parse::<HideMode>().unwrap(), mode);
        }
        assert_eq!("Random-Blank".parse::<HideMode>().unwrap(), HideMode::RandomBlank);
        assert!("blur_everything".parse::<HideMode>().is_err());
    }

    #[test]
    fn mode_setting_keeps_unknown_raw_value() {
        let setting = ModeSetting::from("blur_everything");
        assert_eq!(setting, ModeSetting::Unrecognized("blur_everything".into()));
        assert_eq!(String::from(setting), "blur_everything");
        let json = serde_json::to_string(&ModeSetting::from(HideMode::KeywordMode)).unwrap();
        assert_eq!(json, "\"keyword_mode\"");
    }

    #[test]
    fn full_hide_hides_every_word() {
        let unit = five_words();
        let res = resolve_hidden(&unit, &[], &config(HideMode::FullHide));
        assert_eq!(res.hidden.len(), 5);
        assert!(res.hinted.is_empty());
        assert!(!res.unit_hidden);
    }

    #[test]
    fn tapping_a_word_reveals_only_that_word() {
        let unit = five_words();
        let cfg = config(HideMode::FullHide).reduce(HideAction::RevealWord("2:5:3".into()));
        let res = resolve_hidden(&unit, &[], &cfg);
        assert_eq!(res.hidden, set(&["2:5:1", "2:5:2", "2:5:4", "2:5:5"]));
    }

    #[test]
    fn master_switch_off_reveals_everything() {
        let unit = five_words();
        for mode in HideMode::ALL {
            let cfg = config(mode).reduce(HideAction::SetHidden(false));
            let res = resolve_hidden(&unit, &[], &cfg);
            assert!(res.reveals_everything(), "{mode} hid words while switched off");
            assert!(res.trigger.is_none());
        }
    }

    #[test]
    fn first_letter_hints_every_hidden_word() {
        let unit = five_words();
        let cfg = config(HideMode::FirstLetter).reduce(HideAction::RevealWord("2:5:1".into()));
        let res = resolve_hidden(&unit, &[], &cfg);
        assert_eq!(res.hidden.len(), 4);
        assert_eq!(res.hinted, res.hidden);
    }

    #[test]
    fn random_blank_is_stable_across_calls() {
        let unit = Unit::from_texts(UnitKey::new(2, 5), &["w"; 10]);
        let cfg = config(HideMode::RandomBlank).reduce(HideAction::SetDifficulty(1));
        let first = resolve_hidden(&unit, &[], &cfg);
        let second = resolve_hidden(&unit, &[], &cfg);
        assert_eq!(first.hidden, second.hidden);
        assert_eq!(first.hidden, set(&["2:5:4"]));
    }

    #[test]
    fn random_blank_respects_manual_reveal() {
        let unit = Unit::from_texts(UnitKey::new(2, 5), &["w"; 10]);
        let cfg = config(HideMode::RandomBlank)
            .reduce(HideAction::SetDifficulty(2))
            .reduce(HideAction::RevealWord("2:5:5".into()));
        let res = resolve_hidden(&unit, &[], &cfg);
        assert_eq!(res.hidden, set(&["2:5:4", "2:5:10"]));
    }

    #[test]
    fn keyword_mode_hides_exactly_the_particles() {
        let unit = five_words();
        let res = resolve_hidden(&unit, &[], &config(HideMode::KeywordMode));
        let particles: BTreeSet<String> = unit
            .words
            .iter()
            .filter(|w| is_particle(&w.text))
            .map(|w| w.key.clone())
            .collect();
        assert_eq!(res.hidden, particles);
        assert_eq!(res.hidden, set(&["2:5:1", "2:5:2", "2:5:4"]));
    }

    #[test]
    fn translation_and_audio_hide_the_unit_and_trigger() {
        let unit = five_words();
        let res = resolve_hidden(&unit, &[], &config(HideMode::TranslationRecall));
        assert!(res.unit_hidden);
        assert_eq!(res.hidden.len(), 5);
        assert_eq!(res.trigger, Some(RecallTrigger::ShowTranslation(unit.key)));

        // manual reveals have no word granularity here
        let cfg = config(HideMode::AudioRecall).reduce(HideAction::RevealWord("2:5:2".into()));
        let res = resolve_hidden(&unit, &[], &cfg);
        assert_eq!(res.hidden.len(), 5);
        assert_eq!(res.trigger, Some(RecallTrigger::PlayAudio(unit.key)));
    }

    #[test]
    fn context_recall_leaves_neighbours_visible() {
        let prev = Unit::from_texts(UnitKey::new(2, 4), &["a", "b"]);
        let next = Unit::from_texts(UnitKey::new(2, 6), &["c"]);
        let unit = five_words();
        let res = resolve_hidden(&unit, &[next, prev], &config(HideMode::ContextRecall));
        assert_eq!(res.hidden.len(), 5);
        assert!(res.hidden.iter().all(|k| unit.key.owns(k)));
        assert_eq!(res.keys.first().map(String::as_str), Some("2:4:1"));
        assert_eq!(res.keys.last().map(String::as_str), Some("2:6:1"));
        assert_eq!(res.keys.len(), 8);
    }

    #[test]
    fn reverse_recall_anchors_last_word() {
        let unit = five_words();
        let res = resolve_hidden(&unit, &[], &config(HideMode::ReverseRecall));
        assert_eq!(res.hidden, set(&["2:5:1", "2:5:2", "2:5:3", "2:5:4"]));
        let anchor = res.anchor.expect("anchor");
        assert_eq!(anchor.key, "2:5:5");

        let shown = config(HideMode::ReverseRecall).reduce(HideAction::SetHidden(false));
        let res = resolve_hidden(&unit, &[], &shown);
        assert!(res.anchor.is_some());
        assert!(res.hidden.is_empty());
    }

    #[test]
    fn unrecognized_mode_fails_open() {
        let unit = five_words();
        let cfg = SessionHideConfig::new("blur_everything", range());
        let res = resolve_hidden(&unit, &[], &cfg);
        assert!(res.mode.is_none());
        assert!(res.reveals_everything());
        assert_eq!(res.keys.len(), 5);
    }

    #[test]
    fn reducer_bumps_version_and_clamps_difficulty() {
        let cfg = config(HideMode::RandomBlank);
        assert_eq!(cfg.version, 0);
        let cfg = cfg.reduce(HideAction::SetDifficulty(9));
        assert_eq!(cfg.hide_difficulty, 5);
        assert_eq!(cfg.version, 1);
        let cfg = cfg.reduce(HideAction::SetDifficulty(-2));
        assert_eq!(cfg.hide_difficulty, 0);
        let cfg = cfg.reduce(HideAction::ToggleHidden);
        assert!(!cfg.is_hidden);
        assert_eq!(cfg.version, 3);
    }

    #[test]
    fn revealed_keys_grow_until_cleared() {
        let cfg = config(HideMode::FullHide)
            .reduce(HideAction::RevealWord("2:5:1".into()))
            .reduce(HideAction::RevealWord("2:5:2".into()))
            .reduce(HideAction::RevealWord("2:5:1".into()));
        assert_eq!(cfg.manually_revealed_keys.len(), 2);
        let cleared = cfg.reduce(HideAction::ClearRevealed);
        assert!(cleared.manually_revealed_keys.is_empty());
        assert_eq!(cleared.version, cfg.version + 1);
    }
}
