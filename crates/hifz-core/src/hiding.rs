//! Deterministic pseudo-random hiding for `random_blank` mode.
//!
//! The decision is a pure function of its arguments so a hidden pattern is
//! identical across re-renders, restarts and resumed sessions. There is no
//! generator state anywhere.

/// Highest difficulty level; hides every word.
pub const MAX_DIFFICULTY: i32 = 5;

/// Percentage of words hidden per difficulty step.
const PERCENT_PER_LEVEL: u32 = 20;

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a over the bytes of `s`, finished with the murmur3 avalanche step so
/// that keys differing only in their last digit land far apart.
pub fn string_hash(s: &str) -> u32 {
    let mut h = FNV_OFFSET;
    for b in s.bytes() {
        h ^= u32::from(b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// Hide threshold in percent for a difficulty, saturating at 0 and 100.
pub fn hide_threshold(difficulty: i32) -> u32 {
    (difficulty.clamp(0, MAX_DIFFICULTY) as u32) * PERCENT_PER_LEVEL
}

/// Decide whether word `word_index` (0-based) of a unit is hidden.
///
/// `difficulty <= 0` hides nothing and `difficulty >= 5` hides everything.
/// Indices outside `0..total_words` are never hidden.
pub fn should_hide(unit_key: &str, word_index: usize, total_words: usize, difficulty: i32) -> bool {
    if word_index >= total_words {
        return false;
    }
    let threshold = hide_threshold(difficulty);
    if threshold == 0 {
        return false;
    }
    let roll = string_hash(&format!("{unit_key}:{word_index}")) % 100;
    roll < threshold
}
