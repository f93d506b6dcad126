//! Which unit is current, and what moving between units does to reveal state.
//!
//! Two boundaries are tracked independently:
//! - the session range: moving past either end is a no-op;
//! - the rendering page: advancing onto a new page clears manual reveals
//!   (they are scoped to what is on screen) but never scoring results (they
//!   are scoped to the session range).
//!
//! Moving backwards never clears anything.

use serde::{Deserialize, Serialize};

use crate::model::{UnitKey, UnitRange};

/// A unit together with the page it is rendered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedUnit {
    pub key: UnitKey,
    pub page: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavState {
    /// Moving inside a page; reveal state carries over.
    WithinUnit,
    /// Just advanced onto a new page; manual reveals were dropped.
    UnitBoundary,
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved { from: UnitKey, to: UnitKey },
    PageTurned { from: UnitKey, to: UnitKey, page: u16 },
    /// Already at the edge of the session range (or the range is empty).
    Blocked,
}

impl Transition {
    /// Whether manually revealed words must be cleared.
    pub fn clears_reveals(&self) -> bool {
        matches!(self, Transition::PageTurned { .. })
    }

    pub fn target(&self) -> Option<UnitKey> {
        match self {
            Transition::Moved { to, .. } | Transition::PageTurned { to, .. } => Some(*to),
            Transition::Blocked => None,
        }
    }
}

/// Cursor over the units of a session range.
#[derive(Debug, Clone)]
pub struct Navigator {
    units: Vec<PagedUnit>,
    index: usize,
    state: NavState,
}

impl Navigator {
    /// Build a navigator over the units of `layout` that fall inside `range`.
    pub fn new(layout: impl IntoIterator<Item = PagedUnit>, range: &UnitRange) -> Self {
        let mut units: Vec<PagedUnit> = layout
            .into_iter()
            .filter(|u| range.contains(&u.key))
            .collect();
        units.sort_by_key(|u| u.key);
        units.dedup_by_key(|u| u.key);
        Self {
            units,
            index: 0,
            state: NavState::WithinUnit,
        }
    }

    pub fn current(&self) -> Option<PagedUnit> {
        self.units.get(self.index).copied()
    }

    pub fn current_key(&self) -> Option<UnitKey> {
        self.current().map(|u| u.key)
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units immediately before and after the current one, within the range.
    pub fn neighbours(&self) -> (Option<UnitKey>, Option<UnitKey>) {
        let prev = self
            .index
            .checked_sub(1)
            .and_then(|i| self.units.get(i))
            .map(|u| u.key);
        let next = self.units.get(self.index + 1).map(|u| u.key);
        (prev, next)
    }

    /// Units sharing the current page.
    pub fn page_units(&self) -> Vec<UnitKey> {
        let Some(current) = self.current() else {
            return Vec::new();
        };
        self.units
            .iter()
            .filter(|u| u.page == current.page)
            .map(|u| u.key)
            .collect()
    }

    pub fn next(&mut self) -> Transition {
        let Some(from) = self.current() else {
            return Transition::Blocked;
        };
        let Some(to) = self.units.get(self.index + 1).copied() else {
            tracing::debug!(unit = %from.key, "at end of session range");
            return Transition::Blocked;
        };
        self.index += 1;
        if to.page != from.page {
            tracing::debug!(from = %from.key, to = %to.key, page = to.page, "page boundary");
            self.state = NavState::UnitBoundary;
            Transition::PageTurned {
                from: from.key,
                to: to.key,
                page: to.page,
            }
        } else {
            self.state = NavState::WithinUnit;
            Transition::Moved {
                from: from.key,
                to: to.key,
            }
        }
    }

    pub fn previous(&mut self) -> Transition {
        let Some(from) = self.current() else {
            return Transition::Blocked;
        };
        if self.index == 0 {
            tracing::debug!(unit = %from.key, "at start of session range");
            return Transition::Blocked;
        }
        self.index -= 1;
        self.state = NavState::WithinUnit;
        Transition::Moved {
            from: from.key,
            to: self.units[self.index].key,
        }
    }

    /// Move to `key` without a transition: nothing is cleared and the state
    /// is `WithinUnit`. Returns `false` if `key` is outside the range.
    pub fn reposition(&mut self, key: UnitKey) -> bool {
        match self.units.iter().position(|u| u.key == key) {
            Some(index) => {
                self.index = index;
                self.state = NavState::WithinUnit;
                true
            }
            None => false,
        }
    }

    /// Jump straight to `key`. Forward jumps onto another page behave like
    /// [`Navigator::next`] across a page; backward jumps like
    /// [`Navigator::previous`]. Keys outside the range are blocked.
    pub fn seek(&mut self, key: UnitKey) -> Transition {
        let Some(from) = self.current() else {
            return Transition::Blocked;
        };
        let Some(target) = self.units.iter().position(|u| u.key == key) else {
            return Transition::Blocked;
        };
        if target == self.index {
            return Transition::Blocked;
        }
        let to = self.units[target];
        let forward = target > self.index;
        self.index = target;
        if forward && to.page != from.page {
            self.state = NavState::UnitBoundary;
            Transition::PageTurned {
                from: from.key,
                to: to.key,
                page: to.page,
            }
        } else {
            self.state = NavState::WithinUnit;
            Transition::Moved {
                from: from.key,
                to: to.key,
            }
        }
    }
}
