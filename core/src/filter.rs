//! Filter tabs and the controller that tracks which one is active.
//!
//! The set of tabs is closed, so selecting an invalid tab cannot be
//! expressed. Selecting a tab never talks to the service: `ListSync` observes
//! the change and issues the fetch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FilterParseError;
use crate::types::TodoStatus;

/// A named filter over todo statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterTab {
    #[default]
    All,
    Pending,
    Completed,
}

impl FilterTab {
    /// Every tab, in tab-strip order.
    pub const ALL: [FilterTab; 3] = [FilterTab::All, FilterTab::Pending, FilterTab::Completed];

    /// Statuses requested from the service while this tab is active. Never empty.
    pub fn statuses(self) -> &'static [TodoStatus] {
        match self {
            FilterTab::All => &[TodoStatus::Pending, TodoStatus::Completed],
            FilterTab::Pending => &[TodoStatus::Pending],
            FilterTab::Completed => &[TodoStatus::Completed],
        }
    }

    pub fn includes(self, status: TodoStatus) -> bool {
        self.statuses().contains(&status)
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterTab::All => "All",
            FilterTab::Pending => "Pending",
            FilterTab::Completed => "Completed",
        }
    }

    /// Position in `FilterTab::ALL`.
    pub fn index(self) -> usize {
        match self {
            FilterTab::All => 0,
            FilterTab::Pending => 1,
            FilterTab::Completed => 2,
        }
    }

    /// The neighbouring tab, wrapping around at either end.
    pub fn cycle(self, forward: bool) -> Self {
        let len = Self::ALL.len();
        let next = if forward {
            (self.index() + 1) % len
        } else {
            (self.index() + len - 1) % len
        };
        Self::ALL[next]
    }
}

impl fmt::Display for FilterTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FilterTab {
    type Err = FilterParseError;

    /// Case-insensitive match on the tab label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterTab::ALL
            .into_iter()
            .find(|tab| tab.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FilterParseError(s.to_string()))
    }
}

/// One entry of the rendered tab strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabView {
    pub tab: FilterTab,
    pub label: &'static str,
    pub selected: bool,
    /// Accessible role of the control.
    pub role: &'static str,
}

/// Holds the active filter tab.
#[derive(Debug, Clone, Default)]
pub struct FilterController {
    active: FilterTab,
}

impl FilterController {
    pub fn new(default: FilterTab) -> Self {
        Self { active: default }
    }

    pub fn active(&self) -> FilterTab {
        self.active
    }

    /// Make `tab` the active filter. Returns `true` if that changed anything.
    pub fn select(&mut self, tab: FilterTab) -> bool {
        if self.active == tab {
            return false;
        }
        tracing::info!(from = %self.active, to = %tab, "filter selected");
        self.active = tab;
        true
    }

    pub fn tabs(&self) -> Vec<TabView> {
        FilterTab::ALL
            .into_iter()
            .map(|tab| TabView {
                tab,
                label: tab.label(),
                selected: tab == self.active,
                role: "tab",
            })
            .collect()
    }
}
