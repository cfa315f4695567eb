//! Active-tab session tracking.
//!
//! The browser reports tab activations, finished navigations, window focus
//! loss and a periodic tick. Each of those ends the visit in progress; a
//! [`TabSession`] turns that stream of signals into finished [`Visit`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::is_trackable;
use crate::types::TabId;

/// A tab as reported by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub tab_id: TabId,
    pub url: String,
    #[serde(default)]
    pub title: String,
}

/// A finished visit, not yet classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub tab: TabInfo,
    pub start_time: DateTime<Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveTab {
    tab: TabInfo,
    started_at: DateTime<Utc>,
}

impl ActiveTab {
    fn finish(self, now: DateTime<Utc>) -> Visit {
        let duration_ms = u64::try_from((now - self.started_at).num_milliseconds()).unwrap_or(0);
        Visit {
            tab: self.tab,
            start_time: self.started_at,
            duration_ms,
        }
    }
}

/// Tracks the single tab currently being looked at.
#[derive(Debug, Clone, Default)]
pub struct TabSession {
    active: Option<ActiveTab>,
}

impl TabSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tab whose visit is in progress, if any.
    pub fn active_tab(&self) -> Option<&TabInfo> {
        self.active.as_ref().map(|active| &active.tab)
    }

    /// A tab was activated: ends the current visit and starts a new one.
    ///
    /// Switching to an untrackable page (new tab, settings) leaves the
    /// session idle.
    pub fn activate(&mut self, tab: TabInfo, now: DateTime<Utc>) -> Option<Visit> {
        let finished = self.active.take().map(|active| active.finish(now));
        if is_trackable(&tab.url) {
            self.active = Some(ActiveTab {
                tab,
                started_at: now,
            });
        }
        finished
    }

    /// A navigation finished in the active tab. Same effect as activation.
    pub fn navigate(&mut self, tab: TabInfo, now: DateTime<Utc>) -> Option<Visit> {
        self.activate(tab, now)
    }

    /// The browser window lost focus: ends the current visit.
    pub fn defocus(&mut self, now: DateTime<Utc>) -> Option<Visit> {
        self.active.take().map(|active| active.finish(now))
    }

    /// Periodic flush: ends the current visit and restarts the same tab.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Visit> {
        let active = self.active.take()?;
        let tab = active.tab.clone();
        let visit = active.finish(now);
        self.active = Some(ActiveTab {
            tab,
            started_at: now,
        });
        Some(visit)
    }
}
