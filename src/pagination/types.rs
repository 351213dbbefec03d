//! Pagination types
//!
//! Defines the decision values and the per-run state the policy updates.

use serde::Serialize;
use std::fmt;

/// Result of evaluating one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    /// Fetch another page starting at this offset
    Continue {
        /// Value for the offset parameter
        offset: usize,
    },
    /// Stop paginating
    Done(StopReason),
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The provider returned a page with no records
    EmptyPage,
    /// A page contributed no rows that were not already present
    Stagnation,
    /// The page cap was reached before the source was exhausted
    PageLimit,
    /// A page could not be fetched or processed
    Failed,
}

impl StopReason {
    /// Whether this reason means the source was drained completely
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::EmptyPage | Self::Stagnation)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::EmptyPage => "empty page",
            Self::Stagnation => "no new rows",
            Self::PageLimit => "page limit",
            Self::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// Lifecycle phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Still fetching pages
    #[default]
    Continuing,
    /// Finished for the given reason
    Done(StopReason),
}

/// Tracks termination state during one run
#[derive(Debug, Clone, Default)]
pub struct TerminationState {
    /// Result size after the previous page
    pub prior_size: usize,
    /// Pages evaluated so far
    pub pages: u32,
    /// Raw records received so far, duplicates included
    pub rows_received: usize,
    /// Current phase
    pub phase: Phase,
}

impl TerminationState {
    /// Create a fresh state for a new run
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the run has finished
    pub fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Done(_))
    }

    /// Mark the run as finished
    pub fn finish(&mut self, reason: StopReason) -> NextPage {
        self.phase = Phase::Done(reason);
        NextPage::Done(reason)
    }
}
