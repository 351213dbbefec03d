//! The termination policy
//!
//! One rule for every provider shape: stop on an empty page, stop when a
//! page adds nothing new, otherwise advance the offset.

use super::types::{NextPage, Phase, StopReason, TerminationState};
use crate::rows::MergeOutcome;
use crate::types::OffsetStrategy;

/// Decides after each page whether to fetch another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerminationPolicy {
    /// How the next offset is computed
    pub offset_strategy: OffsetStrategy,
    /// Maximum pages to fetch in one run
    pub max_pages: Option<u32>,
}

impl TerminationPolicy {
    /// Create a policy with the default offset strategy and no page cap
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the offset strategy
    #[must_use]
    pub fn with_offset_strategy(mut self, strategy: OffsetStrategy) -> Self {
        self.offset_strategy = strategy;
        self
    }

    /// Cap the number of pages per run
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Evaluate one merged page and update `state`
    pub fn evaluate(&self, state: &mut TerminationState, merge: &MergeOutcome) -> NextPage {
        if let Phase::Done(reason) = state.phase {
            return NextPage::Done(reason);
        }

        state.pages += 1;
        state.rows_received += merge.received;

        if merge.received == 0 {
            return state.finish(StopReason::EmptyPage);
        }

        let grew = merge.after > state.prior_size;
        state.prior_size = merge.after;
        if !grew {
            return state.finish(StopReason::Stagnation);
        }

        if self.max_pages.is_some_and(|max| state.pages >= max) {
            return state.finish(StopReason::PageLimit);
        }

        let offset = match self.offset_strategy {
            OffsetStrategy::UniqueRows => merge.after,
            OffsetStrategy::RowsReceived => state.rows_received,
        };
        NextPage::Continue { offset }
    }
}
