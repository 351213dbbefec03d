//! Pagination module
//!
//! Termination policy and offset advancement for row-offset paged APIs.
//!
//! # Overview
//!
//! After every page the driver asks the `TerminationPolicy` whether to keep
//! going. The policy has one rule: an empty page or a page that adds no new
//! rows ends the run; otherwise the next offset is derived from the
//! configured `OffsetStrategy`. A page cap bounds runaway servers.

mod policy;
mod types;

pub use policy::TerminationPolicy;
pub use types::{NextPage, Phase, StopReason, TerminationState};
