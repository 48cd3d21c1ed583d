//! Optional observability helpers for courier flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth1_courier.flow` with the `flow`
//!   (operation) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `oauth1_courier_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Courier operations observed by the instrumentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Posting the next queued quote.
	Publish,
	/// Thank-you reply to a submitter.
	Reply,
	/// Queue maintenance actions.
	Maintenance,
	/// Secondary media fetch.
	MediaFetch,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Publish => "publish",
			FlowKind::Reply => "reply",
			FlowKind::Maintenance => "maintenance",
			FlowKind::MediaFetch => "media_fetch",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a courier operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
