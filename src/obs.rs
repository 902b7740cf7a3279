//! Optional observability helpers for authentication attempts and fraud collection.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `risk_orchestrator.flow` with the `flow`
//!   and `stage` fields, plus debug events at the orchestration decision points.
//! - Enable `metrics` to increment the `risk_orchestrator_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod counter;
mod span;

pub use counter::*;
pub use span::*;

pub(crate) use span::debug_event;

// self
use crate::_prelude::*;

/// Flow kinds observed by the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RiskFlow {
	/// 3-D Secure authentication attempt.
	ThreeDSecure,
	/// Risk-profile fetch and collector activation.
	FraudCollection,
}
impl RiskFlow {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RiskFlow::ThreeDSecure => "three_d_secure",
			RiskFlow::FraudCollection => "fraud_collection",
		}
	}
}
impl Display for RiskFlow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an orchestrated flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure emitted to the host.
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
