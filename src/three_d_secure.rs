//! 3-D Secure authentication orchestrator.
//!
//! [`ThreeDSecure`] owns one [`ActionToken`], builds the matching [`Strategy`] when it is
//! constructed (which may start loading the vendor library), and relays the strategy's
//! `ready`, `done`, and `error` events to the host. It never touches the DOM itself.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use risk_orchestrator::{
//! 	dom::NodeRef,
//! 	event::{EventLog, ThreeDSecureEvent},
//! 	page::Page,
//! 	three_d_secure::ThreeDSecure,
//! };
//!
//! fn authenticate(page: &Page, token_json: &str, container: &NodeRef) -> risk_orchestrator::error::Result<()> {
//! 	let events = Arc::new(EventLog::<ThreeDSecureEvent>::new());
//! 	let three_d_secure = ThreeDSecure::from_json(page, token_json, events.clone())?;
//!
//! 	three_d_secure.attach(container)?;
//!
//! 	Ok(())
//! }
//! ```

pub mod strategy;
mod token;

pub use strategy::{AuthMethod, MethodPlan, Strategy, VendorStrategy};
pub use token::{ActionToken, Gateway, ThreeDSecureParams};

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	dom::NodeRef,
	error::{ErrorKind, RiskError},
	event::{EventSink, ThreeDSecureEvent},
	obs::{self, FlowOutcome, FlowSpan, RiskFlow, debug_event},
	page::Page,
	vendor::Vendor,
};

/// Orchestrates one authentication attempt.
pub struct ThreeDSecure {
	token: Arc<ActionToken>,
	relay: Arc<Relay>,
	strategy: Mutex<Option<Strategy>>,
}
impl ThreeDSecure {
	/// Selects the strategy for `token` and starts its readiness work.
	pub fn new(page: &Page, token: ActionToken, sink: Arc<dyn EventSink<ThreeDSecureEvent>>) -> Self {
		let token = Arc::new(token);
		let relay = Arc::new(Relay::new(sink));
		let _span = FlowSpan::new(RiskFlow::ThreeDSecure, "select_strategy").entered();
		let strategy = Strategy::new(page, token.clone(), relay.clone());

		debug_event!(vendor = %token.vendor(), method = ?strategy.method(), "strategy selected");

		Self { token, relay, strategy: Mutex::new(Some(strategy)) }
	}

	/// Parses the token JSON, then behaves like [`ThreeDSecure::new`].
	pub fn from_json(
		page: &Page,
		json: &str,
		sink: Arc<dyn EventSink<ThreeDSecureEvent>>,
	) -> Result<Self> {
		Ok(Self::new(page, ActionToken::from_json(json)?, sink))
	}

	/// Token driving this attempt.
	pub fn action_token(&self) -> &ActionToken {
		&self.token
	}

	/// Vendor selected by `gateway.type`.
	pub fn vendor(&self) -> Vendor {
		self.token.vendor()
	}

	/// Method selected from the token, or `None` when none could be determined (or after
	/// removal).
	pub fn method(&self) -> Option<AuthMethod> {
		self.strategy.lock().as_ref().and_then(|strategy| strategy.method())
	}

	/// Whether the strategy finished its readiness gate.
	pub fn is_ready(&self) -> bool {
		self.strategy.lock().as_ref().is_some_and(|strategy| strategy.is_ready())
	}

	/// Whether `done` or an error has already been emitted.
	pub fn is_terminal(&self) -> bool {
		self.relay.is_terminal()
	}

	/// Hands the container to the strategy.
	pub fn attach(&self, container: &NodeRef) -> Result<()> {
		let strategy = self.strategy.lock().clone().ok_or(Error::Removed)?;
		let _span = FlowSpan::new(RiskFlow::ThreeDSecure, "attach").entered();

		obs::record_flow_outcome(RiskFlow::ThreeDSecure, FlowOutcome::Attempt);

		strategy.attach(container)
	}

	/// Reports an error into this attempt, as if the strategy had raised it.
	pub fn error(&self, kind: ErrorKind, context: Map<String, Value>) {
		self.relay.error(RiskError { kind, context });
	}

	/// Tears the strategy down and releases it. Idempotent.
	pub fn remove(&self) {
		let strategy = self.strategy.lock().take();

		if let Some(strategy) = strategy {
			strategy.remove();
		}
	}
}
impl Debug for ThreeDSecure {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ThreeDSecure")
			.field("token", &self.token.id)
			.field("vendor", &self.vendor())
			.field("terminal", &self.is_terminal())
			.finish()
	}
}

/// Event relay shared by the orchestrator and its strategy.
///
/// Guarantees one terminal emission per attempt and silence after removal.
pub(crate) struct Relay {
	sink: Arc<dyn EventSink<ThreeDSecureEvent>>,
	terminal: AtomicBool,
	removed: AtomicBool,
}
impl Relay {
	fn new(sink: Arc<dyn EventSink<ThreeDSecureEvent>>) -> Self {
		Self { sink, terminal: AtomicBool::new(false), removed: AtomicBool::new(false) }
	}

	pub(crate) fn ready(&self) {
		if !self.removed.load(Ordering::SeqCst) {
			self.sink.emit(ThreeDSecureEvent::Ready);
		}
	}

	pub(crate) fn done(&self, results: Value) {
		if self.claim_terminal() {
			obs::record_flow_outcome(RiskFlow::ThreeDSecure, FlowOutcome::Success);
			self.sink.emit(ThreeDSecureEvent::Done(results));
		}
	}

	pub(crate) fn error(&self, error: RiskError) {
		if self.claim_terminal() {
			debug_event!(kind = error.kind.as_str(), "authentication failed");
			obs::record_flow_outcome(RiskFlow::ThreeDSecure, FlowOutcome::Failure);
			self.sink.emit(ThreeDSecureEvent::Error(error));
		}
	}

	pub(crate) fn remove(&self) {
		self.removed.store(true, Ordering::SeqCst);
	}

	pub(crate) fn is_terminal(&self) -> bool {
		self.terminal.load(Ordering::SeqCst)
	}

	fn claim_terminal(&self) -> bool {
		if self.removed.load(Ordering::SeqCst) {
			debug_event!("dropping completion after remove");

			return false;
		}

		!self.terminal.swap(true, Ordering::SeqCst)
	}
}
