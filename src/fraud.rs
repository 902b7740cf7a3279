//! Fraud profile activation.
//!
//! [`FraudCollector`] fetches the server-selected risk profiles once per page, activates the
//! collectors they name (Kount inside the payment form, FraudNet inside an isolated hidden
//! frame), and assembles the session-identifier bundle sent with the payment token. Every node
//! it creates is tracked so [`FraudCollector::destroy`] can remove exactly what it added.

mod fraudnet;
mod kount;
mod params;
mod profile;

pub use fraudnet::FRAUDNET_PARAMS_ID;
pub use params::{FraudParam, SubmissionData, UdfParam};
pub use profile::{Processor, RiskInfo, RiskProfile};

// std
use std::sync::atomic::{AtomicBool, Ordering};
// crates.io
use async_lock::OnceCell;
// self
use crate::{
	_prelude::*,
	config::RiskConfig,
	dom::{Document, NodeRef, NodeTracker},
	error::RiskError,
	event::{EventSink, FraudEvent},
	http::{RequestError, RiskInfoClient},
	obs::{self, FlowOutcome, FlowSpan, RiskFlow, debug_event},
	page::Page,
	vendor::VendorRuntime,
};

const FETCH_CANCELLED: &str = "Risk info request was dropped before it completed.";

/// Collector lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectorState {
	/// Profiles have not been requested.
	Idle,
	/// The risk-info request is in flight.
	Fetching,
	/// Profiles were received and activated.
	Activated,
	/// The risk-info request failed; nothing was activated.
	FetchFailed,
}

/// Page-scoped fraud profile activator.
///
/// Cloning shares the same collector.
#[derive(Clone)]
pub struct FraudCollector(Arc<Inner>);
impl FraudCollector {
	/// Creates a collector that fetches profiles through `client`.
	pub fn new(
		page: &Page,
		client: Arc<dyn RiskInfoClient>,
		sink: Arc<dyn EventSink<FraudEvent>>,
	) -> Self {
		Self(Arc::new(Inner {
			config: page.config.clone(),
			document: page.document.clone(),
			runtime: page.runtime.clone(),
			client,
			sink,
			fetch: OnceCell::new(),
			state: RwLock::new(CollectorState::Idle),
			profiles: RwLock::new(None),
			tracker: NodeTracker::default(),
			form: Mutex::new(None),
			destroyed: AtomicBool::new(false),
		}))
	}

	/// Creates a collector backed by [`ReqwestRiskInfoClient`](crate::http::ReqwestRiskInfoClient).
	#[cfg(feature = "reqwest")]
	pub fn with_reqwest(page: &Page, sink: Arc<dyn EventSink<FraudEvent>>) -> Result<Self> {
		let client = crate::http::ReqwestRiskInfoClient::new(&page.config)?;

		Ok(Self::new(page, Arc::new(client), sink))
	}

	/// Fetches the risk profiles and activates them.
	///
	/// Only the first call issues a request; concurrent and later calls wait for it and return.
	/// The request is never re-issued: dropping the first call before it completes settles the
	/// collector as [`CollectorState::FetchFailed`].
	pub async fn collect_profiles(&self) {
		if !self.0.claim_fetch() {
			self.0.fetch.wait().await;

			return;
		}

		let mut guard = FetchGuard { inner: self.0.clone(), completed: false };

		self.0.clone().fetch_and_activate().await;
		guard.completed = true;
	}

	/// Current lifecycle state.
	pub fn state(&self) -> CollectorState {
		*self.0.state.read()
	}

	/// Profiles received from the server, in server order.
	pub fn profiles(&self) -> Option<Vec<RiskProfile>> {
		self.0.profiles.read().clone()
	}

	/// Assembles the session-identifier bundle for a payment submission.
	///
	/// Reads configuration and already-fetched profiles only.
	pub fn params(&self, data: &SubmissionData) -> Vec<FraudParam> {
		params::assemble(&self.0.config.fraud, self.0.profiles.read().as_deref(), data)
	}

	/// Number of nodes this collector currently tracks.
	pub fn tracked_nodes(&self) -> usize {
		self.0.tracker.len()
	}

	/// Detaches every node this collector attached, returning how many were still attached.
	///
	/// Safe to call repeatedly, and after the host removed some of the nodes itself.
	pub fn destroy(&self) -> usize {
		self.0.destroyed.store(true, Ordering::SeqCst);

		let released = self.0.tracker.release();

		debug_event!(released, "fraud collector destroyed");

		released
	}
}
impl Debug for FraudCollector {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FraudCollector")
			.field("state", &self.state())
			.field("tracked", &self.tracked_nodes())
			.finish()
	}
}

struct Inner {
	config: Arc<RiskConfig>,
	document: Arc<dyn Document>,
	runtime: Arc<dyn VendorRuntime>,
	client: Arc<dyn RiskInfoClient>,
	sink: Arc<dyn EventSink<FraudEvent>>,
	fetch: OnceCell<()>,
	state: RwLock<CollectorState>,
	profiles: RwLock<Option<Vec<RiskProfile>>>,
	tracker: NodeTracker,
	form: Mutex<Option<NodeRef>>,
	destroyed: AtomicBool,
}
impl Inner {
	async fn fetch_and_activate(self: Arc<Self>) {
		let span = FlowSpan::new(RiskFlow::FraudCollection, "collect_profiles");

		obs::record_flow_outcome(RiskFlow::FraudCollection, FlowOutcome::Attempt);

		match span.instrument(self.client.risk_info()).await {
			Ok(info) => {
				*self.profiles.write() = Some(info.profiles.clone());
				*self.state.write() = CollectorState::Activated;

				let _guard = span.entered();

				self.activate(&info.profiles);
				obs::record_flow_outcome(RiskFlow::FraudCollection, FlowOutcome::Success);
			},
			Err(e) => self.fetch_failed(e),
		}
	}

	/// Moves `Idle` to `Fetching`; only the caller that wins this may issue the request.
	fn claim_fetch(&self) -> bool {
		let mut state = self.state.write();

		if *state != CollectorState::Idle {
			return false;
		}

		*state = CollectorState::Fetching;

		true
	}

	fn fetch_failed(&self, e: RequestError) {
		*self.state.write() = CollectorState::FetchFailed;
		obs::record_flow_outcome(RiskFlow::FraudCollection, FlowOutcome::Failure);

		if self.config.collects_kount_data() {
			let error = serde_json::to_value(&e).unwrap_or_else(|_| Value::from(e.to_string()));

			self.emit(FraudEvent::Error(RiskError::collector_request(error)));
		} else {
			debug_event!(error = %e, "risk info request failed; no collector requires it");
		}
	}

	fn activate(self: &Arc<Self>, profiles: &[RiskProfile]) {
		if self.is_destroyed() {
			debug_event!("skipping profile activation after destroy");

			return;
		}

		for profile in profiles {
			match profile.processor {
				Processor::Kount if self.config.collects_kount_data() => self.activate_kount(profile),
				Processor::Fraudnet => self.activate_fraudnet(profile),
				_ => {
					debug_event!(processor = %profile.processor, "ignoring fraud profile");
				},
			}
		}
	}

	fn profile_failed(&self, processor: Processor, cause: impl Into<Value>) {
		self.emit(FraudEvent::Error(
			RiskError::collector_request(cause).with("processor", processor.as_str()),
		));
	}

	fn is_destroyed(&self) -> bool {
		self.destroyed.load(Ordering::SeqCst)
	}

	fn emit(&self, event: FraudEvent) {
		self.sink.emit(event);
	}
}

/// Settles the first fetch, releasing waiting callers even when the fetch was dropped midway.
struct FetchGuard {
	inner: Arc<Inner>,
	completed: bool,
}
impl Drop for FetchGuard {
	fn drop(&mut self) {
		if !self.completed {
			debug_event!("risk info request dropped before completion");
			self.inner.fetch_failed(RequestError::new(FETCH_CANCELLED));
		}

		let _ = self.inner.fetch.set_blocking(());
	}
}
