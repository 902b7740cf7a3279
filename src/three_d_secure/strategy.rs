//! Vendor strategy framework.
//!
//! Every vendor shares one lifecycle, implemented once in [`StrategyCore`]:
//!
//! - readiness gating with a single replace-on-set slot for the requested method;
//! - a tracked mount node inside the host container;
//! - widget/frame handles that are released on [`VendorStrategy::remove`];
//! - a removed flag that turns late completions into no-ops.
//!
//! Vendors only decide which [`MethodPlan`] to run and whether their SDK must load first.

mod adyen;
mod sandbox;

pub use adyen::{AdyenStrategy, LIBRARY_URL as ADYEN_LIBRARY_URL, RedirectParams};
pub use sandbox::TestStrategy;

// self
use crate::{
	_prelude::*,
	dom::{NodeRef, NodeTracker, build_element},
	error::RiskError,
	frame::{FrameHandle, FrameOptions, FrameType},
	obs::debug_event,
	page::Page,
	three_d_secure::{ActionToken, Relay},
	vendor::{Outcome, OutcomeReporter, Vendor, VendorError, WidgetHandle, WidgetRequest},
};

/// Authentication method chosen for an attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
	/// Silent device fingerprinting.
	Fingerprint,
	/// Interactive challenge.
	Challenge,
	/// Redirect flow inside a frame.
	Fallback,
}

/// Frame parameters for redirect-based methods.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramePlan {
	/// API route.
	pub path: String,
	/// Query payload.
	pub payload: BTreeMap<String, String>,
	/// Message name prefix.
	pub default_event_name: String,
}

/// Executable form of an [`AuthMethod`].
#[derive(Clone, Debug, PartialEq)]
pub enum MethodPlan {
	/// Mount a vendor widget.
	Widget(WidgetRequest),
	/// Open a redirect frame.
	Frame(FramePlan),
}
impl MethodPlan {
	/// Whether running the plan requires the vendor SDK.
	pub fn needs_sdk(&self) -> bool {
		matches!(self, MethodPlan::Widget(_))
	}
}

/// Shared contract of every vendor strategy.
pub trait VendorStrategy {
	/// Vendor served by the strategy.
	fn vendor(&self) -> Vendor;

	/// Method selected from the action token, if any.
	fn method(&self) -> Option<AuthMethod>;

	/// Whether the readiness gate has opened.
	fn is_ready(&self) -> bool;

	/// Mounts into `container` and schedules the selected method.
	fn attach(&self, container: &NodeRef) -> Result<()>;

	/// Opens the readiness gate, emitting `ready` once and running the pending method.
	fn on_ready(&self);

	/// Tears down every frame, widget, and node the strategy created. Idempotent.
	fn remove(&self);
}

/// Closed set of strategies, selected by the action token's `gateway.type`.
#[derive(Clone, Debug)]
pub enum Strategy {
	/// Adyen 3DS2 with a 3DS1 redirect fallback.
	Adyen(AdyenStrategy),
	/// Sandbox mock challenge.
	Test(TestStrategy),
}
impl Strategy {
	pub(crate) fn new(page: &Page, token: Arc<ActionToken>, relay: Arc<Relay>) -> Self {
		match token.vendor() {
			Vendor::Adyen => Strategy::Adyen(AdyenStrategy::new(page, token, relay)),
			Vendor::Test => Strategy::Test(TestStrategy::new(page, token, relay)),
		}
	}

	fn inner(&self) -> &dyn VendorStrategy {
		match self {
			Strategy::Adyen(strategy) => strategy,
			Strategy::Test(strategy) => strategy,
		}
	}
}
impl VendorStrategy for Strategy {
	fn vendor(&self) -> Vendor {
		self.inner().vendor()
	}

	fn method(&self) -> Option<AuthMethod> {
		self.inner().method()
	}

	fn is_ready(&self) -> bool {
		self.inner().is_ready()
	}

	fn attach(&self, container: &NodeRef) -> Result<()> {
		self.inner().attach(container)
	}

	fn on_ready(&self) {
		self.inner().on_ready()
	}

	fn remove(&self) {
		self.inner().remove()
	}
}

/// Readiness gate plus single-slot holder for the method requested before readiness.
#[derive(Debug, Default)]
pub struct ReadySlot {
	ready: bool,
	pending: Option<MethodPlan>,
}
impl ReadySlot {
	/// Whether the gate is open.
	pub fn is_ready(&self) -> bool {
		self.ready
	}

	/// Returns the plan when it can run now; otherwise parks it, replacing any previous plan.
	pub fn submit(&mut self, plan: MethodPlan) -> Option<MethodPlan> {
		if self.ready {
			return Some(plan);
		}

		self.pending = Some(plan);

		None
	}

	/// Opens the gate. Returns `None` when it was already open, otherwise the parked plan.
	pub fn open(&mut self) -> Option<Option<MethodPlan>> {
		if self.ready {
			return None;
		}

		self.ready = true;

		Some(self.pending.take())
	}

	/// Drops the parked plan.
	pub fn clear(&mut self) {
		self.pending = None;
	}
}

#[derive(Default)]
struct CoreState {
	slot: ReadySlot,
	attached: bool,
	removed: bool,
	mount: Option<NodeRef>,
	widget: Option<Box<dyn WidgetHandle>>,
	frame: Option<Box<dyn FrameHandle>>,
}

/// Lifecycle shared by all vendors.
pub(crate) struct StrategyCore {
	vendor: Vendor,
	page: Page,
	token: Arc<ActionToken>,
	relay: Arc<Relay>,
	selection: Result<(AuthMethod, MethodPlan), RiskError>,
	tracker: NodeTracker,
	state: Mutex<CoreState>,
}
impl StrategyCore {
	pub(crate) fn new(
		vendor: Vendor,
		page: &Page,
		token: Arc<ActionToken>,
		relay: Arc<Relay>,
		selection: Result<(AuthMethod, MethodPlan), RiskError>,
	) -> Arc<Self> {
		Arc::new(Self {
			vendor,
			page: page.clone(),
			token,
			relay,
			selection,
			tracker: NodeTracker::default(),
			state: Mutex::new(CoreState::default()),
		})
	}

	pub(crate) fn page(&self) -> &Page {
		&self.page
	}

	pub(crate) fn vendor(&self) -> Vendor {
		self.vendor
	}

	pub(crate) fn method(&self) -> Option<AuthMethod> {
		self.selection.as_ref().ok().map(|(method, _)| *method)
	}

	/// Whether a method could be selected from the token.
	pub(crate) fn is_determined(&self) -> bool {
		self.selection.is_ok()
	}

	pub(crate) fn needs_sdk(&self) -> bool {
		self.selection.as_ref().is_ok_and(|(_, plan)| plan.needs_sdk())
	}

	pub(crate) fn is_ready(&self) -> bool {
		self.state.lock().slot.is_ready()
	}

	pub(crate) fn is_removed(&self) -> bool {
		self.state.lock().removed
	}

	pub(crate) fn attach(self: &Arc<Self>, container: &NodeRef) -> Result<()> {
		if self.is_removed() {
			return Err(Error::Removed);
		}
		if container.tag_name().is_none() || !container.is_connected() {
			return Err(Error::InvalidContainer);
		}

		{
			let mut state = self.state.lock();

			if state.removed {
				return Err(Error::Removed);
			}
			if state.attached {
				return Err(Error::AlreadyAttached);
			}

			state.attached = true;
		}

		let plan = match &self.selection {
			Ok((_, plan)) => plan.clone(),
			Err(error) => {
				self.relay.error(error.clone());

				return Ok(());
			},
		};
		let mount =
			build_element(container.document().as_ref(), "div", &[("style", "height:100%;")])?;
		let mount = self.tracker.append(container, mount)?;
		let runnable = {
			let mut state = self.state.lock();

			state.mount = Some(mount);
			state.slot.submit(plan)
		};

		if let Some(plan) = runnable {
			self.execute(plan);
		}

		Ok(())
	}

	pub(crate) fn on_ready(self: &Arc<Self>) {
		let opened = {
			let mut state = self.state.lock();

			if state.removed {
				return;
			}

			state.slot.open()
		};
		let Some(pending) = opened else {
			return;
		};

		// An attempt that already ended drops its parked plan.
		if self.relay.is_terminal() {
			debug_event!("skipping readiness after a terminal event");

			return;
		}

		self.relay.ready();

		if let Some(plan) = pending {
			self.execute(plan);
		}
	}

	pub(crate) fn remove(&self) {
		let (widget, frame) = {
			let mut state = self.state.lock();

			state.removed = true;
			state.slot.clear();
			state.mount = None;

			(state.widget.take(), state.frame.take())
		};

		self.relay.remove();

		if let Some(mut frame) = frame {
			frame.destroy();
		}
		if let Some(mut widget) = widget {
			widget.unmount();
		}

		self.tracker.release();
	}

	/// Reports a vendor SDK that failed to load or left no global behind.
	pub(crate) fn vendor_load_failed(&self, cause: impl Into<Value>) {
		self.relay.error(RiskError::vendor_load(self.vendor.display_name(), cause));
	}

	fn execute(self: &Arc<Self>, plan: MethodPlan) {
		if self.relay.is_terminal() {
			return;
		}

		let Some(mount) = self.state.lock().mount.clone() else {
			return;
		};

		match plan {
			MethodPlan::Widget(request) => self.mount_widget(request, &mount),
			MethodPlan::Frame(plan) => self.open_frame(plan, mount),
		}
	}

	fn mount_widget(self: &Arc<Self>, request: WidgetRequest, mount: &NodeRef) {
		let Some(factory) = self.page.runtime.widget_factory(self.vendor) else {
			return self.vendor_load_failed(format!("{} SDK failed to load.", self.vendor.display_name()));
		};

		match factory.mount(request, mount, self.reporter()) {
			Ok(widget) => self.keep_widget(widget),
			Err(VendorError { message }) => self.relay.error(RiskError::auth(message)),
		}
	}

	fn open_frame(self: &Arc<Self>, plan: FramePlan, mount: NodeRef) {
		let options = FrameOptions {
			kind: FrameType::Iframe,
			path: plan.path,
			payload: plan.payload,
			container: mount,
			default_event_name: plan.default_event_name,
		};

		match self.page.frames.open(options, self.reporter()) {
			Ok(frame) => self.keep_frame(frame),
			Err(e) => self.relay.error(RiskError::auth(e.to_string())),
		}
	}

	fn keep_widget(&self, mut widget: Box<dyn WidgetHandle>) {
		{
			let mut state = self.state.lock();

			if !state.removed {
				state.widget = Some(widget);

				return;
			}
		}

		widget.unmount();
	}

	fn keep_frame(&self, mut frame: Box<dyn FrameHandle>) {
		{
			let mut state = self.state.lock();

			if !state.removed {
				state.frame = Some(frame);

				return;
			}
		}

		frame.destroy();
	}

	fn reporter(&self) -> OutcomeReporter {
		let relay = self.relay.clone();

		OutcomeReporter::new(move |outcome| match outcome {
			Outcome::Done(results) => relay.done(results),
			Outcome::Failed(cause) => relay.error(RiskError::auth(cause)),
		})
	}

	pub(crate) fn token(&self) -> &ActionToken {
		&self.token
	}
}
impl Debug for StrategyCore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StrategyCore")
			.field("vendor", &self.vendor)
			.field("method", &self.method())
			.field("tracked", &self.tracker.len())
			.finish()
	}
}
