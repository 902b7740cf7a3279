// self
use crate::{
	_prelude::*,
	dom::NodeRef,
	error::RiskError,
	page::Page,
	three_d_secure::{
		ActionToken, Relay,
		strategy::{AuthMethod, FramePlan, MethodPlan, StrategyCore, VendorStrategy},
	},
	vendor::Vendor,
};

/// Sandbox gateway: renders the API's mock challenge page in a frame.
///
/// No vendor library is involved, so the strategy is ready as soon as it exists (unless the
/// token carries no id).
#[derive(Clone, Debug)]
pub struct TestStrategy(Arc<StrategyCore>);
impl TestStrategy {
	pub(crate) fn new(page: &Page, token: Arc<ActionToken>, relay: Arc<Relay>) -> Self {
		let selection = select(&token);
		let core = StrategyCore::new(Vendor::Test, page, token, relay, selection);

		if core.is_determined() {
			core.on_ready();
		}

		Self(core)
	}
}
impl VendorStrategy for TestStrategy {
	fn vendor(&self) -> Vendor {
		self.0.vendor()
	}

	fn method(&self) -> Option<AuthMethod> {
		self.0.method()
	}

	fn is_ready(&self) -> bool {
		self.0.is_ready()
	}

	fn attach(&self, container: &NodeRef) -> Result<()> {
		self.0.attach(container)
	}

	fn on_ready(&self) {
		self.0.on_ready()
	}

	fn remove(&self) {
		self.0.remove()
	}
}

fn select(token: &ActionToken) -> Result<(AuthMethod, MethodPlan), RiskError> {
	if token.id.is_empty() {
		return Err(RiskError::determination("Action token id is missing"));
	}

	Ok((
		AuthMethod::Challenge,
		MethodPlan::Frame(FramePlan {
			path: "/three_d_secure/mock".into(),
			payload: BTreeMap::from([(
				"three_d_secure_action_token_id".to_owned(),
				token.id.clone(),
			)]),
			default_event_name: "test-3ds-challenge".into(),
		}),
	))
}
