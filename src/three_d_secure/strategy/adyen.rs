// self
use crate::{
	_prelude::*,
	dom::NodeRef,
	error::RiskError,
	obs::debug_event,
	page::Page,
	three_d_secure::{
		ActionToken, Relay,
		strategy::{AuthMethod, FramePlan, MethodPlan, StrategyCore, VendorStrategy},
	},
	vendor::{Vendor, WidgetRequest},
};

/// Adyen checkout SDK.
pub const LIBRARY_URL: &str = "https://checkoutshopper-live.adyen.com/checkoutshopper/sdk/2.2.0/adyen.js";

const FINGERPRINT_TOKEN: &str = "threeds2.fingerprintToken";
const CHALLENGE_TOKEN: &str = "threeds2.challengeToken";
const UNDETERMINED: &str = "We could not determine an authentication method";

/// Adyen 3DS2 fingerprint/challenge widgets with a 3DS1 redirect fallback.
#[derive(Clone, Debug)]
pub struct AdyenStrategy(Arc<StrategyCore>);
impl AdyenStrategy {
	pub(crate) fn new(page: &Page, token: Arc<ActionToken>, relay: Arc<Relay>) -> Self {
		let selection = select(&token);
		let core = StrategyCore::new(Vendor::Adyen, page, token, relay, selection);

		if core.needs_sdk() {
			load_library(&core);
		} else if core.is_determined() {
			core.on_ready();
		}

		Self(core)
	}

	/// Redirect parameters derived from the token, if any.
	pub fn redirect_params(&self) -> Option<RedirectParams> {
		RedirectParams::from_params(self.0.token().params())
	}
}
impl VendorStrategy for AdyenStrategy {
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

fn load_library(core: &Arc<StrategyCore>) {
	let page = core.page();

	if page.runtime.widget_factory(Vendor::Adyen).is_some() {
		return core.on_ready();
	}

	let url = match Url::parse(LIBRARY_URL) {
		Ok(url) => url,
		Err(e) => return core.vendor_load_failed(e.to_string()),
	};
	let strategy = Arc::downgrade(core);

	debug_event!(url = LIBRARY_URL, "loading Adyen library");
	page.loader.load(
		&url,
		Box::new(move |outcome| {
			let Some(core) = strategy.upgrade() else {
				return;
			};

			if core.is_removed() {
				debug_event!("dropping Adyen library outcome after remove");

				return;
			}

			match outcome {
				Ok(()) if core.page().runtime.widget_factory(Vendor::Adyen).is_some() =>
					core.on_ready(),
				Ok(()) => core.vendor_load_failed("Adyen SDK failed to load."),
				Err(e) => core.vendor_load_failed(e.cause),
			}
		}),
	);
}

/// Picks fingerprint, then challenge, then the redirect fallback.
pub(crate) fn select(token: &ActionToken) -> Result<(AuthMethod, MethodPlan), RiskError> {
	if let Some(fingerprint) = token.authentication(FINGERPRINT_TOKEN) {
		return Ok((
			AuthMethod::Fingerprint,
			widget("threeDS2DeviceFingerprint", [("fingerprintToken", fingerprint)]),
		));
	}
	if let Some(challenge) = token.authentication(CHALLENGE_TOKEN) {
		return Ok((
			AuthMethod::Challenge,
			widget("threeDS2Challenge", [("challengeToken", challenge), ("size", "05")]),
		));
	}
	if let Some(redirect) = RedirectParams::from_params(token.params()) {
		let mut payload = BTreeMap::from([(
			"three_d_secure_action_token_id".to_owned(),
			token.id.clone(),
		)]);

		redirect.extend_payload(&mut payload);

		return Ok((
			AuthMethod::Fallback,
			MethodPlan::Frame(FramePlan {
				path: "/three_d_secure/start".into(),
				payload,
				default_event_name: "adyen-3ds-challenge".into(),
			}),
		));
	}

	Err(RiskError::determination(UNDETERMINED))
}

fn widget<const N: usize>(component: &str, options: [(&str, &str); N]) -> MethodPlan {
	MethodPlan::Widget(WidgetRequest {
		component: component.to_owned(),
		options: options.into_iter().map(|(k, v)| (k.to_owned(), Value::from(v))).collect(),
	})
}

/// Normalized 3DS1 redirect parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectParams {
	/// Issuer redirect URL.
	pub redirect_url: String,
	/// Payer authentication request.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pa_req: Option<String>,
	/// Merchant data.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub md: Option<String>,
}
impl RedirectParams {
	/// Normalizes either redirect shape found in `three_d_secure.params`.
	///
	/// - `{ type: "redirect", url, data: { PaReq, MD } }`
	/// - `{ redirect: { url, data: { pa_req | PaReq, md | MD } } }`
	///
	/// Returns `None` unless a non-empty redirect URL is present.
	pub fn from_params(params: &Map<String, Value>) -> Option<Self> {
		let (url, data, pa_req_keys, md_keys) =
			if params.get("type").and_then(Value::as_str) == Some("redirect") {
				(params.get("url"), params.get("data"), &["PaReq"][..], &["MD"][..])
			} else {
				let redirect = params.get("redirect")?;

				(redirect.get("url"), redirect.get("data"), &["pa_req", "PaReq"][..], &["md", "MD"][..])
			};
		let redirect_url = non_empty(url)?;

		Some(Self {
			redirect_url: redirect_url.to_owned(),
			pa_req: first_non_empty(data, pa_req_keys),
			md: first_non_empty(data, md_keys),
		})
	}

	fn extend_payload(self, payload: &mut BTreeMap<String, String>) {
		payload.insert("redirect_url".into(), self.redirect_url);

		if let Some(pa_req) = self.pa_req {
			payload.insert("pa_req".into(), pa_req);
		}
		if let Some(md) = self.md {
			payload.insert("md".into(), md);
		}
	}
}

fn non_empty(value: Option<&Value>) -> Option<&str> {
	value.and_then(Value::as_str).filter(|value| !value.is_empty())
}

fn first_non_empty(data: Option<&Value>, keys: &[&str]) -> Option<String> {
	let data = data?;

	keys.iter().find_map(|key| non_empty(data.get(*key))).map(str::to_owned)
}
