// self
use super::Inner;
use crate::{
	_prelude::*,
	dom::{LoadStatus, NodeRef, build_element},
	error::{ErrorKind, RiskError},
	event::FraudEvent,
	fraud::{
		Processor, RiskProfile,
		profile::{KountParams, decode_params},
	},
	obs::debug_event,
};

const SDK_LOAD_FAILED: &str = "Kount SDK failed to load.";

impl Inner {
	pub(super) fn activate_kount(self: &Arc<Self>, profile: &RiskProfile) {
		let params = match decode_params::<KountParams>(profile) {
			Ok(params) => params,
			Err(cause) => return self.profile_failed(Processor::Kount, cause),
		};
		let Some(form) = self.kount_form() else {
			let selectors = self.config.field_selectors();

			self.emit(FraudEvent::Error(
				RiskError::new(ErrorKind::FraudDataCollectorMissingForm).with("selectors", selectors),
			));

			return;
		};

		if let Err(e) = self.mount_kount(&form, &params) {
			return self.profile_failed(Processor::Kount, e.to_string());
		}

		self.emit(FraudEvent::Ready(Processor::Kount));
	}

	fn mount_kount(self: &Arc<Self>, form: &NodeRef, params: &KountParams) -> Result<()> {
		let document = self.document.as_ref();
		let input = build_element(document, "input", &[
			("type", "hidden"),
			("data-recurly", "fraud_session_id"),
			("value", &params.session_id),
		])?;
		let script = build_element(document, "script", &[("src", params.script_url.as_str())])?;
		let marker = build_element(document, "div", &[("class", "kaxsdc"), ("data-event", "load")])?;
		let collector = Arc::downgrade(self);

		document.on_load(script, Box::new(move |status| initialize_sdk(collector, status)))?;

		for node in [input, script, marker] {
			self.tracker.append(form, node)?;
		}

		Ok(())
	}

	/// Configured form first, then the cached or discovered hosted-field form.
	fn kount_form(&self) -> Option<NodeRef> {
		if let Some(form) =
			self.config.fraud.kount.form.as_deref().and_then(|sel| NodeRef::select(&self.document, sel))
		{
			return Some(form);
		}
		if let Some(form) = self.form.lock().clone() {
			return Some(form);
		}

		let form = self.config.field_selectors().iter().find_map(|selector| {
			NodeRef::select(&self.document, selector).and_then(|field| field.closest("form"))
		})?;

		*self.form.lock() = Some(form.clone());

		Some(form)
	}
}

fn initialize_sdk(collector: Weak<Inner>, status: LoadStatus) {
	let Some(collector) = collector.upgrade() else {
		return;
	};

	if collector.is_destroyed() {
		debug_event!("ignoring Kount script load after destroy");

		return;
	}

	match (status, collector.runtime.data_collector()) {
		(LoadStatus::Loaded, Some(sdk)) => sdk.auto_load_events(),
		_ => collector.emit(FraudEvent::Error(RiskError::collector_request(SDK_LOAD_FAILED))),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		dom::Document,
		fraud::tests::{Harness, profile},
	};

	fn kount_profile() -> RiskProfile {
		profile("kount", serde_json::json!({
			"session_id": "S",
			"script_url": "https://kount.example/collect.js"
		}))
	}

	#[test]
	fn configured_form_wins_over_discovery() {
		let harness = Harness::with_config(|builder| {
			builder.kount_data_collector(true).kount_form("#checkout").field("number", "#number")
		});
		let document = &harness.memory;
		let checkout = document.create_element("form");
		let other = document.create_element("form");
		let number = document.create_element("div");

		document.set_attribute(checkout, "id", "checkout").expect("Attribute should set.");
		document.set_attribute(number, "id", "number").expect("Attribute should set.");
		document.append_child(document.body(), checkout).expect("Form should attach.");
		document.append_child(document.body(), other).expect("Form should attach.");
		document.append_child(other, number).expect("Field should attach.");
		harness.activate(vec![kount_profile()]);

		assert_eq!(document.children(checkout).len(), 3);
		assert_eq!(document.children(other).len(), 1);
		assert_eq!(harness.collector.tracked_nodes(), 3);
	}

	#[test]
	fn script_failure_reports_sdk_error() {
		let harness = Harness::with_form();

		harness.activate(vec![kount_profile()]);
		harness.events.drain();

		assert_eq!(
			harness
				.memory
				.complete_script("https://kount.example/collect.js", LoadStatus::Failed("blocked".into())),
			1
		);

		let events = harness.events.drain();

		assert_eq!(events, vec![FraudEvent::Error(RiskError::collector_request(SDK_LOAD_FAILED))]);
	}

	#[test]
	fn script_load_starts_the_sdk() {
		let harness = Harness::with_form();

		harness.runtime.install_data_collector();
		harness.activate(vec![kount_profile()]);
		harness.memory.complete_script("https://kount.example/collect.js", LoadStatus::Loaded);

		assert_eq!(harness.runtime.auto_load_calls(), 1);
		assert_eq!(harness.events.drain(), vec![FraudEvent::Ready(Processor::Kount)]);
	}
}
