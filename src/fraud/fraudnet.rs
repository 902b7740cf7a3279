// self
use super::Inner;
use crate::{
	_prelude::*,
	dom::{DomError, NodeRef, build_element},
	event::FraudEvent,
	fraud::{
		Processor, RiskProfile,
		profile::{FraudnetParams, decode_params},
	},
};

/// `fncls` marker FraudNet uses to find its parameter blob.
pub const FRAUDNET_PARAMS_ID: &str = "fnparams-dede7cc5-15fd-4c75-a9f4-36c430ee3a99";

impl Inner {
	pub(super) fn activate_fraudnet(&self, profile: &RiskProfile) {
		let params = match decode_params::<FraudnetParams>(profile) {
			Ok(params) => params,
			Err(cause) => return self.profile_failed(Processor::Fraudnet, cause),
		};

		if let Err(e) = self.mount_fraudnet(&params) {
			return self.profile_failed(Processor::Fraudnet, e.to_string());
		}

		self.emit(FraudEvent::Ready(Processor::Fraudnet));
	}

	// The vendor script runs inside the hidden frame's document, never the host's.
	fn mount_fraudnet(&self, params: &FraudnetParams) -> Result<()> {
		let body = NodeRef::new(self.document.clone(), self.document.body());
		let iframe = build_element(self.document.as_ref(), "iframe", &[
			("id", "fraudnet-iframe"),
			("style", "display:none;"),
		])?;
		let iframe = self.tracker.append(&body, iframe)?;
		let frame = self
			.document
			.content_document(iframe.id())
			.ok_or(DomError::UnknownNode { node: iframe.id() })?;
		let blob = serde_json::json!({
			"f": params.session_id,
			"s": params.page_identifier,
			"sandbox": params.sandbox,
		});
		let blob_node = build_element(frame.as_ref(), "script", &[
			("id", "fraudnet-params"),
			("type", "application/json"),
			("fncls", FRAUDNET_PARAMS_ID),
		])?;

		frame.set_text(blob_node, &blob.to_string())?;
		frame.append_child(frame.head(), blob_node)?;

		let script = build_element(frame.as_ref(), "script", &[
			("id", "fraudnet-script"),
			("src", params.script_url.as_str()),
		])?;

		frame.append_child(frame.head(), script)?;

		Ok(())
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

	#[test]
	fn blob_and_script_live_in_the_frame_document() {
		let harness = Harness::with_config(|builder| builder);

		harness.activate(vec![profile("fraudnet", serde_json::json!({
			"session_id": "F",
			"page_identifier": "P",
			"sandbox": true,
			"script_url": "https://fraudnet.example/fb.js"
		}))]);

		let memory = &harness.memory;
		let iframes = memory.query_selector_all("iframe#fraudnet-iframe");

		assert_eq!(iframes.len(), 1);
		assert_eq!(memory.parent(iframes[0]), Some(memory.body()));
		assert_eq!(memory.attribute(iframes[0], "style").as_deref(), Some("display:none;"));
		assert!(memory.query_selector("script").is_none());

		let frame = memory.frame_document(iframes[0]).expect("Iframe should own a document.");
		let blob = frame
			.query_selector(&format!("script[fncls={FRAUDNET_PARAMS_ID}]"))
			.expect("Parameter blob should exist.");
		let payload: Value = serde_json::from_str(&frame.text(blob).unwrap_or_default())
			.expect("Blob should hold JSON.");

		assert_eq!(payload, serde_json::json!({ "f": "F", "s": "P", "sandbox": true }));
		assert_eq!(frame.attribute(blob, "type").as_deref(), Some("application/json"));

		let script = frame.query_selector("script#fraudnet-script").expect("Script should exist.");

		assert_eq!(frame.attribute(script, "src").as_deref(), Some("https://fraudnet.example/fb.js"));
		assert_eq!(frame.parent(script), Some(frame.head()));
		assert_eq!(harness.events.drain(), vec![FraudEvent::Ready(Processor::Fraudnet)]);
	}

	#[test]
	fn missing_script_url_is_reported_per_profile() {
		let harness = Harness::with_config(|builder| builder);

		harness.activate(vec![
			profile("fraudnet", serde_json::json!({ "session_id": "F" })),
			profile("fraudnet", serde_json::json!({
				"session_id": "G",
				"script_url": "https://fraudnet.example/fb.js"
			})),
		]);

		let events = harness.events.drain();

		assert_eq!(events.len(), 2);
		assert!(matches!(
			&events[0],
			FraudEvent::Error(error) if error.context_value("processor") == Some(&Value::from("fraudnet"))
		));
		assert_eq!(events[1], FraudEvent::Ready(Processor::Fraudnet));
		assert_eq!(harness.memory.connected_len(), 1);
	}
}
