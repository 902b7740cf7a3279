// self
use crate::{
	_prelude::*,
	config::FraudConfig,
	fraud::{Processor, RiskProfile},
};

/// Payment form values the session bundle reads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionData {
	/// Kount session id read back from the injected hidden input.
	#[serde(default)]
	pub fraud_session_id: Option<String>,
}
impl SubmissionData {
	/// Submission carrying a Kount session id.
	pub fn with_fraud_session_id(session_id: impl Into<String>) -> Self {
		Self { fraud_session_id: Some(session_id.into()) }
	}
}

/// Kount user-defined field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdfParam {
	/// Field label.
	pub label: String,
	/// Field value.
	pub value: String,
}

/// One entry of the outbound session-identifier bundle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudParam {
	/// Processor the session id belongs to.
	pub processor: Processor,
	/// Session identifier.
	pub session_id: String,
	/// Kount user-defined fields.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub udf: Option<Vec<UdfParam>>,
}

pub(crate) fn assemble(
	config: &FraudConfig,
	profiles: Option<&[RiskProfile]>,
	data: &SubmissionData,
) -> Vec<FraudParam> {
	let mut params = Vec::new();

	let kount_session =
		data.fraud_session_id.as_deref().filter(|id| config.kount.data_collector && !id.is_empty());

	if let Some(session_id) = kount_session {
		let udf = config
			.kount
			.udf
			.iter()
			.map(|(label, value)| UdfParam { label: label.clone(), value: value.clone() })
			.collect();

		params.push(FraudParam {
			processor: Processor::Kount,
			session_id: session_id.to_owned(),
			udf: Some(udf),
		});
	}
	if let Some(session_id) = non_empty(&config.litle.session_id) {
		params.push(FraudParam {
			processor: Processor::LitleThreatMetrix,
			session_id: session_id.to_owned(),
			udf: None,
		});
	}
	if let Some(device_data) = non_empty(&config.braintree.device_data) {
		params.push(FraudParam {
			processor: Processor::Braintree,
			session_id: device_data.to_owned(),
			udf: None,
		});
	}
	if let Some(session_id) = profiles
		.unwrap_or_default()
		.iter()
		.find(|profile| profile.processor == Processor::Fraudnet)
		.and_then(|profile| profile.param_str("session_id"))
	{
		params.push(FraudParam {
			processor: Processor::Fraudnet,
			session_id: session_id.to_owned(),
			udf: None,
		});
	}

	params
}

fn non_empty(value: &Option<String>) -> Option<&str> {
	value.as_deref().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn fraudnet(session_id: &str) -> RiskProfile {
		RiskProfile {
			processor: Processor::Fraudnet,
			params: Map::from_iter([("session_id".to_owned(), Value::from(session_id))]),
		}
	}

	#[test]
	fn bundle_follows_processor_order() {
		let mut config = FraudConfig::default();

		config.kount.data_collector = true;
		config.kount.udf.insert("b".into(), "2".into());
		config.kount.udf.insert("a".into(), "1".into());
		config.litle.session_id = Some("L".into());
		config.braintree.device_data = Some("D".into());

		let profiles = [fraudnet("F")];
		let params =
			assemble(&config, Some(&profiles), &SubmissionData::with_fraud_session_id("K"));
		let processors = params.iter().map(|p| p.processor.clone()).collect::<Vec<_>>();

		assert_eq!(processors, vec![
			Processor::Kount,
			Processor::LitleThreatMetrix,
			Processor::Braintree,
			Processor::Fraudnet,
		]);
		assert_eq!(
			params[0].udf.as_deref().map(|udf| udf.iter().map(|u| u.label.as_str()).collect::<Vec<_>>()),
			Some(vec!["a", "b"])
		);
		assert_eq!(params[3].session_id, "F");
	}

	#[test]
	fn kount_requires_collection_and_session_id() {
		let mut config = FraudConfig::default();

		assert!(assemble(&config, None, &SubmissionData::with_fraud_session_id("K")).is_empty());

		config.kount.data_collector = true;

		assert!(assemble(&config, None, &SubmissionData::default()).is_empty());
	}
}
