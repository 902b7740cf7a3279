// self
use crate::_prelude::*;

/// Fraud processor discriminator carried by a [`RiskProfile`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Processor {
	/// Kount device data collector.
	Kount,
	/// PayPal FraudNet.
	Fraudnet,
	/// Litle/Vantiv ThreatMetrix.
	LitleThreatMetrix,
	/// Braintree device data.
	Braintree,
	/// Processor this crate does not activate.
	Other(String),
}
impl Processor {
	/// Wire label.
	pub fn as_str(&self) -> &str {
		match self {
			Processor::Kount => "kount",
			Processor::Fraudnet => "fraudnet",
			Processor::LitleThreatMetrix => "litle_threat_metrix",
			Processor::Braintree => "braintree",
			Processor::Other(label) => label,
		}
	}
}
impl From<String> for Processor {
	fn from(label: String) -> Self {
		match label.as_str() {
			"kount" => Processor::Kount,
			"fraudnet" => Processor::Fraudnet,
			"litle_threat_metrix" => Processor::LitleThreatMetrix,
			"braintree" => Processor::Braintree,
			_ => Processor::Other(label),
		}
	}
}
impl From<Processor> for String {
	fn from(processor: Processor) -> Self {
		match processor {
			Processor::Other(label) => label,
			known => known.as_str().to_owned(),
		}
	}
}
impl Display for Processor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One server-selected fraud profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
	/// Processor to activate.
	pub processor: Processor,
	/// Processor-specific parameters.
	#[serde(default)]
	pub params: Map<String, Value>,
}
impl RiskProfile {
	/// Reads a string parameter.
	pub fn param_str(&self, key: &str) -> Option<&str> {
		self.params.get(key).and_then(Value::as_str)
	}
}

/// `/risk/info` response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskInfo {
	/// Profiles in activation order.
	#[serde(default)]
	pub profiles: Vec<RiskProfile>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KountParams {
	pub(crate) session_id: String,
	pub(crate) script_url: Url,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FraudnetParams {
	pub(crate) session_id: String,
	#[serde(default)]
	pub(crate) page_identifier: Option<String>,
	#[serde(default)]
	pub(crate) sandbox: bool,
	pub(crate) script_url: Url,
}

/// Decodes a profile's params into a typed shape, returning the path-annotated message on
/// failure.
pub(crate) fn decode_params<T>(profile: &RiskProfile) -> Result<T, String>
where
	T: for<'de> Deserialize<'de>,
{
	serde_path_to_error::deserialize(Value::Object(profile.params.clone()))
		.map_err(|e| format!("{} (at `{}`)", e.inner(), e.path()))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn processors_keep_unknown_labels() {
		let info: RiskInfo = serde_json::from_value(serde_json::json!({
			"profiles": [
				{ "processor": "litle_threat_metrix", "params": {} },
				{ "processor": "sift" }
			]
		}))
		.expect("Risk info should parse.");

		assert_eq!(info.profiles[0].processor, Processor::LitleThreatMetrix);
		assert_eq!(info.profiles[1].processor, Processor::Other("sift".into()));
		assert_eq!(
			serde_json::to_value(&info.profiles[1].processor).expect("Processor should serialize."),
			"sift"
		);
	}

	#[test]
	fn decode_reports_missing_fields() {
		let profile = RiskProfile {
			processor: Processor::Kount,
			params: serde_json::json!({ "session_id": "S" })
				.as_object()
				.cloned()
				.unwrap_or_default(),
		};
		let err = decode_params::<KountParams>(&profile).expect_err("script_url is required.");

		assert!(err.contains("script_url"));
	}
}
