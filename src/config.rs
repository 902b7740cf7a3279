//! Host configuration consumed by the orchestrator and the fraud collector.
//!
//! [`RiskConfig`] deserializes from the host's JSON configuration (every section defaults) and
//! can be assembled in code through [`RiskConfigBuilder`]. Both paths end in the same
//! validation.

// self
use crate::{_prelude::*, error::ConfigError};

/// Production API base used when none is configured.
pub const DEFAULT_API: &str = "https://api.recurly.com/js/v1/";

/// Hosted payment field (`fields.number.selector`, etc.).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedField {
	/// Field name (`number`, `month`, `cvv`, ...).
	pub name: String,
	/// CSS selector locating the field container.
	#[serde(default)]
	pub selector: Option<String>,
}

/// Kount data collector settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KountConfig {
	/// Opts into Kount device data collection.
	pub data_collector: bool,
	/// Selector for the form receiving the collector nodes; discovered when absent.
	pub form: Option<String>,
	/// User-defined fields forwarded with the Kount session (label to value).
	pub udf: BTreeMap<String, String>,
}

/// Litle/ThreatMetrix settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LitleConfig {
	/// Host-provided ThreatMetrix session id.
	pub session_id: Option<String>,
}

/// Braintree settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BraintreeConfig {
	/// Host-collected Braintree device data.
	pub device_data: Option<String>,
}

/// Fraud collection settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FraudConfig {
	/// Kount settings.
	pub kount: KountConfig,
	/// Litle settings.
	pub litle: LitleConfig,
	/// Braintree settings.
	pub braintree: BraintreeConfig,
}

/// Validated host configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskConfig {
	/// API base URL; always ends with `/` once validated.
	pub api: Url,
	/// Site public key sent with API requests.
	pub public_key: String,
	/// Hosted fields in configuration order.
	#[serde(default)]
	pub fields: Vec<HostedField>,
	/// Fraud collection settings.
	#[serde(default)]
	pub fraud: FraudConfig,
}
impl RiskConfig {
	/// Creates a builder for the given public key.
	pub fn builder(public_key: impl Into<String>) -> RiskConfigBuilder {
		RiskConfigBuilder::new(public_key)
	}

	/// Parses and validates a JSON configuration.
	pub fn from_json(json: &str) -> Result<Self> {
		let de = &mut serde_json::Deserializer::from_str(json);
		let builder: RiskConfigBuilder = serde_path_to_error::deserialize(de)
			.map_err(|source| Error::InvalidConfig { source })?;

		Ok(builder.build()?)
	}

	/// Whether Kount data collection is required.
	pub fn collects_kount_data(&self) -> bool {
		self.fraud.kount.data_collector
	}

	/// Non-empty field selectors, in configuration order.
	pub fn field_selectors(&self) -> Vec<String> {
		self.fields
			.iter()
			.filter_map(|field| field.selector.as_deref())
			.filter(|selector| !selector.trim().is_empty())
			.map(str::to_owned)
			.collect()
	}

	/// Resolves an API route such as `/risk/info` against the base URL.
	pub fn route(&self, route: &str) -> Result<Url, ConfigError> {
		self.api
			.join(route.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidRoute { route: route.to_owned(), source })
	}

	fn validated(mut self) -> Result<Self, ConfigError> {
		if self.public_key.trim().is_empty() {
			return Err(ConfigError::MissingPublicKey);
		}
		if !matches!(self.api.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme { url: self.api.to_string() });
		}
		if self.api.cannot_be_a_base() {
			return Err(ConfigError::CannotBeABase { url: self.api.to_string() });
		}
		if !self.api.path().ends_with('/') {
			let path = format!("{}/", self.api.path());

			self.api.set_path(&path);
		}

		Ok(self)
	}
}

/// Builder for [`RiskConfig`] values; also the raw shape of the host's JSON configuration.
#[derive(Debug, Deserialize)]
pub struct RiskConfigBuilder {
	/// Public key.
	pub public_key: String,
	/// Raw API base, parsed during [`build`](RiskConfigBuilder::build).
	#[serde(default)]
	pub api: Option<String>,
	/// Hosted fields in insertion order.
	#[serde(default)]
	pub fields: Vec<HostedField>,
	/// Fraud settings.
	#[serde(default)]
	pub fraud: FraudConfig,
}
impl RiskConfigBuilder {
	/// Creates a builder seeded with the public key.
	pub fn new(public_key: impl Into<String>) -> Self {
		Self { public_key: public_key.into(), api: None, fields: Vec::new(), fraud: FraudConfig::default() }
	}

	/// Overrides the API base URL.
	pub fn api(mut self, api: impl Into<String>) -> Self {
		self.api = Some(api.into());

		self
	}

	/// Adds a hosted field with its selector.
	pub fn field(mut self, name: impl Into<String>, selector: impl Into<String>) -> Self {
		self.fields.push(HostedField { name: name.into(), selector: Some(selector.into()) });

		self
	}

	/// Toggles Kount data collection.
	pub fn kount_data_collector(mut self, enabled: bool) -> Self {
		self.fraud.kount.data_collector = enabled;

		self
	}

	/// Sets the selector of the form receiving Kount nodes.
	pub fn kount_form(mut self, selector: impl Into<String>) -> Self {
		self.fraud.kount.form = Some(selector.into());

		self
	}

	/// Adds a Kount user-defined field.
	pub fn kount_udf(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
		self.fraud.kount.udf.insert(label.into(), value.into());

		self
	}

	/// Sets the Litle/ThreatMetrix session id.
	pub fn litle_session_id(mut self, session_id: impl Into<String>) -> Self {
		self.fraud.litle.session_id = Some(session_id.into());

		self
	}

	/// Sets the Braintree device data.
	pub fn braintree_device_data(mut self, device_data: impl Into<String>) -> Self {
		self.fraud.braintree.device_data = Some(device_data.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<RiskConfig, ConfigError> {
		let api = Url::parse(self.api.as_deref().unwrap_or(DEFAULT_API))
			.map_err(|source| ConfigError::InvalidApiUrl { source })?;

		RiskConfig { api, public_key: self.public_key, fields: self.fields, fraud: self.fraud }
			.validated()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn builder_normalizes_api_base() {
		let config = RiskConfig::builder("ewr1-key")
			.api("https://api.example.com/js/v1")
			.build()
			.expect("Config should build.");

		assert_eq!(config.api.as_str(), "https://api.example.com/js/v1/");
		assert_eq!(
			config.route("/risk/info").expect("Route should join.").as_str(),
			"https://api.example.com/js/v1/risk/info"
		);
	}

	#[test]
	fn builder_rejects_invalid_input() {
		assert_eq!(RiskConfig::builder(" ").build(), Err(ConfigError::MissingPublicKey));
		assert!(matches!(
			RiskConfig::builder("key").api("ftp://example.com/").build(),
			Err(ConfigError::UnsupportedScheme { .. })
		));
		assert!(matches!(
			RiskConfig::builder("key").api("not a url").build(),
			Err(ConfigError::InvalidApiUrl { .. })
		));
	}

	#[test]
	fn json_sections_default() {
		let config = RiskConfig::from_json(
			r##"{
				"public_key": "ewr1-key",
				"fields": [
					{ "name": "number", "selector": "#number" },
					{ "name": "month" },
					{ "name": "cvv", "selector": "" },
					{ "name": "year", "selector": "#year" }
				],
				"fraud": { "kount": { "data_collector": true } }
			}"##,
		)
		.expect("Config JSON should parse.");

		assert_eq!(config.api.as_str(), DEFAULT_API);
		assert!(config.collects_kount_data());
		assert_eq!(config.fraud.litle, LitleConfig::default());
		assert_eq!(config.field_selectors(), vec!["#number".to_owned(), "#year".to_owned()]);
	}

	#[test]
	fn json_errors_carry_paths() {
		let err = RiskConfig::from_json(r#"{ "public_key": "k", "fraud": { "kount": { "data_collector": "yes" } } }"#)
			.expect_err("Invalid flag type should fail.");

		assert!(err.to_string().contains("fraud.kount.data_collector"));
	}
}
