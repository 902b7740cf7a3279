// self
use crate::{_prelude::*, vendor::Vendor};

/// Server-issued authentication instruction for one payment attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionToken {
	/// Token id echoed back to the API by redirect frames.
	pub id: String,
	/// Gateway that issued the 3-D Secure requirement.
	pub gateway: Gateway,
	/// Vendor-specific 3-D Secure payload.
	pub three_d_secure: ThreeDSecureParams,
}
impl ActionToken {
	/// Parses a token, rejecting unknown gateway types.
	pub fn from_json(json: &str) -> Result<Self> {
		let de = &mut serde_json::Deserializer::from_str(json);

		serde_path_to_error::deserialize(de).map_err(|source| Error::InvalidActionToken { source })
	}

	/// Vendor discriminator.
	pub fn vendor(&self) -> Vendor {
		self.gateway.kind
	}

	/// Raw `three_d_secure.params`.
	pub fn params(&self) -> &Map<String, Value> {
		&self.three_d_secure.params
	}

	/// Non-empty string at `params.authentication[key]`.
	pub fn authentication(&self, key: &str) -> Option<&str> {
		self.params()
			.get("authentication")
			.and_then(|auth| auth.get(key))
			.and_then(Value::as_str)
			.filter(|value| !value.is_empty())
	}
}

/// Gateway section of an [`ActionToken`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gateway {
	/// Vendor discriminator (`gateway.type`).
	#[serde(rename = "type")]
	pub kind: Vendor,
	/// Opaque gateway credentials.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub credentials: Option<Value>,
}

/// `three_d_secure` section of an [`ActionToken`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreeDSecureParams {
	/// Vendor-specific parameters.
	#[serde(default)]
	pub params: Map<String, Value>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn unknown_gateways_are_rejected_with_a_path() {
		let err = ActionToken::from_json(
			r#"{ "id": "t", "gateway": { "type": "stripe" }, "three_d_secure": {} }"#,
		)
		.expect_err("Unknown gateway should fail.");

		assert!(matches!(err, Error::InvalidActionToken { .. }));
		assert!(err.to_string().contains("gateway.type"));
	}

	#[test]
	fn empty_authentication_values_do_not_count() {
		let token = ActionToken::from_json(
			r#"{
				"id": "t",
				"gateway": { "type": "adyen" },
				"three_d_secure": {
					"params": { "authentication": { "threeds2.fingerprintToken": "", "threeds2.challengeToken": "C" } }
				}
			}"#,
		)
		.expect("Token should parse.");

		assert_eq!(token.vendor(), Vendor::Adyen);
		assert_eq!(token.authentication("threeds2.fingerprintToken"), None);
		assert_eq!(token.authentication("threeds2.challengeToken"), Some("C"));
	}
}
