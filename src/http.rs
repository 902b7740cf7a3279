//! Transport for the risk-profile lookup.
//!
//! [`RiskInfoClient`] is the collector's only dependency on an HTTP stack. Hosts with their own
//! request layer implement it directly; everyone else uses [`ReqwestRiskInfoClient`] (default
//! `reqwest` feature), which GETs `{api}/risk/info?key={public_key}` and parses the body with
//! [`parse_risk_info`].

// self
#[cfg(feature = "reqwest")] use crate::config::RiskConfig;
use crate::{_prelude::*, fraud::RiskInfo};

/// Boxed future returned by [`RiskInfoClient::risk_info`].
pub type RiskInfoFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RiskInfo, RequestError>> + 'a + Send>>;

/// Source of the server-driven risk profile list.
pub trait RiskInfoClient
where
	Self: Send + Sync,
{
	/// Fetches the profile list once.
	fn risk_info(&self) -> RiskInfoFuture<'_>;
}

/// Failure reported by a [`RiskInfoClient`].
///
/// The whole value is forwarded as the `error` context of a
/// `fraud-data-collector-request-failed` event, so it stays serializable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("{message}")]
pub struct RequestError {
	/// Human-readable cause.
	pub message: String,
	/// HTTP status, when a response arrived.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<u16>,
	/// Raw response body, when a response arrived.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub body: Option<String>,
}
impl RequestError {
	/// Creates an error without response details.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into(), status: None, body: None }
	}
}
impl From<Error> for RequestError {
	fn from(e: Error) -> Self {
		Self::new(e.to_string())
	}
}

/// Parses a `/risk/info` response body.
pub fn parse_risk_info(bytes: &[u8]) -> Result<RiskInfo> {
	let de = &mut serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(de).map_err(|source| Error::InvalidRiskInfo { source })
}

/// reqwest-backed [`RiskInfoClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestRiskInfoClient {
	client: ReqwestClient,
	endpoint: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestRiskInfoClient {
	/// Creates a client with a default [`ReqwestClient`].
	pub fn new(config: &RiskConfig) -> Result<Self> {
		Self::with_client(config, ReqwestClient::default())
	}

	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(config: &RiskConfig, client: ReqwestClient) -> Result<Self> {
		let mut endpoint = config.route("/risk/info")?;

		endpoint.query_pairs_mut().append_pair("key", &config.public_key);

		Ok(Self { client, endpoint })
	}

	/// Fully resolved request URL.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	async fn fetch(&self) -> Result<RiskInfo, RequestError> {
		let response =
			self.client.get(self.endpoint.clone()).send().await.map_err(transport_error)?;
		let status = response.status();
		let bytes = response.bytes().await.map_err(transport_error)?;

		if !status.is_success() {
			return Err(RequestError {
				message: format!("Risk info request failed with status {}.", status.as_u16()),
				status: Some(status.as_u16()),
				body: Some(String::from_utf8_lossy(&bytes).into_owned()),
			});
		}

		Ok(parse_risk_info(&bytes)?)
	}
}
#[cfg(feature = "reqwest")]
impl RiskInfoClient for ReqwestRiskInfoClient {
	fn risk_info(&self) -> RiskInfoFuture<'_> {
		Box::pin(self.fetch())
	}
}

#[cfg(feature = "reqwest")]
fn transport_error(e: ReqwestError) -> RequestError {
	RequestError { message: e.to_string(), status: e.status().map(|s| s.as_u16()), body: None }
}
