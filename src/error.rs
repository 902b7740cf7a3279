//! Error types shared across the orchestrator, its strategies, and the fraud collector.
//!
//! Two layers live here. [`Error`] is returned from APIs the host calls directly and only covers
//! host-side mistakes (bad configuration, malformed tokens, misuse of `attach`). [`RiskError`] is
//! the emitted error object: every failure that happens inside an authentication attempt or a
//! fraud activation is captured and delivered through an event sink tagged with an
//! [`ErrorKind`].

// self
use crate::{_prelude::*, dom::DomError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error returned by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Document port rejected an operation.
	#[error(transparent)]
	Dom(#[from] DomError),
	/// Configuration JSON could not be parsed.
	#[error("Configuration is invalid at `{}`.", .source.path())]
	InvalidConfig {
		/// Path-annotated parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Action token payload could not be parsed.
	#[error("Action token is invalid at `{}`.", .source.path())]
	InvalidActionToken {
		/// Path-annotated parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Risk info response body could not be parsed.
	#[error("Risk info response is invalid at `{}`.", .source.path())]
	InvalidRiskInfo {
		/// Path-annotated parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Attach target is not a connected element.
	#[error("Container is not an element attached to its document.")]
	InvalidContainer,
	/// Strategy has already been attached to a container.
	#[error("Strategy is already attached.")]
	AlreadyAttached,
	/// Orchestrator or strategy has been removed.
	#[error("Authentication attempt has been removed.")]
	Removed,
}

/// Configuration and validation failures.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// Public key is empty or whitespace.
	#[error("Public key is missing.")]
	MissingPublicKey,
	/// API base URL cannot be parsed.
	#[error("API URL is invalid.")]
	InvalidApiUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// API base URL uses a scheme other than HTTP(S).
	#[error("API URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// URL that failed validation.
		url: String,
	},
	/// API base URL cannot carry paths (e.g., `data:` URLs).
	#[error("API URL cannot be used as a base: {url}.")]
	CannotBeABase {
		/// URL that failed validation.
		url: String,
	},
	/// A route could not be joined onto the API base URL.
	#[error("Route `{route}` cannot be joined onto the API URL.")]
	InvalidRoute {
		/// Route that failed to join.
		route: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Stable discriminator carried by every emitted [`RiskError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
	/// Risk-profile fetch failed while collection was required.
	#[serde(rename = "fraud-data-collector-request-failed")]
	FraudDataCollectorRequestFailed,
	/// No host form could be located for Kount session-id injection.
	#[serde(rename = "fraud-data-collector-missing-form")]
	FraudDataCollectorMissingForm,
	/// Vendor library failed to load.
	#[serde(rename = "3ds-vendor-load-error")]
	VendorLoad,
	/// No authentication method could be chosen from the action token.
	#[serde(rename = "3ds-auth-determination-error")]
	AuthDetermination,
	/// Vendor reported a failure during fingerprint, challenge, or redirect.
	#[serde(rename = "3ds-auth-error")]
	Auth,
}
impl ErrorKind {
	/// Returns the stable label used on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::FraudDataCollectorRequestFailed => "fraud-data-collector-request-failed",
			ErrorKind::FraudDataCollectorMissingForm => "fraud-data-collector-missing-form",
			ErrorKind::VendorLoad => "3ds-vendor-load-error",
			ErrorKind::AuthDetermination => "3ds-auth-determination-error",
			ErrorKind::Auth => "3ds-auth-error",
		}
	}

	/// Human-readable summary for the kind.
	pub const fn message(self) -> &'static str {
		match self {
			ErrorKind::FraudDataCollectorRequestFailed =>
				"There was an error getting the data collector fields.",
			ErrorKind::FraudDataCollectorMissingForm =>
				"There was an error finding a form to inject the data collector fields.",
			ErrorKind::VendorLoad => "The 3-D Secure vendor library failed to load.",
			ErrorKind::AuthDetermination => "We could not determine an authentication method.",
			ErrorKind::Auth => "We were unable to authenticate your payment method.",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Error object emitted to the host: a kind plus its context map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ThisError)]
#[error("{}", .kind.message())]
pub struct RiskError {
	/// Stable discriminator.
	pub kind: ErrorKind,
	/// Structured context (vendor, cause, selectors, etc.).
	#[serde(default)]
	pub context: Map<String, Value>,
}
impl RiskError {
	/// Creates an error with an empty context.
	pub fn new(kind: ErrorKind) -> Self {
		Self { kind, context: Map::new() }
	}

	/// Adds a context entry.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.context.insert(key.into(), value.into());

		self
	}

	/// Looks up a context entry.
	pub fn context_value(&self, key: &str) -> Option<&Value> {
		self.context.get(key)
	}

	pub(crate) fn determination(cause: impl Into<Value>) -> Self {
		Self::new(ErrorKind::AuthDetermination).with("cause", cause)
	}

	pub(crate) fn auth(cause: impl Into<Value>) -> Self {
		Self::new(ErrorKind::Auth).with("cause", cause)
	}

	pub(crate) fn vendor_load(vendor: &str, cause: impl Into<Value>) -> Self {
		Self::new(ErrorKind::VendorLoad).with("vendor", vendor).with("cause", cause)
	}

	pub(crate) fn collector_request(error: impl Into<Value>) -> Self {
		Self::new(ErrorKind::FraudDataCollectorRequestFailed).with("error", error)
	}
}
