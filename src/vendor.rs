//! Vendor SDK ports.
//!
//! Vendor libraries are opaque capability providers: once their script has loaded they expose a
//! global factory object. [`VendorRuntime`] is how the core asks whether that global exists, and
//! [`WidgetFactory`] is the factory itself. Completion flows back through an
//! [`OutcomeReporter`], which is also what frames use.

// self
use crate::{_prelude::*, dom::NodeRef};

/// Closed set of 3-D Secure vendors, keyed by the action token's `gateway.type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
	/// Adyen 3DS2 (fingerprint/challenge widgets) with a 3DS1 redirect fallback.
	Adyen,
	/// Sandbox gateway that renders a mock challenge frame.
	Test,
}
impl Vendor {
	/// Returns the discriminator label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Vendor::Adyen => "adyen",
			Vendor::Test => "test",
		}
	}

	/// Returns the human-facing vendor name used in error context.
	pub const fn display_name(self) -> &'static str {
		match self {
			Vendor::Adyen => "Adyen",
			Vendor::Test => "Test",
		}
	}
}
impl Display for Vendor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Terminal report from a widget or frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
	/// Completed with vendor results.
	Done(Value),
	/// Failed with a vendor-supplied cause.
	Failed(Value),
}

/// Cloneable handle vendors and frames use to report their outcome.
#[derive(Clone)]
pub struct OutcomeReporter(Arc<dyn Fn(Outcome) + Send + Sync>);
impl OutcomeReporter {
	/// Wraps a callback.
	pub fn new(callback: impl 'static + Fn(Outcome) + Send + Sync) -> Self {
		Self(Arc::new(callback))
	}

	/// Reports completion.
	pub fn done(&self, results: impl Into<Value>) {
		(self.0)(Outcome::Done(results.into()));
	}

	/// Reports failure.
	pub fn fail(&self, cause: impl Into<Value>) {
		(self.0)(Outcome::Failed(cause.into()));
	}

	/// Forwards a pre-built outcome.
	pub fn report(&self, outcome: Outcome) {
		(self.0)(outcome);
	}
}
impl Debug for OutcomeReporter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("OutcomeReporter(..)")
	}
}

/// Component request passed to a vendor factory (`checkout.create(component, options)`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WidgetRequest {
	/// Vendor component name, e.g. `threeDS2DeviceFingerprint`.
	pub component: String,
	/// Component options.
	pub options: Map<String, Value>,
}

/// Error raised by a vendor factory while creating or mounting a widget.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct VendorError {
	/// Vendor-supplied message.
	pub message: String,
}
impl VendorError {
	/// Creates an error from a message.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}

/// Vendor global factory that mounts widgets into a container.
pub trait WidgetFactory: Send + Sync {
	/// Creates the component and mounts it into `container`.
	///
	/// The widget reports exactly once through `reporter`; it may do so before this returns.
	fn mount(
		&self,
		request: WidgetRequest,
		container: &NodeRef,
		reporter: OutcomeReporter,
	) -> Result<Box<dyn WidgetHandle>, VendorError>;
}

/// Live widget returned by [`WidgetFactory::mount`].
pub trait WidgetHandle: Send {
	/// Releases the widget's DOM and listeners. Called at most once.
	fn unmount(&mut self);
}

/// Kount client SDK (`window.ka`).
pub trait DataCollectorSdk: Send + Sync {
	/// Starts device data collection for `.kaxsdc` markers.
	fn auto_load_events(&self);
}

/// Access to vendor globals that loaded scripts install on the page.
pub trait VendorRuntime: Send + Sync {
	/// Returns the vendor's widget factory (`window.AdyenCheckout`), if present.
	fn widget_factory(&self, vendor: Vendor) -> Option<Arc<dyn WidgetFactory>>;

	/// Returns the Kount client SDK, if present.
	fn data_collector(&self) -> Option<Arc<dyn DataCollectorSdk>>;
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn vendor_labels_round_trip_through_serde() {
		let vendor: Vendor = serde_json::from_str("\"adyen\"").expect("Vendor should parse.");

		assert_eq!(vendor, Vendor::Adyen);
		assert_eq!(vendor.display_name(), "Adyen");
		assert!(serde_json::from_str::<Vendor>("\"stripe\"").is_err());
	}

	#[test]
	fn reporter_forwards_outcomes() {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let reporter = {
			let seen = seen.clone();

			OutcomeReporter::new(move |outcome| seen.lock().push(outcome))
		};

		reporter.done(serde_json::json!({ "ok": true }));
		reporter.fail("declined");

		assert_eq!(*seen.lock(), vec![
			Outcome::Done(serde_json::json!({ "ok": true })),
			Outcome::Failed(Value::from("declined")),
		]);
	}
}
