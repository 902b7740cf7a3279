//! Redirect frame collaborator.
//!
//! Fallback authentication hands the shopper to a server-rendered page that drives the
//! legacy 3-D Secure redirect. [`FrameFactory`] is the port; [`IframeFrameFactory`] is the
//! built-in implementation that mounts an `<iframe>` inside the strategy's container and relays
//! the page's completion message (which the host receives via `postMessage`) to the strategy.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	config::RiskConfig,
	dom::{DomError, NodeRef, build_element},
	obs::debug_event,
	vendor::{Outcome, OutcomeReporter},
};

const EVENT_SUFFIX_LEN: usize = 12;

/// How the frame is presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
	/// Inline iframe inside the container.
	Iframe,
	/// Separate browser window.
	Window,
}

/// Frame construction parameters.
#[derive(Clone, Debug)]
pub struct FrameOptions {
	/// Presentation type.
	pub kind: FrameType,
	/// API route to load, e.g. `/three_d_secure/start`.
	pub path: String,
	/// Query payload sent to the route.
	pub payload: BTreeMap<String, String>,
	/// Element receiving the frame.
	pub container: NodeRef,
	/// Prefix of the message name the frame reports under.
	pub default_event_name: String,
}

/// Frame construction failures.
#[derive(Debug, ThisError)]
pub enum FrameError {
	/// The factory cannot present this frame type.
	#[error("Frame type {kind:?} is not supported by this factory.")]
	UnsupportedType {
		/// Requested type.
		kind: FrameType,
	},
	/// Route could not be resolved.
	#[error(transparent)]
	Config(#[from] crate::error::ConfigError),
	/// Document rejected the frame node.
	#[error(transparent)]
	Dom(#[from] DomError),
}

/// Live frame returned by [`FrameFactory::open`].
pub trait FrameHandle: Send {
	/// Unique message name the frame reports under.
	fn event_name(&self) -> &str;

	/// Removes the frame and stops relaying its messages. Safe to call repeatedly.
	fn destroy(&mut self);
}

/// Redirect frame port.
pub trait FrameFactory: Send + Sync {
	/// Opens a frame that reports its outcome through `reporter`.
	fn open(
		&self,
		options: FrameOptions,
		reporter: OutcomeReporter,
	) -> Result<Box<dyn FrameHandle>, FrameError>;
}

type Routes = Arc<Mutex<HashMap<String, OutcomeReporter>>>;

/// Built-in [`FrameFactory`] that mounts iframes pointing at the API.
#[derive(Clone, Debug)]
pub struct IframeFrameFactory {
	config: Arc<RiskConfig>,
	routes: Routes,
}
impl IframeFrameFactory {
	/// Creates a factory resolving frame routes against `config.api`.
	pub fn new(config: Arc<RiskConfig>) -> Self {
		Self { config, routes: Default::default() }
	}

	/// Relays a message received for `event_name`, returning whether a live frame claimed it.
	pub fn deliver(&self, event_name: &str, outcome: Outcome) -> bool {
		let reporter = self.routes.lock().get(event_name).cloned();

		match reporter {
			Some(reporter) => {
				reporter.report(outcome);

				true
			},
			None => {
				debug_event!(event_name, "dropping message for unknown frame");

				false
			},
		}
	}

	/// Number of frames currently relaying messages.
	pub fn live_frames(&self) -> usize {
		self.routes.lock().len()
	}

	fn frame_url(&self, options: &FrameOptions, event_name: &str) -> Result<Url, FrameError> {
		let mut url = self.config.route(&options.path)?;

		{
			let mut pairs = url.query_pairs_mut();

			pairs.append_pair("key", &self.config.public_key);
			pairs.append_pair("event_name", event_name);

			for (key, value) in &options.payload {
				pairs.append_pair(key, value);
			}
		}

		Ok(url)
	}
}
impl FrameFactory for IframeFrameFactory {
	fn open(
		&self,
		options: FrameOptions,
		reporter: OutcomeReporter,
	) -> Result<Box<dyn FrameHandle>, FrameError> {
		if options.kind != FrameType::Iframe {
			return Err(FrameError::UnsupportedType { kind: options.kind });
		}

		let event_name = format!("{}-{}", options.default_event_name, random_suffix());
		let url = self.frame_url(&options, &event_name)?;
		let document = options.container.document();
		let node = build_element(document.as_ref(), "iframe", &[
			("name", &event_name),
			("src", url.as_str()),
			("frameborder", "0"),
			("allowtransparency", "true"),
			("style", "width:100%;height:100%;border:none;"),
		])?;

		document.append_child(options.container.id(), node)?;
		self.routes.lock().insert(event_name.clone(), reporter);

		Ok(Box::new(IframeFrame {
			node: NodeRef::new(document.clone(), node),
			event_name,
			routes: self.routes.clone(),
		}))
	}
}

struct IframeFrame {
	node: NodeRef,
	event_name: String,
	routes: Routes,
}
impl FrameHandle for IframeFrame {
	fn event_name(&self) -> &str {
		&self.event_name
	}

	fn destroy(&mut self) {
		self.routes.lock().remove(&self.event_name);

		let _ = self.node.detach();
	}
}

fn random_suffix() -> String {
	rand::rng().sample_iter(Alphanumeric).take(EVENT_SUFFIX_LEN).map(char::from).collect()
}
