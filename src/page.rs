//! Page-scoped bundle of injected ports.

// self
use crate::{
	_prelude::*, config::RiskConfig, dom::Document, frame::FrameFactory, loader::LibraryLoader,
	vendor::VendorRuntime,
};

/// Everything the core reaches outside itself, shared by every component on one page.
///
/// Cloning is cheap; clones share the same library loader so a vendor script is fetched once
/// per page no matter how many attempts run.
#[derive(Clone)]
pub struct Page {
	/// Validated host configuration.
	pub config: Arc<RiskConfig>,
	/// Host document.
	pub document: Arc<dyn Document>,
	/// Vendor globals.
	pub runtime: Arc<dyn VendorRuntime>,
	/// Redirect frame collaborator.
	pub frames: Arc<dyn FrameFactory>,
	/// Page-wide library loader.
	pub loader: Arc<LibraryLoader>,
}
impl Page {
	/// Bundles the ports and creates the page's library loader over `document`.
	pub fn new(
		config: RiskConfig,
		document: Arc<dyn Document>,
		runtime: Arc<dyn VendorRuntime>,
		frames: Arc<dyn FrameFactory>,
	) -> Self {
		let loader = Arc::new(LibraryLoader::new(document.clone()));

		Self { config: Arc::new(config), document, runtime, frames, loader }
	}
}
impl Debug for Page {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Page").field("config", &self.config).field("loader", &self.loader).finish()
	}
}
