#![allow(dead_code)]

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use parking_lot::Mutex;
// self
use risk_orchestrator::{
	config::{RiskConfig, RiskConfigBuilder},
	dom::{Document, MemoryDocument, NodeId, NodeRef},
	frame::IframeFrameFactory,
	page::Page,
	serde_json::{Map, Value},
	vendor::{
		DataCollectorSdk, OutcomeReporter, Vendor, VendorError, VendorRuntime, WidgetFactory,
		WidgetHandle, WidgetRequest,
	},
};

/// Page wired to an in-memory document, a scripted vendor runtime, and the iframe factory.
pub struct Fixture {
	pub memory: MemoryDocument,
	pub document: Arc<dyn Document>,
	pub runtime: Arc<FakeRuntime>,
	pub frames: Arc<IframeFrameFactory>,
	pub page: Page,
	pub container: NodeRef,
}
impl Fixture {
	pub fn new() -> Self {
		Self::with_config(|builder| builder)
	}

	pub fn with_config(configure: impl FnOnce(RiskConfigBuilder) -> RiskConfigBuilder) -> Self {
		let config = configure(RiskConfig::builder("ewr1-test-key").api("https://api.test/js/v1/"))
			.build()
			.expect("Test configuration should build.");
		let memory = MemoryDocument::new();
		let document: Arc<dyn Document> = Arc::new(memory.clone());
		let runtime = Arc::new(FakeRuntime::default());
		let frames = Arc::new(IframeFrameFactory::new(Arc::new(config.clone())));
		let page = Page::new(config, document.clone(), runtime.clone(), frames.clone());
		let container = document.create_element("div");

		document.set_attribute(container, "id", "three-d-secure").expect("Attribute should set.");
		document.append_child(document.body(), container).expect("Container should attach.");

		let container = NodeRef::new(document.clone(), container);

		Self { memory, document, runtime, frames, page, container }
	}

	/// Nodes attached to the document besides the fixture container.
	pub fn foreign_nodes(&self) -> usize {
		self.memory.connected_len() - 1
	}

	/// Appends `<form><div id=...></div></form>` to the body and returns the form.
	pub fn form_with_field(&self, field_id: &str) -> NodeId {
		let form = self.document.create_element("form");
		let field = self.document.create_element("div");

		self.document.set_attribute(field, "id", field_id).expect("Attribute should set.");
		self.document.append_child(self.document.body(), form).expect("Form should attach.");
		self.document.append_child(form, field).expect("Field should attach.");

		form
	}
}

/// Vendor runtime whose globals appear only when a test installs them.
#[derive(Default)]
pub struct FakeRuntime {
	adyen: Mutex<Option<Arc<FakeWidgetFactory>>>,
	kount: Mutex<Option<Arc<FakeKount>>>,
}
impl FakeRuntime {
	pub fn install_adyen(&self) -> Arc<FakeWidgetFactory> {
		let factory = Arc::new(FakeWidgetFactory::default());

		*self.adyen.lock() = Some(factory.clone());

		factory
	}

	pub fn install_kount(&self) -> Arc<FakeKount> {
		let kount = Arc::new(FakeKount::default());

		*self.kount.lock() = Some(kount.clone());

		kount
	}
}
impl VendorRuntime for FakeRuntime {
	fn widget_factory(&self, vendor: Vendor) -> Option<Arc<dyn WidgetFactory>> {
		match vendor {
			Vendor::Adyen => self.adyen.lock().clone().map(|f| f as Arc<dyn WidgetFactory>),
			Vendor::Test => None,
		}
	}

	fn data_collector(&self) -> Option<Arc<dyn DataCollectorSdk>> {
		self.kount.lock().clone().map(|k| k as Arc<dyn DataCollectorSdk>)
	}
}

#[derive(Default)]
pub struct FakeKount {
	pub auto_loads: AtomicUsize,
}
impl DataCollectorSdk for FakeKount {
	fn auto_load_events(&self) {
		self.auto_loads.fetch_add(1, Ordering::SeqCst);
	}
}

/// Widget mounted by [`FakeWidgetFactory`].
pub struct MountedWidget {
	pub component: String,
	pub options: Map<String, Value>,
	pub reporter: OutcomeReporter,
}

/// Adyen checkout double: mounts a marker node and keeps the reporter for the test to drive.
#[derive(Default)]
pub struct FakeWidgetFactory {
	pub mounted: Mutex<Vec<MountedWidget>>,
	pub unmounts: Arc<AtomicUsize>,
	pub fail_with: Mutex<Option<String>>,
}
impl FakeWidgetFactory {
	pub fn last(&self) -> (String, OutcomeReporter) {
		let mounted = self.mounted.lock();
		let widget = mounted.last().expect("A widget should be mounted.");

		(widget.component.clone(), widget.reporter.clone())
	}
}
impl WidgetFactory for FakeWidgetFactory {
	fn mount(
		&self,
		request: WidgetRequest,
		container: &NodeRef,
		reporter: OutcomeReporter,
	) -> Result<Box<dyn WidgetHandle>, VendorError> {
		if let Some(message) = self.fail_with.lock().clone() {
			return Err(VendorError::new(message));
		}

		let document = container.document();
		let node = document.create_element("section");

		document
			.append_child(container.id(), node)
			.map_err(|e| VendorError::new(e.to_string()))?;
		self.mounted.lock().push(MountedWidget {
			component: request.component,
			options: request.options,
			reporter,
		});

		Ok(Box::new(FakeWidget {
			node: NodeRef::new(document.clone(), node),
			unmounts: self.unmounts.clone(),
		}))
	}
}

struct FakeWidget {
	node: NodeRef,
	unmounts: Arc<AtomicUsize>,
}
impl WidgetHandle for FakeWidget {
	fn unmount(&mut self) {
		self.unmounts.fetch_add(1, Ordering::SeqCst);

		let _ = self.node.detach();
	}
}
