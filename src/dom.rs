//! Document port consumed by strategies, the library loader, and the fraud collector.
//!
//! Nothing in the crate touches a global document. Every component receives an
//! `Arc<dyn Document>` (and reaches iframe documents through
//! [`Document::content_document`]) so the orchestration logic runs the same against a browser
//! binding or the in-process [`MemoryDocument`].

pub mod memory;
pub mod selector;
pub mod tracker;

pub use memory::MemoryDocument;
pub use selector::Selector;
pub use tracker::NodeTracker;

// self
use crate::_prelude::*;

/// Callback fired once when a node finishes loading its external resource.
pub type LoadListener = Box<dyn FnOnce(LoadStatus) + Send>;

/// Opaque handle to a node inside one document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);
impl NodeId {
	/// Wraps a raw node index handed out by a [`Document`] implementation.
	pub const fn from_raw(raw: usize) -> Self {
		Self(raw)
	}

	/// Returns the raw index.
	pub const fn get(self) -> usize {
		self.0
	}
}
impl Display for NodeId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "#{}", self.0)
	}
}

/// Result reported to a [`LoadListener`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadStatus {
	/// Resource loaded.
	Loaded,
	/// Resource failed to load.
	Failed(String),
}

/// Failures raised by [`Document`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum DomError {
	/// The node does not belong to this document.
	#[error("Node {node} does not exist in this document.")]
	UnknownNode {
		/// Offending node.
		node: NodeId,
	},
	/// `child` is not a child of `parent`.
	#[error("Node {child} is not a child of {parent}.")]
	NotAChild {
		/// Expected parent.
		parent: NodeId,
		/// Node that was supposed to be its child.
		child: NodeId,
	},
	/// Appending would create a cycle or move the document root.
	#[error("Node {child} cannot be inserted under {parent}.")]
	Hierarchy {
		/// Target parent.
		parent: NodeId,
		/// Node being inserted.
		child: NodeId,
	},
}

/// Minimal document surface the orchestration core needs.
///
/// Implementations must tolerate being called from inside a [`LoadListener`] and must not hold
/// internal locks while invoking listeners.
pub trait Document: Send + Sync {
	/// Returns the `<head>` element.
	fn head(&self) -> NodeId;

	/// Returns the `<body>` element.
	fn body(&self) -> NodeId;

	/// Creates a detached element with the given tag name.
	fn create_element(&self, tag: &str) -> NodeId;

	/// Returns the lowercase tag name of an element.
	fn tag_name(&self, node: NodeId) -> Option<String>;

	/// Sets (or replaces) an attribute.
	fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError>;

	/// Reads an attribute.
	fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

	/// Replaces the text content (`innerHTML` for script payloads).
	fn set_text(&self, node: NodeId, text: &str) -> Result<(), DomError>;

	/// Appends `child` as the last child of `parent`, moving it if it already has a parent.
	fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError>;

	/// Detaches `child` from `parent`.
	fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError>;

	/// Returns the parent of a node, if it has one.
	fn parent(&self, node: NodeId) -> Option<NodeId>;

	/// Whether the node is reachable from the document root.
	fn is_connected(&self, node: NodeId) -> bool;

	/// Returns the first connected element matching `selector`, in document order.
	fn query_selector(&self, selector: &str) -> Option<NodeId>;

	/// Returns the inner document of an `<iframe>` element.
	fn content_document(&self, frame: NodeId) -> Option<Arc<dyn Document>>;

	/// Registers a one-shot listener for the node's load/error event.
	fn on_load(&self, node: NodeId, listener: LoadListener) -> Result<(), DomError>;
}

/// A node paired with the document that owns it.
#[derive(Clone)]
pub struct NodeRef {
	document: Arc<dyn Document>,
	node: NodeId,
}
impl NodeRef {
	/// Pairs a node with its document.
	pub fn new(document: Arc<dyn Document>, node: NodeId) -> Self {
		Self { document, node }
	}

	/// Resolves `selector` in `document`.
	pub fn select(document: &Arc<dyn Document>, selector: &str) -> Option<Self> {
		document.query_selector(selector).map(|node| Self::new(document.clone(), node))
	}

	/// Owning document.
	pub fn document(&self) -> &Arc<dyn Document> {
		&self.document
	}

	/// Node handle.
	pub fn id(&self) -> NodeId {
		self.node
	}

	/// Lowercase tag name, if the node is an element.
	pub fn tag_name(&self) -> Option<String> {
		self.document.tag_name(self.node)
	}

	/// Whether the node is attached to its document.
	pub fn is_connected(&self) -> bool {
		self.document.is_connected(self.node)
	}

	/// Walks from this node (inclusive) up to the nearest ancestor with the given tag.
	pub fn closest(&self, tag: &str) -> Option<Self> {
		let mut cursor = Some(self.node);

		while let Some(node) = cursor {
			if self.document.tag_name(node).is_some_and(|name| name.eq_ignore_ascii_case(tag)) {
				return Some(Self::new(self.document.clone(), node));
			}

			cursor = self.document.parent(node);
		}

		None
	}

	/// Detaches the node from its current parent.
	///
	/// Returns `false` when the node had already been detached by other means.
	pub fn detach(&self) -> Result<bool, DomError> {
		let Some(parent) = self.document.parent(self.node) else {
			return Ok(false);
		};

		self.document.remove_child(parent, self.node)?;

		Ok(true)
	}
}
impl Debug for NodeRef {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("NodeRef").field(&self.node).finish()
	}
}
impl PartialEq for NodeRef {
	fn eq(&self, other: &Self) -> bool {
		self.node == other.node && Arc::ptr_eq(&self.document, &other.document)
	}
}

/// Creates an element and applies the attributes in order.
pub(crate) fn build_element(
	document: &dyn Document,
	tag: &str,
	attributes: &[(&str, &str)],
) -> Result<NodeId, DomError> {
	let node = document.create_element(tag);

	for (name, value) in attributes {
		document.set_attribute(node, name, value)?;
	}

	Ok(node)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn closest_includes_the_starting_node() {
		let document: Arc<dyn Document> = Arc::new(MemoryDocument::new());
		let form = document.create_element("form");
		let input = document.create_element("input");

		document.append_child(document.body(), form).expect("Form should attach to body.");
		document.append_child(form, input).expect("Input should attach to form.");

		let input_ref = NodeRef::new(document.clone(), input);
		let form_ref = NodeRef::new(document.clone(), form);

		assert_eq!(input_ref.closest("form"), Some(form_ref.clone()));
		assert_eq!(form_ref.closest("FORM"), Some(form_ref));
		assert_eq!(input_ref.closest("table"), None);
	}

	#[test]
	fn detach_tolerates_orphans() {
		let document: Arc<dyn Document> = Arc::new(MemoryDocument::new());
		let div = document.create_element("div");
		let node = NodeRef::new(document.clone(), div);

		assert_eq!(node.detach(), Ok(false));

		document.append_child(document.body(), div).expect("Div should attach to body.");

		assert_eq!(node.detach(), Ok(true));
		assert!(!node.is_connected());
	}
}
