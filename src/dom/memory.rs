//! Thread-safe in-memory [`Document`] for tests and headless hosts.

// self
use crate::{
	_prelude::*,
	dom::{Document, DomError, LoadListener, LoadStatus, NodeId, Selector},
};

#[derive(Debug)]
struct Node {
	tag: String,
	attributes: BTreeMap<String, String>,
	text: String,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	content: Option<MemoryDocument>,
}
impl Node {
	fn new(tag: &str) -> Self {
		let tag = tag.to_ascii_lowercase();
		let content = (tag == "iframe").then(MemoryDocument::new);

		Self {
			tag,
			attributes: BTreeMap::new(),
			text: String::new(),
			parent: None,
			children: Vec::new(),
			content,
		}
	}
}

#[derive(Debug)]
struct Tree {
	nodes: Vec<Node>,
	root: NodeId,
	head: NodeId,
	body: NodeId,
}
impl Tree {
	fn new() -> Self {
		let mut tree = Self {
			nodes: vec![Node::new("html"), Node::new("head"), Node::new("body")],
			root: NodeId::from_raw(0),
			head: NodeId::from_raw(1),
			body: NodeId::from_raw(2),
		};

		for child in [tree.head, tree.body] {
			tree.nodes[child.get()].parent = Some(tree.root);
			tree.nodes[tree.root.get()].children.push(child);
		}

		tree
	}

	fn node(&self, id: NodeId) -> Result<&Node, DomError> {
		self.nodes.get(id.get()).ok_or(DomError::UnknownNode { node: id })
	}

	fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
		self.nodes.get_mut(id.get()).ok_or(DomError::UnknownNode { node: id })
	}

	fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
		let mut cursor = Some(node);

		while let Some(current) = cursor {
			if current == ancestor {
				return true;
			}

			cursor = self.nodes.get(current.get()).and_then(|n| n.parent);
		}

		false
	}

	fn is_connected(&self, node: NodeId) -> bool {
		self.nodes.get(node.get()).is_some() && self.is_ancestor_or_self(self.root, node)
	}

	fn detach(&mut self, child: NodeId) {
		if let Some(parent) = self.nodes[child.get()].parent.take() {
			self.nodes[parent.get()].children.retain(|c| *c != child);
		}
	}

	// Pre-order walk from the root; only connected nodes are visited.
	fn walk(&self) -> Vec<NodeId> {
		let mut order = Vec::new();
		let mut stack = vec![self.root];

		while let Some(id) = stack.pop() {
			order.push(id);
			stack.extend(self.nodes[id.get()].children.iter().rev().copied());
		}

		order
	}
}

#[derive(Default)]
struct Listeners(Mutex<HashMap<NodeId, Vec<LoadListener>>>);
impl Debug for Listeners {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Listeners").field("pending", &self.0.lock().len()).finish()
	}
}

#[derive(Debug)]
struct Inner {
	tree: RwLock<Tree>,
	listeners: Listeners,
}

/// In-process document with `<html>`, `<head>`, and `<body>` pre-created.
///
/// Every `<iframe>` element owns its own nested [`MemoryDocument`]. Load events never fire on
/// their own; drive them with [`MemoryDocument::fire_load`] or
/// [`MemoryDocument::complete_script`] to simulate network completion in any order.
#[derive(Clone, Debug)]
pub struct MemoryDocument(Arc<Inner>);
impl MemoryDocument {
	/// Creates an empty document.
	pub fn new() -> Self {
		Self(Arc::new(Inner { tree: RwLock::new(Tree::new()), listeners: Listeners::default() }))
	}

	/// Returns the `<html>` root.
	pub fn root(&self) -> NodeId {
		self.0.tree.read().root
	}

	/// Children of a node, in order.
	pub fn children(&self, node: NodeId) -> Vec<NodeId> {
		self.0.tree.read().node(node).map(|n| n.children.clone()).unwrap_or_default()
	}

	/// Text content of a node.
	pub fn text(&self, node: NodeId) -> Option<String> {
		self.0.tree.read().node(node).ok().map(|n| n.text.clone())
	}

	/// All connected elements matching `selector`, in document order.
	pub fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
		let Some(selector) = Selector::parse(selector) else {
			return Vec::new();
		};
		let tree = self.0.tree.read();

		tree.walk()
			.into_iter()
			.filter(|id| {
				let node = &tree.nodes[id.get()];

				selector.matches(&node.tag, &node.attributes)
			})
			.collect()
	}

	/// Number of connected nodes, excluding `<html>`, `<head>`, and `<body>`.
	pub fn connected_len(&self) -> usize {
		self.0.tree.read().walk().len().saturating_sub(3)
	}

	/// Typed access to an iframe's nested document.
	pub fn frame_document(&self, frame: NodeId) -> Option<MemoryDocument> {
		self.0.tree.read().node(frame).ok().and_then(|n| n.content.clone())
	}

	/// Nodes with at least one pending load listener.
	pub fn pending_loads(&self) -> Vec<NodeId> {
		let mut nodes = self.0.listeners.0.lock().keys().copied().collect::<Vec<_>>();

		nodes.sort();

		nodes
	}

	/// Fires the load listeners registered on `node`, returning how many ran.
	pub fn fire_load(&self, node: NodeId, status: LoadStatus) -> usize {
		let listeners = self.0.listeners.0.lock().remove(&node).unwrap_or_default();
		let count = listeners.len();

		for listener in listeners {
			listener(status.clone());
		}

		count
	}

	/// Fires load listeners on every node whose `src` attribute equals `src`.
	pub fn complete_script(&self, src: &str, status: LoadStatus) -> usize {
		let targets = {
			let tree = self.0.tree.read();

			self.pending_loads()
				.into_iter()
				.filter(|id| {
					tree.node(*id).is_ok_and(|n| n.attributes.get("src").map(String::as_str) == Some(src))
				})
				.collect::<Vec<_>>()
		};

		targets.into_iter().map(|id| self.fire_load(id, status.clone())).sum()
	}
}
impl Default for MemoryDocument {
	fn default() -> Self {
		Self::new()
	}
}
impl Document for MemoryDocument {
	fn head(&self) -> NodeId {
		self.0.tree.read().head
	}

	fn body(&self) -> NodeId {
		self.0.tree.read().body
	}

	fn create_element(&self, tag: &str) -> NodeId {
		let mut tree = self.0.tree.write();
		let id = NodeId::from_raw(tree.nodes.len());

		tree.nodes.push(Node::new(tag));

		id
	}

	fn tag_name(&self, node: NodeId) -> Option<String> {
		self.0.tree.read().node(node).ok().map(|n| n.tag.clone())
	}

	fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
		self.0.tree.write().node_mut(node)?.attributes.insert(name.to_owned(), value.to_owned());

		Ok(())
	}

	fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
		self.0.tree.read().node(node).ok().and_then(|n| n.attributes.get(name).cloned())
	}

	fn set_text(&self, node: NodeId, text: &str) -> Result<(), DomError> {
		self.0.tree.write().node_mut(node)?.text = text.to_owned();

		Ok(())
	}

	fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
		let mut tree = self.0.tree.write();

		tree.node(parent)?;
		tree.node(child)?;

		if child == tree.root || tree.is_ancestor_or_self(child, parent) {
			return Err(DomError::Hierarchy { parent, child });
		}

		tree.detach(child);
		tree.nodes[child.get()].parent = Some(parent);
		tree.nodes[parent.get()].children.push(child);

		Ok(())
	}

	fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
		let mut tree = self.0.tree.write();

		if tree.node(child)?.parent != Some(parent) {
			return Err(DomError::NotAChild { parent, child });
		}

		tree.detach(child);

		Ok(())
	}

	fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.0.tree.read().node(node).ok().and_then(|n| n.parent)
	}

	fn is_connected(&self, node: NodeId) -> bool {
		self.0.tree.read().is_connected(node)
	}

	fn query_selector(&self, selector: &str) -> Option<NodeId> {
		self.query_selector_all(selector).into_iter().next()
	}

	fn content_document(&self, frame: NodeId) -> Option<Arc<dyn Document>> {
		self.frame_document(frame).map(|document| Arc::new(document) as Arc<dyn Document>)
	}

	fn on_load(&self, node: NodeId, listener: LoadListener) -> Result<(), DomError> {
		self.0.tree.read().node(node)?;
		self.0.listeners.0.lock().entry(node).or_default().push(listener);

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;

	#[test]
	fn append_moves_and_rejects_cycles() {
		let document = MemoryDocument::new();
		let outer = document.create_element("div");
		let inner = document.create_element("span");

		document.append_child(document.body(), outer).expect("Outer should attach.");
		document.append_child(outer, inner).expect("Inner should attach.");

		assert_eq!(
			document.append_child(inner, outer),
			Err(DomError::Hierarchy { parent: inner, child: outer })
		);

		document.append_child(document.head(), inner).expect("Inner should move to head.");

		assert!(document.children(outer).is_empty());
		assert_eq!(document.parent(inner), Some(document.head()));
		assert_eq!(document.connected_len(), 2);
	}

	#[test]
	fn queries_only_see_connected_nodes_in_order() {
		let document = MemoryDocument::new();
		let first = document.create_element("input");
		let second = document.create_element("input");
		let orphan = document.create_element("input");

		for (node, name) in [(first, "a"), (second, "b"), (orphan, "c")] {
			document.set_attribute(node, "name", name).expect("Attribute should set.");
		}

		document.append_child(document.body(), first).expect("First should attach.");
		document.append_child(document.body(), second).expect("Second should attach.");

		assert_eq!(document.query_selector("input"), Some(first));
		assert_eq!(document.query_selector("input[name=b]"), Some(second));
		assert_eq!(document.query_selector("input[name=c]"), None);
		assert_eq!(document.query_selector_all("input"), vec![first, second]);
	}

	#[test]
	fn remove_child_validates_parentage() {
		let document = MemoryDocument::new();
		let div = document.create_element("div");

		assert_eq!(
			document.remove_child(document.body(), div),
			Err(DomError::NotAChild { parent: document.body(), child: div })
		);
		assert!(matches!(
			document.set_attribute(NodeId::from_raw(999), "id", "x"),
			Err(DomError::UnknownNode { .. })
		));
	}

	#[test]
	fn iframes_own_nested_documents() {
		let document = MemoryDocument::new();
		let frame = document.create_element("iframe");
		let div = document.create_element("div");
		let nested = document.frame_document(frame).expect("Iframe should own a document.");
		let script = nested.create_element("script");

		nested.append_child(nested.head(), script).expect("Script should attach to frame head.");

		assert!(document.frame_document(div).is_none());
		assert_eq!(nested.connected_len(), 1);
		assert_eq!(document.connected_len(), 0);
		assert!(document.content_document(frame).is_some());
	}

	#[test]
	fn load_listeners_fire_once() {
		let document = MemoryDocument::new();
		let script = document.create_element("script");
		let fired = Arc::new(AtomicUsize::new(0));

		document.set_attribute(script, "src", "https://cdn.example/lib.js").expect("Src should set.");

		for _ in 0..2 {
			let fired = fired.clone();

			document
				.on_load(
					script,
					Box::new(move |status| {
						assert_eq!(status, LoadStatus::Loaded);
						fired.fetch_add(1, Ordering::SeqCst);
					}),
				)
				.expect("Listener should register.");
		}

		assert_eq!(document.pending_loads(), vec![script]);
		assert_eq!(document.complete_script("https://cdn.example/lib.js", LoadStatus::Loaded), 2);
		assert_eq!(document.fire_load(script, LoadStatus::Loaded), 0);
		assert_eq!(fired.load(Ordering::SeqCst), 2);
	}
}
