//! Provenance tracking for DOM side effects.

// self
use crate::{
	_prelude::*,
	dom::{DomError, NodeId, NodeRef},
};

/// Append-only set of nodes a component created and attached.
///
/// A node enters the set only after it has been appended successfully, and
/// [`release`](NodeTracker::release) empties the set while detaching every node that is still
/// attached somewhere.
#[derive(Debug, Default)]
pub struct NodeTracker(Mutex<Vec<NodeRef>>);
impl NodeTracker {
	/// Appends `child` under `parent` and remembers it.
	pub fn append(&self, parent: &NodeRef, child: NodeId) -> Result<NodeRef, DomError> {
		parent.document().append_child(parent.id(), child)?;

		let node = NodeRef::new(parent.document().clone(), child);

		self.0.lock().push(node.clone());

		Ok(node)
	}

	/// Number of tracked nodes.
	pub fn len(&self) -> usize {
		self.0.lock().len()
	}

	/// Whether nothing is tracked.
	pub fn is_empty(&self) -> bool {
		self.0.lock().is_empty()
	}

	/// Snapshot of tracked nodes, in creation order.
	pub fn nodes(&self) -> Vec<NodeRef> {
		self.0.lock().clone()
	}

	/// Detaches and forgets every tracked node, returning how many were still attached.
	///
	/// Nodes whose parent has already been removed by other means are skipped.
	pub fn release(&self) -> usize {
		let nodes = std::mem::take(&mut *self.0.lock());

		nodes.iter().filter(|node| matches!(node.detach(), Ok(true))).count()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::dom::{Document, MemoryDocument};

	#[test]
	fn release_detaches_and_empties() {
		let memory = MemoryDocument::new();
		let document: Arc<dyn Document> = Arc::new(memory.clone());
		let body = NodeRef::new(document.clone(), document.body());
		let tracker = NodeTracker::default();
		let first = tracker.append(&body, document.create_element("div")).expect("Append should work.");

		tracker.append(&body, document.create_element("span")).expect("Append should work.");

		assert_eq!(tracker.len(), 2);
		assert_eq!(memory.connected_len(), 2);

		first.detach().expect("External removal should succeed.");

		assert_eq!(tracker.release(), 1);
		assert!(tracker.is_empty());
		assert_eq!(memory.connected_len(), 0);
		assert_eq!(tracker.release(), 0);
	}

	#[test]
	fn failed_appends_are_not_tracked() {
		let document: Arc<dyn Document> = Arc::new(MemoryDocument::new());
		let body = NodeRef::new(document.clone(), document.body());
		let tracker = NodeTracker::default();

		assert!(tracker.append(&body, NodeId::from_raw(404)).is_err());
		assert!(tracker.nodes().is_empty());
	}
}
