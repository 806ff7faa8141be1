use crate::{
	arena::{Mounted, MountedId},
	diff::{update_props, DomDiffer},
	host::Document,
	vdom::{Element, Node, Props},
	Sensitive,
};
use tracing::{trace, trace_span};

impl<D: Document> DomDiffer<D> {
	/// Materializes `node` under `parent`, before the live child currently at `index` (or at the end).
	///
	/// # Panics
	///
	/// Iff the host refuses to create an element or to insert a node.
	/// Neither happens with valid tag names and a `parent` that is an element.
	pub fn mount(&mut self, node: Node<D::Event>, parent: &D::Node, index: Option<usize>) -> MountedId {
		let span = trace_span!("Mounting", ?index);
		let _enter = span.enter();

		let reference = index.and_then(|index| self.document.child_at(parent, index));
		let id = self.mount_before(node, parent, reference.as_ref());
		self.remember_anchor(id, reference);
		trace!("Mounted node count/listener count: {}/{}", self.arena.len(), self.listeners.len());
		id
	}

	pub(crate) fn mount_before(&mut self, node: Node<D::Event>, parent: &D::Node, reference: Option<&D::Node>) -> MountedId {
		match node {
			Node::Text(value) => {
				let span = trace_span!("Creating text node", value = ?Sensitive(&value));
				let _enter = span.enter();

				let live = self.document.create_text_node(&value);
				self.insert(parent, &live, reference);
				self.arena.insert(Mounted::Text { value, live })
			}
			Node::Element(element) => self.mount_element(element, parent, reference),
			Node::Fragment(children) => {
				let span = trace_span!("Mounting fragment", "children.len()" = children.len());
				let _enter = span.enter();

				let children = children.into_iter().map(|child| self.mount_before(child, parent, reference)).collect();
				self.arena.insert(Mounted::Fragment { children })
			}
		}
	}

	fn mount_element(&mut self, element: Element<D::Event>, parent: &D::Node, reference: Option<&D::Node>) -> MountedId {
		let Element { tag, key, props, on, children } = element;
		let span = trace_span!("Creating element", tag = &*tag, ?key);
		let _enter = span.enter();

		let live = self
			.document
			.create_element(&tag)
			.unwrap_or_else(|error| panic!("Failed to create element {:?}: {:?}", tag, error));
		update_props(&self.document, &live, &Props::default(), &props);
		let listeners = self.listeners.add_listeners(&self.document, &on, &live);
		let children = children.into_iter().map(|child| self.mount_before(child, &live, None)).collect();

		// Attach last, so that the subtree is complete once it becomes visible.
		self.insert(parent, &live, reference);
		self.arena.insert(Mounted::Element {
			tag,
			key,
			props,
			listeners,
			children,
			live,
		})
	}

	pub(crate) fn insert(&self, parent: &D::Node, child: &D::Node, reference: Option<&D::Node>) {
		if let Err(error) = self.document.insert_before(parent, child, reference) {
			panic!("Failed to insert {:?} into {:?}: {:?}", child, parent, error);
		}
	}
}
