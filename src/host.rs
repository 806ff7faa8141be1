//! The live document the differ drives.
//!
//! A [`Document`] is a cheap handle (cloning it must not clone the document itself).
//! Its [`Node`](`Document::Node`)s are handles too, and comparing two of them with [`PartialEq`] must tell whether they refer to the same live node.

use crate::vdom::Value;
use core::fmt::Debug;
use std::rc::Rc;

/// A native callback as registered with the host.
pub type NativeCallback<E> = Rc<dyn Fn(&E)>;

pub trait Document: Clone + 'static {
	type Node: Clone + PartialEq + Debug;
	type Event: 'static;
	/// Whatever the host needs to later remove a listener again.
	type Listener;
	type Error: Debug;

	/// # Errors
	///
	/// Iff the host refuses to create an element with this tag name.
	fn create_element(&self, tag: &str) -> Result<Self::Node, Self::Error>;
	fn create_text_node(&self, data: &str) -> Self::Node;
	fn set_text(&self, text: &Self::Node, data: &str);

	/// The data of a text node, or [`None`] for other nodes.
	fn text(&self, node: &Self::Node) -> Option<String>;
	/// The lower-case tag name of an element, or [`None`] for other nodes.
	fn tag_name(&self, node: &Self::Node) -> Option<String>;
	/// All attributes of an element as they would be serialized, including `class` and `style`.
	fn attributes(&self, element: &Self::Node) -> Vec<(String, String)>;

	/// # Errors
	fn set_attribute(&self, element: &Self::Node, name: &str, value: &str) -> Result<(), Self::Error>;
	/// # Errors
	fn remove_attribute(&self, element: &Self::Node, name: &str) -> Result<(), Self::Error>;

	/// # Errors
	fn set_property(&self, element: &Self::Node, name: &str, value: &Value) -> Result<(), Self::Error>;
	/// Resets the property to its default.
	///
	/// # Errors
	fn remove_property(&self, element: &Self::Node, name: &str) -> Result<(), Self::Error>;

	/// # Errors
	fn set_class_name(&self, element: &Self::Node, class: &str) -> Result<(), Self::Error> {
		self.set_attribute(element, "class", class)
	}
	/// # Errors
	fn remove_class_name(&self, element: &Self::Node) -> Result<(), Self::Error> {
		self.remove_attribute(element, "class")
	}

	/// # Errors
	fn set_style_property(&self, element: &Self::Node, name: &str, value: &str) -> Result<(), Self::Error>;
	/// # Errors
	fn remove_style_property(&self, element: &Self::Node, name: &str) -> Result<(), Self::Error>;

	fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;
	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;
	fn child_nodes(&self, parent: &Self::Node) -> Vec<Self::Node>;
	fn child_at(&self, parent: &Self::Node, index: usize) -> Option<Self::Node> {
		self.child_nodes(parent).into_iter().nth(index)
	}

	/// Inserts (or moves) `child` before `reference`, or appends it if `reference` is [`None`].
	///
	/// # Errors
	fn insert_before(&self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>) -> Result<(), Self::Error>;
	/// # Errors
	///
	/// Iff `child` isn't a child of `parent`.
	fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), Self::Error>;
	/// Called with each detached node the differ is done with. The host may reclaim it and its descendants.
	///
	/// Garbage-collected hosts don't need to do anything here.
	fn release(&self, _node: &Self::Node) {}

	/// # Errors
	fn add_event_listener(&self, target: &Self::Node, event: &str, callback: NativeCallback<Self::Event>) -> Result<Self::Listener, Self::Error>;
	/// # Errors
	///
	/// May fail iff the listener isn't (or is no longer) attached.
	fn remove_event_listener(&self, target: &Self::Node, event: &str, listener: Self::Listener) -> Result<(), Self::Error>;
}
