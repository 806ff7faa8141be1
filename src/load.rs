//! Reads live nodes back into virtual ones.
//!
//! Properties and listeners aren't observable through a [`Document`], so only tag names, attributes and text are loaded. `class` and `style` end up in their own prop categories.
//! Attributes are sorted by name, which makes loaded trees comparable regardless of the order in which they were set.

use crate::{
	host::Document,
	vdom::{Element, Node},
};
use tracing::warn;

pub fn load_child_nodes<D: Document>(document: &D, parent: &D::Node) -> Vec<Node<D::Event>> {
	document.child_nodes(parent).iter().filter_map(|child| load_node(document, child)).collect()
}

/// Returns [`None`] for nodes that are neither elements nor text.
pub fn load_node<D: Document>(document: &D, node: &D::Node) -> Option<Node<D::Event>> {
	if let Some(tag) = document.tag_name(node) {
		Some(load_element(document, node, tag).into())
	} else if let Some(text) = document.text(node) {
		Some(Node::Text(text.into()))
	} else {
		warn!("Unrecognised child node: {:?}", node);
		None
	}
}

fn load_element<D: Document>(document: &D, element: &D::Node, tag: String) -> Element<D::Event> {
	let mut attributes = document.attributes(element);
	attributes.sort();
	attributes
		.into_iter()
		.fold(Element::new(tag), |loaded, (name, value)| loaded.attr(name, value))
		.children(load_child_nodes(document, element))
}
