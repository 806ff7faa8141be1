#![allow(dead_code)]

use std::sync::Once;
use tracing_subscriber::EnvFilter;
use xylem_dom::{
	load::load_child_nodes,
	memory::{Event, MemoryDocument, NodeRef},
	Document, Node,
};

static INIT: Once = Once::new();

/// Captures logs per test. Set `RUST_LOG` (for example to `xylem_dom=trace`) to see them.
pub fn init() {
	INIT.call_once(|| {
		tracing_subscriber::fmt()
			.with_env_filter(EnvFilter::from_default_env())
			.with_test_writer()
			.init();
	});
}

pub fn loaded(document: &MemoryDocument, parent: NodeRef) -> Vec<Node<Event>> {
	load_child_nodes(document, &parent)
}

/// The text content of each child of `parent`.
pub fn texts(document: &MemoryDocument, parent: NodeRef) -> Vec<String> {
	document.child_nodes(&parent).iter().map(|child| text_content(document, *child)).collect()
}

pub fn text_content(document: &MemoryDocument, node: NodeRef) -> String {
	match document.text(&node) {
		Some(text) => text,
		None => document.child_nodes(&node).iter().map(|child| text_content(document, *child)).collect(),
	}
}
