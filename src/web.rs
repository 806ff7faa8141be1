//! The browser [`Document`], on top of [`web_sys`].

use crate::{
	host::{Document, NativeCallback},
	vdom::Value,
};
use js_sys::{Function, Object, Reflect};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{CharacterData, Element, HtmlElement, Node, Text};

/// Wraps a [`web_sys::Document`].
#[derive(Debug, Clone)]
pub struct WebDocument {
	document: web_sys::Document,
}
impl WebDocument {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self { document }
	}

	/// The document of the current global `window`, if there is one.
	#[must_use]
	pub fn from_window() -> Option<Self> {
		web_sys::window()?.document().map(Self::new)
	}

	#[must_use]
	pub fn inner(&self) -> &web_sys::Document {
		&self.document
	}
}

fn element(node: &Node) -> Result<&Element, JsValue> {
	node.dyn_ref::<Element>().ok_or_else(|| JsValue::from_str("Expected an element."))
}

fn html_element(node: &Node) -> Result<&HtmlElement, JsValue> {
	node.dyn_ref::<HtmlElement>().ok_or_else(|| JsValue::from_str("Expected an HTML element."))
}

impl Document for WebDocument {
	type Node = Node;
	type Event = web_sys::Event;
	type Listener = Closure<dyn Fn(web_sys::Event)>;
	type Error = JsValue;

	fn create_element(&self, tag: &str) -> Result<Node, JsValue> {
		self.document.create_element(tag).map(Into::into)
	}

	fn create_text_node(&self, data: &str) -> Node {
		self.document.create_text_node(data).into()
	}

	fn set_text(&self, text: &Node, data: &str) {
		match text.dyn_ref::<CharacterData>() {
			Some(text) => text.set_data(data),
			None => text.set_text_content(Some(data)),
		}
	}

	fn text(&self, node: &Node) -> Option<String> {
		node.dyn_ref::<Text>().map(|text| text.data())
	}

	fn tag_name(&self, node: &Node) -> Option<String> {
		node.dyn_ref::<Element>().map(|element| element.tag_name().to_ascii_lowercase())
	}

	fn attributes(&self, node: &Node) -> Vec<(String, String)> {
		let attributes = match node.dyn_ref::<Element>() {
			Some(element) => element.attributes(),
			None => return Vec::new(),
		};
		(0..attributes.length()).filter_map(|i| attributes.item(i)).map(|attribute| (attribute.name(), attribute.value())).collect()
	}

	fn set_attribute(&self, node: &Node, name: &str, value: &str) -> Result<(), JsValue> {
		element(node)?.set_attribute(name, value)
	}

	fn remove_attribute(&self, node: &Node, name: &str) -> Result<(), JsValue> {
		element(node)?.remove_attribute(name)
	}

	fn set_property(&self, node: &Node, name: &str, value: &Value) -> Result<(), JsValue> {
		let value = match value {
			Value::Text(text) => JsValue::from_str(text),
			Value::Bool(flag) => JsValue::from_bool(*flag),
			Value::Number(number) => JsValue::from_f64(*number),
		};
		Reflect::set(node.unchecked_ref::<Object>(), &JsValue::from_str(name), &value).map(drop)
	}

	/// Assigns `null`, which resets the usual reflected properties (`value`, `checked`, `hidden`, …) to their empty state.
	fn remove_property(&self, node: &Node, name: &str) -> Result<(), JsValue> {
		Reflect::set(node.unchecked_ref::<Object>(), &JsValue::from_str(name), &JsValue::NULL).map(drop)
	}

	fn set_class_name(&self, node: &Node, class: &str) -> Result<(), JsValue> {
		element(node)?.set_class_name(class);
		Ok(())
	}

	fn remove_class_name(&self, node: &Node) -> Result<(), JsValue> {
		element(node)?.remove_attribute("class")
	}

	fn set_style_property(&self, node: &Node, name: &str, value: &str) -> Result<(), JsValue> {
		html_element(node)?.style().set_property(name, value)
	}

	fn remove_style_property(&self, node: &Node, name: &str) -> Result<(), JsValue> {
		html_element(node)?.style().remove_property(name).map(drop)
	}

	fn parent_node(&self, node: &Node) -> Option<Node> {
		node.parent_node()
	}

	fn next_sibling(&self, node: &Node) -> Option<Node> {
		node.next_sibling()
	}

	fn child_nodes(&self, parent: &Node) -> Vec<Node> {
		let child_nodes = parent.child_nodes();
		(0..child_nodes.length()).filter_map(|i| child_nodes.item(i)).collect()
	}

	fn child_at(&self, parent: &Node, index: usize) -> Option<Node> {
		parent.child_nodes().item(u32::try_from(index).ok()?)
	}

	fn insert_before(&self, parent: &Node, child: &Node, reference: Option<&Node>) -> Result<(), JsValue> {
		parent.insert_before(child, reference).map(drop)
	}

	fn remove_child(&self, parent: &Node, child: &Node) -> Result<(), JsValue> {
		parent.remove_child(child).map(drop)
	}

	fn add_event_listener(&self, target: &Node, event: &str, callback: NativeCallback<web_sys::Event>) -> Result<Self::Listener, JsValue> {
		let closure = Closure::wrap(Box::new(move |event: web_sys::Event| callback(&event)) as Box<dyn Fn(web_sys::Event)>);
		target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref::<Function>())?;
		Ok(closure)
	}

	fn remove_event_listener(&self, target: &Node, event: &str, listener: Self::Listener) -> Result<(), JsValue> {
		// `listener` is dropped (and the JS function invalidated) only after it is detached.
		target.remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref::<Function>())
	}
}
