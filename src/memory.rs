//! An in-memory [`Document`], used natively and in tests.
//!
//! A document created with [`MemoryDocument::recording`] records every mutating host call as a [`Mutation`],
//! so tests can assert exactly what a patch did to it.

use crate::{
	host::{Document, NativeCallback},
	vdom::Value,
};
use core::fmt::{self, Debug, Formatter, Write as _};
use hashbrown::{HashMap, HashSet};
use std::{cell::RefCell, collections::BTreeMap, rc::Rc};
use thiserror::Error;
use tracing::{trace, warn};

/// Identifies a node of a [`MemoryDocument`].
///
/// Slots of [released](`Document::release`) nodes are reused, but a handle to a released node never refers to its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef {
	index: u32,
	generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// A synthetic event, delivered by [`MemoryDocument::dispatch_event`].
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
	pub name: String,
	/// Stands in for `event.target.value` or `event.key`, depending on the event.
	pub value: Option<String>,
	/// Set on dispatch.
	pub target: Option<NodeRef>,
}
impl Event {
	#[must_use]
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: None,
			target: None,
		}
	}

	#[must_use]
	pub fn with_value(mut self, value: impl Into<String>) -> Self {
		self.value = Some(value.into());
		self
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	CreateElement { node: NodeRef, tag: String },
	CreateText { node: NodeRef },
	SetText { node: NodeRef },
	SetAttribute { node: NodeRef, name: String },
	RemoveAttribute { node: NodeRef, name: String },
	SetProperty { node: NodeRef, name: String },
	RemoveProperty { node: NodeRef, name: String },
	SetClass { node: NodeRef },
	RemoveClass { node: NodeRef },
	SetStyle { node: NodeRef, name: String },
	RemoveStyle { node: NodeRef, name: String },
	/// Also recorded for moves.
	Insert { parent: NodeRef, child: NodeRef },
	Remove { parent: NodeRef, child: NodeRef },
	AddListener { node: NodeRef, event: String },
	RemoveListener { node: NodeRef, event: String },
}
impl Mutation {
	#[must_use]
	pub fn is_creation(&self) -> bool {
		matches!(self, Mutation::CreateElement { .. } | Mutation::CreateText { .. })
	}
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryError {
	#[error("invalid tag name {0:?}")]
	InvalidTagName(String),
	#[error("{0:?} is not an element")]
	NotAnElement(NodeRef),
	#[error("{child:?} is not a child of {parent:?}")]
	NotAChild { parent: NodeRef, child: NodeRef },
	#[error("{child:?} can't be inserted into {parent:?}")]
	HierarchyRequest { parent: NodeRef, child: NodeRef },
	#[error("listener {0:?} is not attached")]
	UnknownListener(ListenerId),
	#[error("{0:?} was released")]
	Released(NodeRef),
}

#[derive(Default)]
struct ElementData {
	tag: String,
	attributes: BTreeMap<String, String>,
	properties: BTreeMap<String, Value>,
	class: Option<String>,
	style: BTreeMap<String, String>,
}

enum Data {
	Element(ElementData),
	Text(String),
}

struct NodeData {
	data: Data,
	parent: Option<NodeRef>,
	children: Vec<NodeRef>,
}

struct Binding {
	node: NodeRef,
	event: String,
	callback: NativeCallback<Event>,
}

struct Slot {
	generation: u32,
	node: Option<NodeData>,
}

#[derive(Default)]
struct Inner {
	slots: Vec<Slot>,
	free: Vec<u32>,
	listeners: HashMap<ListenerId, Binding>,
	next_listener: u64,
	recording: bool,
	mutations: Vec<Mutation>,
}
impl Inner {
	fn create(&mut self, data: Data) -> NodeRef {
		let node = NodeData { data, parent: None, children: Vec::new() };
		if let Some(index) = self.free.pop() {
			let slot = &mut self.slots[index as usize];
			slot.node = Some(node);
			return NodeRef { index, generation: slot.generation };
		}
		let index = u32::try_from(self.slots.len()).expect("Too many nodes in `MemoryDocument`");
		self.slots.push(Slot { generation: 0, node: Some(node) });
		NodeRef { index, generation: 0 }
	}

	fn get(&self, node: NodeRef) -> Option<&NodeData> {
		self.slots.get(node.index as usize).filter(|slot| slot.generation == node.generation)?.node.as_ref()
	}

	fn get_mut(&mut self, node: NodeRef) -> Option<&mut NodeData> {
		self.slots.get_mut(node.index as usize).filter(|slot| slot.generation == node.generation)?.node.as_mut()
	}

	fn node(&self, node: NodeRef) -> Result<&NodeData, MemoryError> {
		self.get(node).ok_or(MemoryError::Released(node))
	}

	fn element_mut(&mut self, node: NodeRef) -> Result<&mut ElementData, MemoryError> {
		match &mut self.get_mut(node).ok_or(MemoryError::Released(node))?.data {
			Data::Element(element) => Ok(element),
			Data::Text(_) => Err(MemoryError::NotAnElement(node)),
		}
	}

	fn element(&self, node: NodeRef) -> Option<&ElementData> {
		match &self.get(node)?.data {
			Data::Element(element) => Some(element),
			Data::Text(_) => None,
		}
	}

	fn parent(&self, node: NodeRef) -> Option<NodeRef> {
		self.get(node)?.parent
	}

	fn is_inclusive_ancestor(&self, ancestor: NodeRef, mut node: NodeRef) -> bool {
		loop {
			if node == ancestor {
				return true;
			}
			match self.parent(node) {
				Some(parent) => node = parent,
				None => return false,
			}
		}
	}

	fn detach(&mut self, child: NodeRef) {
		if let Some(parent) = self.get_mut(child).and_then(|data| data.parent.take()) {
			if let Some(parent) = self.get_mut(parent) {
				parent.children.retain(|&c| c != child);
			}
		}
	}

	/// Frees `root` and its descendants along with any listeners still bound to them.
	fn release(&mut self, root: NodeRef) -> usize {
		let mut released = HashSet::new();
		let mut pending = vec![root];
		while let Some(node) = pending.pop() {
			if self.get(node).is_none() {
				continue;
			}
			let slot = &mut self.slots[node.index as usize];
			if let Some(data) = slot.node.take() {
				slot.generation = slot.generation.wrapping_add(1);
				self.free.push(node.index);
				pending.extend(data.children);
				released.insert(node);
			}
		}
		self.listeners.retain(|_, binding| !released.contains(&binding.node));
		released.len()
	}

	fn node_count(&self) -> usize {
		self.slots.len() - self.free.len()
	}
}

/// A cheaply clonable handle to a shared in-memory document.
///
/// Detached nodes stay valid until they are [released](`Document::release`).
/// Queries about a released node answer as if it were an empty, detached one.
#[derive(Clone)]
pub struct MemoryDocument {
	inner: Rc<RefCell<Inner>>,
	body: NodeRef,
}
impl MemoryDocument {
	/// A document with an empty body that doesn't record [`Mutation`]s.
	#[must_use]
	pub fn new() -> Self {
		let mut inner = Inner::default();
		let body = inner.create(Data::Element(ElementData {
			tag: "body".to_owned(),
			..ElementData::default()
		}));
		Self {
			inner: Rc::new(RefCell::new(inner)),
			body,
		}
	}

	/// A document with an empty body that records [`Mutation`]s until they are [taken](`MemoryDocument::take_mutations`).
	#[must_use]
	pub fn recording() -> Self {
		let document = Self::new();
		document.inner.borrow_mut().recording = true;
		document
	}

	#[must_use]
	pub fn is_recording(&self) -> bool {
		self.inner.borrow().recording
	}

	/// How many nodes are allocated, including the body and detached nodes that weren't released yet.
	#[must_use]
	pub fn node_count(&self) -> usize {
		self.inner.borrow().node_count()
	}

	/// The root element, which is never recorded as created.
	#[must_use]
	pub fn body(&self) -> NodeRef {
		self.body
	}

	fn log(&self, mutation: Mutation) {
		trace!(?mutation, "Document mutation.");
		let mut inner = self.inner.borrow_mut();
		if inner.recording {
			inner.mutations.push(mutation);
		}
	}

	/// All mutations since creation or the last [`take_mutations`](`MemoryDocument::take_mutations`).
	/// Always empty unless the document is [recording](`MemoryDocument::recording`).
	#[must_use]
	pub fn mutations(&self) -> Vec<Mutation> {
		self.inner.borrow().mutations.clone()
	}

	pub fn take_mutations(&self) -> Vec<Mutation> {
		std::mem::take(&mut self.inner.borrow_mut().mutations)
	}

	#[must_use]
	pub fn attribute(&self, element: NodeRef, name: &str) -> Option<String> {
		self.inner.borrow().element(element)?.attributes.get(name).cloned()
	}

	#[must_use]
	pub fn property(&self, element: NodeRef, name: &str) -> Option<Value> {
		self.inner.borrow().element(element)?.properties.get(name).cloned()
	}

	#[must_use]
	pub fn class_name(&self, element: NodeRef) -> Option<String> {
		self.inner.borrow().element(element)?.class.clone()
	}

	#[must_use]
	pub fn style_property(&self, element: NodeRef, name: &str) -> Option<String> {
		self.inner.borrow().element(element)?.style.get(name).cloned()
	}

	/// The number of listeners attached directly to `node`.
	#[must_use]
	pub fn listener_count(&self, node: NodeRef) -> usize {
		self.inner.borrow().listeners.values().filter(|binding| binding.node == node).count()
	}

	#[must_use]
	pub fn total_listener_count(&self) -> usize {
		self.inner.borrow().listeners.len()
	}

	/// Delivers `event` to the matching listeners of `target` and then of its ancestors (bubbling),
	/// in registration order per node.
	///
	/// No borrow of the document is held while listeners run, so they may mutate it.
	/// Returns how many listeners were called.
	pub fn dispatch_event(&self, target: NodeRef, mut event: Event) -> usize {
		event.target = Some(target);
		let callbacks = {
			let inner = self.inner.borrow();
			let mut path = Vec::new();
			let mut node = Some(target);
			while let Some(current) = node {
				path.push(current);
				node = inner.parent(current);
			}

			let mut callbacks = Vec::new();
			for node in path {
				let mut bindings = inner.listeners.iter().filter(|(_, binding)| binding.node == node && binding.event == event.name).collect::<Vec<_>>();
				bindings.sort_by_key(|(id, _)| **id);
				callbacks.extend(bindings.into_iter().map(|(_, binding)| binding.callback.clone()));
			}
			callbacks
		};

		for callback in &callbacks {
			callback(&event);
		}
		callbacks.len()
	}

	/// Serializes `node` and its descendants as HTML. Properties are not included.
	#[must_use]
	pub fn outer_html(&self, node: NodeRef) -> String {
		let mut html = String::new();
		self.write_html(node, &mut html);
		html
	}

	/// Serializes the children of `node` as HTML.
	#[must_use]
	pub fn inner_html(&self, node: NodeRef) -> String {
		let mut html = String::new();
		for child in self.child_nodes(&node) {
			self.write_html(child, &mut html);
		}
		html
	}

	fn write_html(&self, node: NodeRef, html: &mut String) {
		let (tag, children) = {
			let inner = self.inner.borrow();
			let data = match inner.get(node) {
				Some(data) => data,
				None => return,
			};
			match &data.data {
				Data::Text(text) => {
					escape_into(text, html);
					return;
				}
				Data::Element(element) => (element.tag.clone(), data.children.clone()),
			}
		};

		html.push('<');
		html.push_str(&tag);
		for (name, value) in self.attributes(&node) {
			write!(html, " {}=\"", name).expect("infallible");
			escape_into(&value, html);
			html.push('"');
		}
		html.push('>');
		for child in children {
			self.write_html(child, html);
		}
		write!(html, "</{}>", tag).expect("infallible");
	}
}
impl Default for MemoryDocument {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for MemoryDocument {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let inner = self.inner.borrow();
		f.debug_struct("MemoryDocument")
			.field("body", &self.body)
			.field("nodes", &inner.node_count())
			.field("listeners", &inner.listeners.len())
			.field("recording", &inner.recording)
			.finish()
	}
}

fn escape_into(text: &str, html: &mut String) {
	for c in text.chars() {
		match c {
			'&' => html.push_str("&amp;"),
			'<' => html.push_str("&lt;"),
			'>' => html.push_str("&gt;"),
			'"' => html.push_str("&quot;"),
			c => html.push(c),
		}
	}
}

fn is_valid_tag_name(tag: &str) -> bool {
	let mut chars = tag.chars();
	matches!(chars.next(), Some(first) if first.is_ascii_alphabetic()) && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

impl Document for MemoryDocument {
	type Node = NodeRef;
	type Event = Event;
	type Listener = ListenerId;
	type Error = MemoryError;

	fn create_element(&self, tag: &str) -> Result<NodeRef, MemoryError> {
		if !is_valid_tag_name(tag) {
			return Err(MemoryError::InvalidTagName(tag.to_owned()));
		}
		let node = self.inner.borrow_mut().create(Data::Element(ElementData {
			tag: tag.to_ascii_lowercase(),
			..ElementData::default()
		}));
		self.log(Mutation::CreateElement { node, tag: tag.to_owned() });
		Ok(node)
	}

	fn create_text_node(&self, data: &str) -> NodeRef {
		let node = self.inner.borrow_mut().create(Data::Text(data.to_owned()));
		self.log(Mutation::CreateText { node });
		node
	}

	fn set_text(&self, text: &NodeRef, data: &str) {
		let updated = match self.inner.borrow_mut().get_mut(*text).map(|node| &mut node.data) {
			Some(Data::Text(value)) => {
				data.clone_into(value);
				true
			}
			Some(Data::Element(_)) | None => false,
		};
		if updated {
			self.log(Mutation::SetText { node: *text });
		} else {
			warn!("Tried to set the text of {:?}, which is not a text node (anymore).", text);
		}
	}

	fn text(&self, node: &NodeRef) -> Option<String> {
		match &self.inner.borrow().get(*node)?.data {
			Data::Text(text) => Some(text.clone()),
			Data::Element(_) => None,
		}
	}

	fn tag_name(&self, node: &NodeRef) -> Option<String> {
		self.inner.borrow().element(*node).map(|element| element.tag.clone())
	}

	fn attributes(&self, element: &NodeRef) -> Vec<(String, String)> {
		match self.inner.borrow().element(*element) {
			None => Vec::new(),
			Some(element) => {
				let mut attributes = element.attributes.clone();
				if let Some(class) = &element.class {
					attributes.insert("class".to_owned(), class.clone());
				}
				if !element.style.is_empty() {
					let style = element.style.iter().map(|(name, value)| format!("{}: {};", name, value)).collect::<Vec<_>>().join(" ");
					attributes.insert("style".to_owned(), style);
				}
				attributes.into_iter().collect()
			}
		}
	}

	fn set_attribute(&self, element: &NodeRef, name: &str, value: &str) -> Result<(), MemoryError> {
		self.inner.borrow_mut().element_mut(*element)?.attributes.insert(name.to_owned(), value.to_owned());
		self.log(Mutation::SetAttribute { node: *element, name: name.to_owned() });
		Ok(())
	}

	fn remove_attribute(&self, element: &NodeRef, name: &str) -> Result<(), MemoryError> {
		self.inner.borrow_mut().element_mut(*element)?.attributes.remove(name);
		self.log(Mutation::RemoveAttribute { node: *element, name: name.to_owned() });
		Ok(())
	}

	fn set_property(&self, element: &NodeRef, name: &str, value: &Value) -> Result<(), MemoryError> {
		self.inner.borrow_mut().element_mut(*element)?.properties.insert(name.to_owned(), value.clone());
		self.log(Mutation::SetProperty { node: *element, name: name.to_owned() });
		Ok(())
	}

	fn remove_property(&self, element: &NodeRef, name: &str) -> Result<(), MemoryError> {
		self.inner.borrow_mut().element_mut(*element)?.properties.remove(name);
		self.log(Mutation::RemoveProperty { node: *element, name: name.to_owned() });
		Ok(())
	}

	fn set_class_name(&self, element: &NodeRef, class: &str) -> Result<(), MemoryError> {
		self.inner.borrow_mut().element_mut(*element)?.class = Some(class.to_owned());
		self.log(Mutation::SetClass { node: *element });
		Ok(())
	}

	fn remove_class_name(&self, element: &NodeRef) -> Result<(), MemoryError> {
		self.inner.borrow_mut().element_mut(*element)?.class = None;
		self.log(Mutation::RemoveClass { node: *element });
		Ok(())
	}

	fn set_style_property(&self, element: &NodeRef, name: &str, value: &str) -> Result<(), MemoryError> {
		self.inner.borrow_mut().element_mut(*element)?.style.insert(name.to_owned(), value.to_owned());
		self.log(Mutation::SetStyle { node: *element, name: name.to_owned() });
		Ok(())
	}

	fn remove_style_property(&self, element: &NodeRef, name: &str) -> Result<(), MemoryError> {
		self.inner.borrow_mut().element_mut(*element)?.style.remove(name);
		self.log(Mutation::RemoveStyle { node: *element, name: name.to_owned() });
		Ok(())
	}

	fn parent_node(&self, node: &NodeRef) -> Option<NodeRef> {
		self.inner.borrow().parent(*node)
	}

	fn next_sibling(&self, node: &NodeRef) -> Option<NodeRef> {
		let inner = self.inner.borrow();
		let parent = inner.parent(*node)?;
		let siblings = &inner.get(parent)?.children;
		let index = siblings.iter().position(|sibling| sibling == node)?;
		siblings.get(index + 1).copied()
	}

	fn child_nodes(&self, parent: &NodeRef) -> Vec<NodeRef> {
		self.inner.borrow().get(*parent).map_or_else(Vec::new, |parent| parent.children.clone())
	}

	fn child_at(&self, parent: &NodeRef, index: usize) -> Option<NodeRef> {
		self.inner.borrow().get(*parent)?.children.get(index).copied()
	}

	fn insert_before(&self, parent: &NodeRef, child: &NodeRef, reference: Option<&NodeRef>) -> Result<(), MemoryError> {
		{
			let mut inner = self.inner.borrow_mut();
			inner.node(*child)?;
			if matches!(inner.node(*parent)?.data, Data::Text(_)) || inner.is_inclusive_ancestor(*child, *parent) {
				return Err(MemoryError::HierarchyRequest { parent: *parent, child: *child });
			}
			if let Some(&reference) = reference {
				if inner.parent(reference) != Some(*parent) {
					return Err(MemoryError::NotAChild { parent: *parent, child: reference });
				}
			}

			// Inserting a node before itself keeps it where it is.
			let reference = match reference {
				Some(reference) if reference == child => {
					let siblings = &inner.node(*parent)?.children;
					siblings.iter().position(|sibling| sibling == child).and_then(|index| siblings.get(index + 1)).copied()
				}
				reference => reference.copied(),
			};

			inner.detach(*child);
			if let Some(parent) = inner.get_mut(*parent) {
				let siblings = &mut parent.children;
				let index = reference.and_then(|reference| siblings.iter().position(|&sibling| sibling == reference)).unwrap_or(siblings.len());
				siblings.insert(index, *child);
			}
			if let Some(child) = inner.get_mut(*child) {
				child.parent = Some(*parent);
			}
		}
		self.log(Mutation::Insert { parent: *parent, child: *child });
		Ok(())
	}

	fn remove_child(&self, parent: &NodeRef, child: &NodeRef) -> Result<(), MemoryError> {
		{
			let mut inner = self.inner.borrow_mut();
			if inner.node(*child)?.parent != Some(*parent) {
				return Err(MemoryError::NotAChild { parent: *parent, child: *child });
			}
			inner.detach(*child);
		}
		self.log(Mutation::Remove { parent: *parent, child: *child });
		Ok(())
	}

	/// Frees `node` and its descendants, unless it's the body or still attached.
	fn release(&self, node: &NodeRef) {
		if *node == self.body {
			return warn!("Tried to release the body. Ignoring.");
		}
		let mut inner = self.inner.borrow_mut();
		match inner.get(*node) {
			None => return trace!("{:?} was already released.", node),
			Some(data) if data.parent.is_some() => return warn!("Not releasing {:?}, which is still attached.", node),
			Some(_) => (),
		}
		let released = inner.release(*node);
		trace!("Released {} node(s).", released);
	}

	fn add_event_listener(&self, target: &NodeRef, event: &str, callback: NativeCallback<Event>) -> Result<ListenerId, MemoryError> {
		let id = {
			let mut inner = self.inner.borrow_mut();
			inner.node(*target)?;
			let id = ListenerId(inner.next_listener);
			inner.next_listener += 1;
			inner.listeners.insert(
				id,
				Binding {
					node: *target,
					event: event.to_owned(),
					callback,
				},
			);
			id
		};
		self.log(Mutation::AddListener { node: *target, event: event.to_owned() });
		Ok(id)
	}

	fn remove_event_listener(&self, target: &NodeRef, event: &str, listener: ListenerId) -> Result<(), MemoryError> {
		{
			let mut inner = self.inner.borrow_mut();
			match inner.listeners.get(&listener) {
				Some(binding) if binding.node == *target && binding.event == event => {
					inner.listeners.remove(&listener);
				}
				_ => return Err(MemoryError::UnknownListener(listener)),
			}
		}
		self.log(Mutation::RemoveListener { node: *target, event: event.to_owned() });
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::Cell;

	#[test]
	fn insert_before_moves_existing_children() {
		let document = MemoryDocument::new();
		let body = document.body();
		let a = document.create_text_node("a");
		let b = document.create_text_node("b");
		let c = document.create_text_node("c");
		for node in [a, b, c] {
			document.insert_before(&body, &node, None).unwrap();
		}

		document.insert_before(&body, &c, Some(&a)).unwrap();
		assert_eq!(document.child_nodes(&body), vec![c, a, b]);

		document.insert_before(&body, &a, Some(&a)).unwrap();
		assert_eq!(document.child_nodes(&body), vec![c, a, b]);
		assert_eq!(document.next_sibling(&a), Some(b));
	}

	#[test]
	fn rejects_cycles_and_text_parents() {
		let document = MemoryDocument::new();
		let outer = document.create_element("div").unwrap();
		let inner = document.create_element("span").unwrap();
		let text = document.create_text_node("x");
		document.insert_before(&outer, &inner, None).unwrap();

		assert_eq!(document.insert_before(&inner, &outer, None), Err(MemoryError::HierarchyRequest { parent: inner, child: outer }));
		assert_eq!(document.insert_before(&text, &outer, None), Err(MemoryError::HierarchyRequest { parent: text, child: outer }));
		assert_eq!(document.create_element(""), Err(MemoryError::InvalidTagName(String::new())));
	}

	#[test]
	fn removing_a_detached_child_fails() {
		let document = MemoryDocument::new();
		let body = document.body();
		let text = document.create_text_node("x");
		assert_eq!(document.remove_child(&body, &text), Err(MemoryError::NotAChild { parent: body, child: text }));
	}

	#[test]
	fn events_bubble_in_registration_order() {
		let document = MemoryDocument::new();
		let body = document.body();
		let button = document.create_element("button").unwrap();
		document.insert_before(&body, &button, None).unwrap();

		let calls = Rc::new(RefCell::new(Vec::new()));
		for (node, label) in [(body, "body"), (button, "button 1"), (button, "button 2")] {
			let calls = calls.clone();
			document.add_event_listener(&node, "click", Rc::new(move |_: &Event| calls.borrow_mut().push(label))).unwrap();
		}

		assert_eq!(document.dispatch_event(button, Event::new("click")), 3);
		assert_eq!(*calls.borrow(), vec!["button 1", "button 2", "body"]);
		assert_eq!(document.dispatch_event(button, Event::new("input")), 0);
	}

	#[test]
	fn listeners_may_mutate_the_document() {
		let document = MemoryDocument::new();
		let body = document.body();
		let seen = Rc::new(Cell::new(None));
		let listener = {
			let document = document.clone();
			let seen = seen.clone();
			document.clone().add_event_listener(
				&body,
				"click",
				Rc::new(move |event: &Event| {
					let text = document.create_text_node(event.value.as_deref().unwrap_or_default());
					document.insert_before(&body, &text, None).unwrap();
					seen.set(event.target);
				}),
			)
		}
		.unwrap();

		document.dispatch_event(body, Event::new("click").with_value("clicked"));
		assert_eq!(seen.get(), Some(body));
		assert_eq!(document.inner_html(body), "clicked");

		document.remove_event_listener(&body, "click", listener).unwrap();
		assert_eq!(document.remove_event_listener(&body, "click", listener), Err(MemoryError::UnknownListener(listener)));
	}

	#[test]
	fn only_recording_documents_keep_mutations() {
		for (document, recorded) in [(MemoryDocument::new(), 0), (MemoryDocument::recording(), 2)] {
			let text = document.create_text_node("x");
			document.insert_before(&document.body(), &text, None).unwrap();
			assert_eq!(document.mutations().len(), recorded);
			assert_eq!(document.take_mutations().len(), recorded);
			assert!(document.mutations().is_empty());
		}
	}

	#[test]
	fn released_slots_are_reused_without_reviving_old_handles() {
		let document = MemoryDocument::new();
		let body = document.body();
		let div = document.create_element("div").unwrap();
		let text = document.create_text_node("x");
		document.insert_before(&div, &text, None).unwrap();
		document.add_event_listener(&text, "click", Rc::new(|_: &Event| ())).unwrap();
		document.insert_before(&body, &div, None).unwrap();

		document.release(&div);
		assert_eq!(document.node_count(), 3, "attached nodes are kept");

		document.remove_child(&body, &div).unwrap();
		document.release(&div);
		assert_eq!(document.node_count(), 1);
		assert_eq!(document.total_listener_count(), 0);

		let reused = document.create_text_node("y");
		let other = document.create_text_node("z");
		assert_eq!(document.inner.borrow().slots.len(), 3);
		assert!(reused != div && reused != text && other != div && other != text);
		assert_eq!(document.text(&text), None);
		assert_eq!(document.parent_node(&div), None);
		assert_eq!(document.insert_before(&body, &text, None), Err(MemoryError::Released(text)));

		document.release(&body);
		assert_eq!(document.node_count(), 3);
	}

	#[test]
	fn serializes_attributes_class_and_style() {
		let document = MemoryDocument::new();
		let div = document.create_element("div").unwrap();
		document.set_attribute(&div, "id", "main").unwrap();
		document.set_class_name(&div, "a b").unwrap();
		document.set_style_property(&div, "color", "red").unwrap();
		document.set_property(&div, "hidden", &Value::Bool(true)).unwrap();
		let text = document.create_text_node("<x>");
		document.insert_before(&div, &text, None).unwrap();

		assert_eq!(document.outer_html(div), r#"<div class="a b" id="main" style="color: red;">&lt;x&gt;</div>"#);
		assert_eq!(document.property(div, "hidden"), Some(Value::Bool(true)));
	}
}
