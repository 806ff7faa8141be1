//! The virtual node model.
//!
//! A [`Node`] tree is plain data: it is created fresh on every render and consumed by
//! [`DomDiffer::mount`](`crate::DomDiffer::mount`) or [`DomDiffer::patch`](`crate::DomDiffer::patch`).
//! Nothing in here refers to live document nodes.

use core::fmt::{self, Debug, Display, Formatter};
use std::{borrow::Cow, rc::Rc};

/// An event handler as declared in a render.
///
/// Handlers are typically fresh closures on every render and are therefore never compared by identity.
pub type Handler<E> = Rc<dyn Fn(&E)>;

/// Sibling-scoped identity token used to pair children across renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Cow<'static, str>);
impl Key {
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for Key {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
impl From<&'static str> for Key {
	fn from(key: &'static str) -> Self {
		Self(Cow::Borrowed(key))
	}
}
impl From<String> for Key {
	fn from(key: String) -> Self {
		Self(Cow::Owned(key))
	}
}
macro_rules! integer_keys {
	($($integer:ty),*) => {$(
		impl From<$integer> for Key {
			fn from(key: $integer) -> Self {
				Self(Cow::Owned(key.to_string()))
			}
		}
	)*};
}
integer_keys!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// A value assigned to a live property (as opposed to an attribute).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Text(Cow<'static, str>),
	Bool(bool),
	Number(f64),
}
impl From<&'static str> for Value {
	fn from(text: &'static str) -> Self {
		Self::Text(Cow::Borrowed(text))
	}
}
impl From<String> for Value {
	fn from(text: String) -> Self {
		Self::Text(Cow::Owned(text))
	}
}
impl From<bool> for Value {
	fn from(flag: bool) -> Self {
		Self::Bool(flag)
	}
}
impl From<f64> for Value {
	fn from(number: f64) -> Self {
		Self::Number(number)
	}
}
impl From<i32> for Value {
	fn from(number: i32) -> Self {
		Self::Number(number.into())
	}
}

/// Everything on an element that is reconciled generically, i.e. without `key` and listeners.
///
/// Each category has its own reconciliation routine and host surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
	pub attributes: Vec<(Cow<'static, str>, Cow<'static, str>)>,
	pub properties: Vec<(Cow<'static, str>, Value)>,
	pub class: Option<Cow<'static, str>>,
	pub style: Vec<(Cow<'static, str>, Cow<'static, str>)>,
}
impl Props {
	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<&str> {
		lookup(&self.attributes, name).map(|value| &**value)
	}

	#[must_use]
	pub fn property(&self, name: &str) -> Option<&Value> {
		lookup(&self.properties, name)
	}

	#[must_use]
	pub fn style_property(&self, name: &str) -> Option<&str> {
		lookup(&self.style, name).map(|value| &**value)
	}
}

pub(crate) fn lookup<'a, V>(entries: &'a [(Cow<'static, str>, V)], name: &str) -> Option<&'a V> {
	entries.iter().find(|(n, _)| n == name).map(|(_, value)| value)
}

fn upsert<V>(entries: &mut Vec<(Cow<'static, str>, V)>, name: Cow<'static, str>, value: V) {
	match entries.iter_mut().find(|(n, _)| *n == name) {
		Some(entry) => entry.1 = value,
		None => entries.push((name, value)),
	}
}

/// Declared event listeners of an element, keyed by event name.
pub struct Listeners<E>(Vec<(Cow<'static, str>, Handler<E>)>);
impl<E> Listeners<E> {
	#[must_use]
	pub fn new() -> Self {
		Self(Vec::new())
	}

	/// Declares `handler` for `event`, replacing a previous declaration for the same event name.
	pub fn insert(&mut self, event: impl Into<Cow<'static, str>>, handler: Handler<E>) {
		upsert(&mut self.0, event.into(), handler);
	}

	#[must_use]
	pub fn get(&self, event: &str) -> Option<&Handler<E>> {
		lookup(&self.0, event)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Cow<'static, str>, &Handler<E>)> {
		self.0.iter().map(|(event, handler)| (event, handler))
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(|(event, _)| &**event)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl<E> Default for Listeners<E> {
	fn default() -> Self {
		Self::new()
	}
}
impl<E> Clone for Listeners<E> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}
impl<E> Debug for Listeners<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.names()).finish()
	}
}
/// Handlers can't be compared, so only the declared event names are.
impl<E> PartialEq for Listeners<E> {
	fn eq(&self, other: &Self) -> bool {
		self.names().eq(other.names())
	}
}

pub struct Element<E> {
	pub tag: Cow<'static, str>,
	pub key: Option<Key>,
	pub props: Props,
	pub on: Listeners<E>,
	pub children: Vec<Node<E>>,
}
impl<E> Element<E> {
	#[must_use]
	pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
		Self {
			tag: tag.into(),
			key: None,
			props: Props::default(),
			on: Listeners::new(),
			children: Vec::new(),
		}
	}

	#[must_use]
	pub fn key(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	/// Sets an attribute.
	///
	/// `class` replaces the [class string](`Element::class`) and `style` replaces all [style properties](`Element::style`) with the declarations it lists.
	#[must_use]
	pub fn attr(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Cow<'static, str>>) -> Self {
		let (name, value) = (name.into(), value.into());
		if name.eq_ignore_ascii_case("class") {
			self.props.class = Some(value);
		} else if name.eq_ignore_ascii_case("style") {
			self.props.style.clear();
			for declaration in value.split(';') {
				if let Some((property, value)) = declaration.split_once(':') {
					let property = property.trim();
					if !property.is_empty() {
						upsert(&mut self.props.style, property.to_owned().into(), value.trim().to_owned().into());
					}
				}
			}
		} else {
			upsert(&mut self.props.attributes, name, value);
		}
		self
	}

	#[must_use]
	pub fn prop(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
		upsert(&mut self.props.properties, name.into(), value.into());
		self
	}

	#[must_use]
	pub fn class(mut self, class: impl Into<Cow<'static, str>>) -> Self {
		self.props.class = Some(class.into());
		self
	}

	/// Sets the class string to the non-empty `classes`, joined by spaces.
	#[must_use]
	pub fn classes<I>(mut self, classes: I) -> Self
	where
		I: IntoIterator,
		I::Item: AsRef<str>,
	{
		let joined = classes.into_iter().filter(|class| !class.as_ref().is_empty()).fold(String::new(), |mut joined, class| {
			if !joined.is_empty() {
				joined.push(' ');
			}
			joined.push_str(class.as_ref());
			joined
		});
		self.props.class = Some(joined.into());
		self
	}

	#[must_use]
	pub fn style(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Cow<'static, str>>) -> Self {
		upsert(&mut self.props.style, name.into(), value.into());
		self
	}

	#[must_use]
	pub fn on(mut self, event: impl Into<Cow<'static, str>>, handler: impl 'static + Fn(&E)) -> Self {
		self.on.insert(event, Rc::new(handler));
		self
	}

	#[must_use]
	pub fn child(mut self, child: impl Into<Node<E>>) -> Self {
		self.children.push(child.into());
		self
	}

	/// Appends `child` if it is [`Some`].
	#[must_use]
	pub fn maybe_child(mut self, child: Option<impl Into<Node<E>>>) -> Self {
		self.children.extend(child.map(Into::into));
		self
	}

	#[must_use]
	pub fn children<I>(mut self, children: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<Node<E>>,
	{
		self.children.extend(children.into_iter().map(Into::into));
		self
	}
}
impl<E> Clone for Element<E> {
	fn clone(&self) -> Self {
		Self {
			tag: self.tag.clone(),
			key: self.key.clone(),
			props: self.props.clone(),
			on: self.on.clone(),
			children: self.children.clone(),
		}
	}
}
impl<E> Debug for Element<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Element")
			.field("tag", &self.tag)
			.field("key", &self.key)
			.field("props", &self.props)
			.field("on", &self.on)
			.field("children", &self.children)
			.finish()
	}
}
impl<E> PartialEq for Element<E> {
	fn eq(&self, other: &Self) -> bool {
		self.tag == other.tag && self.key == other.key && self.props == other.props && self.on == other.on && self.children == other.children
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
	Text,
	Element,
	Fragment,
}

pub enum Node<E> {
	Text(Cow<'static, str>),
	Element(Element<E>),
	/// Transparent grouping: the children's live nodes go directly into the parent.
	Fragment(Vec<Node<E>>),
}
impl<E> Node<E> {
	#[must_use]
	pub fn text(value: impl Into<Cow<'static, str>>) -> Self {
		Self::Text(value.into())
	}

	/// Starts building an element. Convert it with [`Into`] or [`Node::from`].
	#[must_use]
	pub fn element(tag: impl Into<Cow<'static, str>>) -> Element<E> {
		Element::new(tag)
	}

	#[must_use]
	pub fn fragment<I>(children: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<Node<E>>,
	{
		Self::Fragment(children.into_iter().map(Into::into).collect())
	}

	#[must_use]
	pub fn kind(&self) -> NodeKind {
		match self {
			Node::Text(_) => NodeKind::Text,
			Node::Element(_) => NodeKind::Element,
			Node::Fragment(_) => NodeKind::Fragment,
		}
	}

	/// Only elements carry keys.
	#[must_use]
	pub fn key(&self) -> Option<&Key> {
		match self {
			Node::Element(element) => element.key.as_ref(),
			Node::Text(_) | Node::Fragment(_) => None,
		}
	}

	/// The nodes that produce live children of this node, with nested fragments flattened.
	#[must_use]
	pub fn extract_children(&self) -> Vec<&Node<E>> {
		fn flatten<'a, E>(nodes: &'a [Node<E>], into: &mut Vec<&'a Node<E>>) {
			for node in nodes {
				match node {
					Node::Fragment(children) => flatten(children, into),
					Node::Text(_) | Node::Element(_) => into.push(node),
				}
			}
		}

		let mut children = Vec::new();
		match self {
			Node::Text(_) => (),
			Node::Element(Element { children: nodes, .. }) | Node::Fragment(nodes) => flatten(nodes, &mut children),
		}
		children
	}
}
impl<E> Clone for Node<E> {
	fn clone(&self) -> Self {
		match self {
			Node::Text(value) => Node::Text(value.clone()),
			Node::Element(element) => Node::Element(element.clone()),
			Node::Fragment(children) => Node::Fragment(children.clone()),
		}
	}
}
impl<E> Debug for Node<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Node::Text(value) => f.debug_tuple("Text").field(value).finish(),
			Node::Element(element) => Debug::fmt(element, f),
			Node::Fragment(children) => f.debug_tuple("Fragment").field(children).finish(),
		}
	}
}
impl<E> PartialEq for Node<E> {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Node::Text(a), Node::Text(b)) => a == b,
			(Node::Element(a), Node::Element(b)) => a == b,
			(Node::Fragment(a), Node::Fragment(b)) => a == b,
			_ => false,
		}
	}
}
impl<E> From<Element<E>> for Node<E> {
	fn from(element: Element<E>) -> Self {
		Node::Element(element)
	}
}
impl<E> From<&'static str> for Node<E> {
	fn from(text: &'static str) -> Self {
		Node::Text(Cow::Borrowed(text))
	}
}
impl<E> From<String> for Node<E> {
	fn from(text: String) -> Self {
		Node::Text(Cow::Owned(text))
	}
}
