use crate::{
	arena::{Arena, Mounted, MountedId},
	host::Document,
	listeners::ListenerRegistry,
	vdom::{lookup, Element, Node, Props},
	Sensitive,
};
use core::{
	fmt::{self, Debug, Formatter},
	mem,
};
use hashbrown::HashMap;
use std::borrow::Cow;
use tracing::{error, info, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

/// How reused keyed children are brought into their new order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReorderStrategy {
	/// Keeps the longest subsequence of reused children that is still in relative order in place and moves only the others.
	#[default]
	Minimal,
	/// Moves each reused child that isn't already directly in front of its new successor.
	Naive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DifferOptions {
	pub reorder: ReorderStrategy,
}

/// Owns the mounted-node arena and listener registry for trees mounted into one [`Document`].
///
/// # Correct Use
///
/// Every [`MountedId`] returned by [`mount`](`DomDiffer::mount`) or [`patch`](`DomDiffer::patch`) stays valid until it is passed to
/// [`patch`](`DomDiffer::patch`) (which returns its successor, often the same handle) or [`destroy`](`DomDiffer::destroy`).
/// Patching a handle that is no longer valid is a bug in the caller and panics.
///
/// The live nodes of a mounted tree must not be rearranged by other code in the meantime,
/// though other nodes may be added and removed around them.
pub struct DomDiffer<D: Document> {
	pub(crate) document: D,
	pub(crate) arena: Arena<D>,
	pub(crate) listeners: ListenerRegistry<D>,
	pub(crate) options: DifferOptions,
	/// Where each mounted root without live nodes would be, as the live node following it.
	pub(crate) root_anchors: HashMap<MountedId, D::Node>,
}
impl<D: Document> Debug for DomDiffer<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("DomDiffer")
			.field("mounted", &self.arena.len())
			.field("listeners", &self.listeners.len())
			.field("options", &self.options)
			.finish_non_exhaustive()
	}
}
impl<D: Document> DomDiffer<D> {
	#[must_use]
	pub fn new(document: D) -> Self {
		Self::with_options(document, DifferOptions::default())
	}

	#[must_use]
	pub fn with_options(document: D, options: DifferOptions) -> Self {
		Self {
			document,
			arena: Arena::new(),
			listeners: ListenerRegistry::new(),
			options,
			root_anchors: HashMap::new(),
		}
	}

	#[must_use]
	pub fn document(&self) -> &D {
		&self.document
	}

	#[must_use]
	pub fn options(&self) -> DifferOptions {
		self.options
	}

	/// How many mounted nodes (including fragments) are currently tracked.
	#[must_use]
	pub fn mounted_count(&self) -> usize {
		self.arena.len()
	}

	/// How many native listeners are currently attached through this differ.
	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}

	#[must_use]
	pub fn is_mounted(&self, id: MountedId) -> bool {
		self.arena.get(id).is_some()
	}

	/// The live node of a mounted text or element node. Fragments don't have one.
	#[must_use]
	pub fn live_node(&self, id: MountedId) -> Option<&D::Node> {
		match self.arena.get(id)? {
			Mounted::Text { live, .. } | Mounted::Element { live, .. } => Some(live),
			Mounted::Fragment { .. } => None,
		}
	}

	/// All live nodes `id` contributes to its parent, in document order.
	#[must_use]
	pub fn live_nodes(&self, id: MountedId) -> Vec<D::Node> {
		let mut nodes = Vec::new();
		self.collect_live(id, &mut nodes);
		nodes
	}

	/// The mounted children of an element or fragment.
	#[must_use]
	pub fn children(&self, id: MountedId) -> &[MountedId] {
		match self.arena.get(id) {
			Some(Mounted::Element { children, .. } | Mounted::Fragment { children }) => children,
			Some(Mounted::Text { .. }) | None => &[],
		}
	}

	fn collect_live(&self, id: MountedId, into: &mut Vec<D::Node>) {
		match self.arena.get(id) {
			Some(Mounted::Text { live, .. } | Mounted::Element { live, .. }) => into.push(live.clone()),
			Some(Mounted::Fragment { children }) => {
				for &child in children {
					self.collect_live(child, into);
				}
			}
			None => (),
		}
	}

	pub(crate) fn first_live(&self, id: MountedId) -> Option<D::Node> {
		match self.arena.get(id)? {
			Mounted::Text { live, .. } | Mounted::Element { live, .. } => Some(live.clone()),
			Mounted::Fragment { children } => children.iter().find_map(|&child| self.first_live(child)),
		}
	}

	pub(crate) fn last_live(&self, id: MountedId) -> Option<D::Node> {
		match self.arena.get(id)? {
			Mounted::Text { live, .. } | Mounted::Element { live, .. } => Some(live.clone()),
			Mounted::Fragment { children } => children.iter().rev().find_map(|&child| self.last_live(child)),
		}
	}

	/// The live node right after the region occupied by `children`, or `next` if they have no live nodes.
	pub(crate) fn region_end(&self, children: &[MountedId], next: Option<&D::Node>) -> Option<D::Node> {
		match children.iter().rev().find_map(|&child| self.last_live(child)) {
			Some(last) => self.document.next_sibling(&last),
			None => next.cloned(),
		}
	}

	/// Reconciles the mounted tree `old` with `new` in place and returns the handle of the result.
	///
	/// The returned handle is `old` unless the root had to be replaced.
	///
	/// # Panics
	///
	/// Iff `old` isn't mounted, or on the contract violations listed for [`mount`](`DomDiffer::mount`).
	pub fn patch(&mut self, old: MountedId, new: Node<D::Event>, parent: &D::Node) -> MountedId {
		let span = trace_span!("Patching", ?old);
		let _enter = span.enter();

		let next = match self.last_live(old) {
			Some(last) => self.document.next_sibling(&last),
			None => self.root_anchors.remove(&old).filter(|anchor| self.document.parent_node(anchor).as_ref() == Some(parent)),
		};
		let patched = self.patch_node(old, new, parent, next.as_ref());
		self.remember_anchor(patched, next);

		info!("Mounted node count/listener count: {}/{}", self.arena.len(), self.listeners.len());
		patched
	}

	/// Keeps an empty root in place between patches, since it has no live node to be found by.
	pub(crate) fn remember_anchor(&mut self, root: MountedId, next: Option<D::Node>) {
		match next {
			Some(next) if self.first_live(root).is_none() => {
				trace!("Remembering the position of empty root {:?}.", root);
				self.root_anchors.insert(root, next);
			}
			_ => {
				self.root_anchors.remove(&root);
			}
		}
	}

	/// `next` is the live node that follows `old`'s region once its siblings are in place.
	/// It's only used if `old` has no live nodes of its own to position against.
	pub(crate) fn patch_node(&mut self, old: MountedId, new: Node<D::Event>, parent: &D::Node, next: Option<&D::Node>) -> MountedId {
		let record = self.arena.get(old).unwrap_or_else(|| panic!("Tried to patch {:?}, which is not (or no longer) mounted.", old));
		let same = match (record, &new) {
			(Mounted::Text { .. }, Node::Text(_)) | (Mounted::Fragment { .. }, Node::Fragment(_)) => true,
			(Mounted::Element { tag, key, .. }, Node::Element(element)) => {
				if STATIC_MAX_LEVEL >= Level::WARN && *tag != element.tag && tag.eq_ignore_ascii_case(&element.tag) {
					warn!("Recreating element due to different tag name casing: {:?} -> {:?}", tag, element.tag);
				}
				*tag == element.tag && *key == element.key
			}
			_ => false,
		};
		if !same {
			let span = trace_span!("Replacing mismatching", old = ?record.kind(), new = ?new.kind());
			let _enter = span.enter();
			return self.replace(old, new, parent, next);
		}

		match new {
			Node::Text(value) => self.update_text(old, value),
			Node::Element(element) => self.update_element(old, element),
			Node::Fragment(children) => {
				let span = trace_span!("Diffing fragment", "children.len()" = children.len());
				let _enter = span.enter();
				let previous = match self.arena.get_mut(old) {
					Some(Mounted::Fragment { children }) => mem::take(children),
					_ => unreachable!(),
				};
				let children = self.diff_children(previous, children, parent, next);
				if let Some(Mounted::Fragment { children: slot }) = self.arena.get_mut(old) {
					*slot = children;
				}
			}
		}
		old
	}

	/// Destroys `old` and mounts `new` where it was.
	fn replace(&mut self, old: MountedId, new: Node<D::Event>, parent: &D::Node, next: Option<&D::Node>) -> MountedId {
		let reference = match self.last_live(old) {
			Some(last) => self.document.next_sibling(&last),
			None => next.cloned(),
		};
		self.destroy(old);
		self.mount_before(new, parent, reference.as_ref())
	}

	fn update_text(&mut self, id: MountedId, value: Cow<'static, str>) {
		let span = trace_span!("Diffing text node", value = ?Sensitive(&value));
		let _enter = span.enter();

		if let Some(Mounted::Text { value: current, live }) = self.arena.get_mut(id) {
			let drifted = STATIC_MAX_LEVEL >= Level::ERROR && self.document.text(live).map_or(false, |data| data != **current);
			if drifted {
				error!("Unexpected text data: Expected {:?}. Overwriting.", Sensitive(current));
			}
			if drifted || *current != value {
				self.document.set_text(live, &value);
				*current = value;
			}
		}
	}

	fn update_element(&mut self, id: MountedId, element: Element<D::Event>) {
		let Element { tag, key: _, props, on, children } = element;
		let span = trace_span!("Diffing element", tag = &*tag);
		let _enter = span.enter();

		let (live, previous_props, handles, previous_children) = match self.arena.get_mut(id) {
			Some(Mounted::Element { live, props, listeners, children, .. }) => (live.clone(), mem::take(props), mem::take(listeners), mem::take(children)),
			_ => unreachable!(),
		};

		update_props(&self.document, &live, &previous_props, &props);
		let handles = self.listeners.update_listeners(&self.document, handles, &on, &live);
		let children = self.diff_children(previous_children, children, &live, None);

		if let Some(Mounted::Element {
			props: props_slot,
			listeners,
			children: children_slot,
			..
		}) = self.arena.get_mut(id)
		{
			*props_slot = props;
			*listeners = handles;
			*children_slot = children;
		}
	}

	/// Reconciles a sibling list that occupies one contiguous region of `parent`'s live children.
	pub(crate) fn diff_children(&mut self, old: Vec<MountedId>, new: Vec<Node<D::Event>>, parent: &D::Node, next: Option<&D::Node>) -> Vec<MountedId> {
		if old.is_empty() && new.is_empty() {
			return Vec::new();
		}

		let keyed = new.iter().any(|node| node.key().is_some()) || old.iter().any(|&id| self.arena.get(id).and_then(Mounted::key).is_some());
		if keyed {
			self.diff_keyed(old, new, parent, next)
		} else {
			self.diff_positional(old, new, parent, next)
		}
	}

	fn diff_positional(&mut self, mut old: Vec<MountedId>, mut new: Vec<Node<D::Event>>, parent: &D::Node, next: Option<&D::Node>) -> Vec<MountedId> {
		let span = trace_span!("Diffing positional children", "old.len()" = old.len(), "new.len()" = new.len());
		let _enter = span.enter();

		let common = old.len().min(new.len());
		for removed in old.split_off(common) {
			self.destroy(removed);
		}

		let end = self.region_end(&old, next);
		let mut added = Vec::with_capacity(new.len() - common);
		for node in new.split_off(common) {
			added.push(self.mount_before(node, parent, end.as_ref()));
		}

		// Right to left, so that each pair knows its successor.
		let mut anchor = added.iter().find_map(|&id| self.first_live(id)).or(end);
		let mut patched = Vec::with_capacity(common + added.len());
		let pairs = old.into_iter().zip(new).collect::<Vec<_>>();
		for (id, node) in pairs.into_iter().rev() {
			let id = self.patch_node(id, node, parent, anchor.as_ref());
			if let Some(first) = self.first_live(id) {
				anchor = Some(first);
			}
			patched.push(id);
		}
		patched.reverse();
		patched.extend(added);
		patched
	}
}

/// Applies the difference between `old` and `new` to `element`.
///
/// Unchanged entries are not re-applied.
/// `class` and `style` are reconciled separately, so they must not also be touched as plain attributes.
fn is_categorized(name: &str) -> bool {
	name.eq_ignore_ascii_case("class") || name.eq_ignore_ascii_case("style")
}

pub(crate) fn update_props<D: Document>(document: &D, element: &D::Node, old: &Props, new: &Props) {
	for (name, value) in &old.attributes {
		if is_categorized(name) {
			continue;
		}
		if lookup(&new.attributes, name).is_none() {
			if let Err(error) = document.remove_attribute(element, name) {
				warn!("Could not remove attribute with name {:?}, value {:?}: {:?}", name, Sensitive(value), error);
			}
		}
	}
	for (name, value) in &new.attributes {
		if is_categorized(name) {
			warn!("Ignoring attribute {:?}, which is reconciled through its own prop category.", name);
			continue;
		}
		if lookup(&old.attributes, name) != Some(value) {
			if let Err(error) = document.set_attribute(element, name, value) {
				error!("Could not set attribute {:?}={:?}: {:?}", name, Sensitive(value), error);
			}
		}
	}

	for (name, _) in &old.properties {
		if lookup(&new.properties, name).is_none() {
			if let Err(error) = document.remove_property(element, name) {
				warn!("Could not reset property {:?}: {:?}", name, error);
			}
		}
	}
	for (name, value) in &new.properties {
		if lookup(&old.properties, name) != Some(value) {
			if let Err(error) = document.set_property(element, name, value) {
				error!("Could not set property {:?}: {:?}", name, error);
			}
		}
	}

	match (&old.class, &new.class) {
		(Some(_), None) => {
			if let Err(error) = document.remove_class_name(element) {
				warn!("Could not remove class: {:?}", error);
			}
		}
		(old, Some(class)) if old.as_ref() != Some(class) => {
			if let Err(error) = document.set_class_name(element, class) {
				error!("Could not set class {:?}: {:?}", class, error);
			}
		}
		_ => (),
	}

	for (name, _) in &old.style {
		if lookup(&new.style, name).is_none() {
			if let Err(error) = document.remove_style_property(element, name) {
				warn!("Could not remove style property {:?}: {:?}", name, error);
			}
		}
	}
	for (name, value) in &new.style {
		if lookup(&old.style, name) != Some(value) {
			if let Err(error) = document.set_style_property(element, name, value) {
				error!("Could not set style property {:?}: {:?}", name, error);
			}
		}
	}
}
