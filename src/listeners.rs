//! Native event listener bookkeeping.
//!
//! Every declared handler lives in a shared slot, and the native listener is a trampoline calling whatever the slot currently holds.
//! This way a re-render can swap in the fresh closure for an event name without touching the native binding at all.

use crate::{
	host::Document,
	vdom::{Handler, Listeners},
};
use hashbrown::HashMap;
use std::{borrow::Cow, cell::RefCell, rc::Rc};
use tracing::{error, trace, trace_span, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(u64);

/// The bindings currently attached to one live element, in declaration order.
#[derive(Debug, Default)]
pub struct ListenerHandles(Vec<(Cow<'static, str>, BindingId)>);
impl ListenerHandles {
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

struct Binding<D: Document> {
	slot: Rc<RefCell<Handler<D::Event>>>,
	native: D::Listener,
}

pub struct ListenerRegistry<D: Document> {
	bindings: HashMap<BindingId, Binding<D>>,
	next_id: u64,
}
impl<D: Document> ListenerRegistry<D> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			bindings: HashMap::new(),
			next_id: 0,
		}
	}

	/// The number of native listeners this registry keeps attached.
	#[must_use]
	pub fn len(&self) -> usize {
		self.bindings.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.bindings.is_empty()
	}

	pub fn add_listeners(&mut self, document: &D, listeners: &Listeners<D::Event>, node: &D::Node) -> ListenerHandles {
		let mut handles = ListenerHandles::default();
		for (event, handler) in listeners.iter() {
			if let Some(id) = self.bind(document, node, event, handler.clone()) {
				handles.0.push((event.clone(), id));
			}
		}
		handles
	}

	/// Reconciles by event name: kept names only get their handler swapped, others are detached or attached.
	pub fn update_listeners(&mut self, document: &D, handles: ListenerHandles, listeners: &Listeners<D::Event>, node: &D::Node) -> ListenerHandles {
		let mut previous = handles.0;
		let mut handles = ListenerHandles::default();
		for (event, handler) in listeners.iter() {
			let kept = previous.iter().position(|(name, _)| name == event).map(|index| previous.swap_remove(index).1);
			match kept.and_then(|id| self.bindings.get(&id).map(|binding| (id, binding))) {
				Some((id, binding)) => {
					trace!(event = &**event, "Swapping handler.");
					*binding.slot.borrow_mut() = handler.clone();
					handles.0.push((event.clone(), id));
				}
				None => {
					if let Some(id) = self.bind(document, node, event, handler.clone()) {
						handles.0.push((event.clone(), id));
					}
				}
			}
		}
		self.remove_listeners(document, ListenerHandles(previous), node);
		handles
	}

	/// Detaches all `handles` from `node`.
	///
	/// Bindings that are already gone, or that the host no longer knows about, are skipped with a warning.
	pub fn remove_listeners(&mut self, document: &D, handles: ListenerHandles, node: &D::Node) {
		for (event, id) in handles.0 {
			let span = trace_span!("Removing listener", event = &*event, ?id);
			let _enter = span.enter();
			match self.bindings.remove(&id) {
				None => warn!("Tried to remove a listener binding that doesn't exist. Ignoring."),
				Some(Binding { slot: _, native }) => {
					if let Err(error) = document.remove_event_listener(node, &event, native) {
						warn!("Could not remove native listener (already detached?): {:?}", error);
					}
				}
			}
		}
	}

	fn bind(&mut self, document: &D, node: &D::Node, event: &str, handler: Handler<D::Event>) -> Option<BindingId> {
		let span = trace_span!("Adding listener", event);
		let _enter = span.enter();

		let slot = Rc::new(RefCell::new(handler));
		let trampoline = {
			let slot = slot.clone();
			Rc::new(move |event: &D::Event| {
				// Release the slot before calling, as the handler may cause a patch that swaps it.
				let handler = slot.borrow().clone();
				handler(event);
			})
		};

		match document.add_event_listener(node, event, trampoline) {
			Ok(native) => {
				let id = BindingId(self.next_id);
				self.next_id += 1;
				self.bindings.insert(id, Binding { slot, native });
				Some(id)
			}
			Err(error) => {
				error!("Failed to add event listener {:?}: {:?}", event, error);
				None
			}
		}
	}
}
impl<D: Document> Default for ListenerRegistry<D> {
	fn default() -> Self {
		Self::new()
	}
}
