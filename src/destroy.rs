use crate::{
	arena::{Mounted, MountedId},
	diff::DomDiffer,
	host::Document,
};
use tracing::{trace, trace_span, warn};

impl<D: Document> DomDiffer<D> {
	/// Detaches the live nodes of `id` from the document and releases everything mounting it acquired.
	///
	/// Destroying a handle that is no longer mounted does nothing.
	pub fn destroy(&mut self, id: MountedId) {
		let span = trace_span!("Destroying", ?id);
		let _enter = span.enter();

		if !self.is_mounted(id) {
			warn!("Tried to destroy a node that isn't mounted (anymore). Ignoring.");
			return;
		}
		self.root_anchors.remove(&id);
		self.destroy_node(id, true);
		trace!("Mounted node count/listener count: {}/{}", self.arena.len(), self.listeners.len());
	}

	/// Only the topmost live nodes are detached and released. Their descendants go along with them and only need their bookkeeping released.
	fn destroy_node(&mut self, id: MountedId, detach: bool) {
		let record = match self.arena.remove(id) {
			Some(record) => record,
			None => return warn!("Missing mounted record for {:?}.", id),
		};

		match record {
			Mounted::Text { live, .. } => {
				if detach {
					self.detach(&live);
					self.document.release(&live);
				}
			}
			Mounted::Element { listeners, children, live, .. } => {
				self.listeners.remove_listeners(&self.document, listeners, &live);
				for child in children {
					self.destroy_node(child, false);
				}
				if detach {
					self.detach(&live);
					self.document.release(&live);
				}
			}
			Mounted::Fragment { children } => {
				for child in children {
					self.destroy_node(child, detach);
				}
			}
		}
	}

	fn detach(&self, live: &D::Node) {
		match self.document.parent_node(live) {
			Some(parent) => {
				if let Err(error) = self.document.remove_child(&parent, live) {
					warn!("Could not detach {:?}: {:?}", live, error);
				}
			}
			None => warn!("Live node {:?} was already detached.", live),
		}
	}
}
