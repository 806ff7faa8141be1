use crate::{
	host::Document,
	listeners::ListenerHandles,
	vdom::{Key, NodeKind, Props},
};
use std::borrow::Cow;

/// Handle of a mounted node.
///
/// Handles are generation-checked: once a node is destroyed, its handle stays invalid even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MountedId {
	index: u32,
	generation: u32,
}

/// What's left of a virtual node after mounting it, plus the live node(s) it is responsible for.
pub(crate) enum Mounted<D: Document> {
	Text {
		value: Cow<'static, str>,
		live: D::Node,
	},
	Element {
		tag: Cow<'static, str>,
		key: Option<Key>,
		props: Props,
		listeners: ListenerHandles,
		children: Vec<MountedId>,
		live: D::Node,
	},
	Fragment {
		children: Vec<MountedId>,
	},
}
impl<D: Document> Mounted<D> {
	pub(crate) fn kind(&self) -> NodeKind {
		match self {
			Mounted::Text { .. } => NodeKind::Text,
			Mounted::Element { .. } => NodeKind::Element,
			Mounted::Fragment { .. } => NodeKind::Fragment,
		}
	}

	pub(crate) fn key(&self) -> Option<&Key> {
		match self {
			Mounted::Element { key, .. } => key.as_ref(),
			Mounted::Text { .. } | Mounted::Fragment { .. } => None,
		}
	}
}

struct Slot<D: Document> {
	generation: u32,
	record: Option<Mounted<D>>,
}

pub(crate) struct Arena<D: Document> {
	slots: Vec<Slot<D>>,
	free_list: Vec<u32>,
	len: usize,
}
impl<D: Document> Arena<D> {
	pub(crate) fn new() -> Self {
		Self {
			slots: Vec::new(),
			free_list: Vec::new(),
			len: 0,
		}
	}

	pub(crate) fn insert(&mut self, record: Mounted<D>) -> MountedId {
		self.len += 1;
		if let Some(index) = self.free_list.pop() {
			let slot = &mut self.slots[index as usize];
			debug_assert!(slot.record.is_none());
			slot.record = Some(record);
			return MountedId { index, generation: slot.generation };
		}

		let index = u32::try_from(self.slots.len()).expect("Too many mounted nodes");
		self.slots.push(Slot { generation: 0, record: Some(record) });
		MountedId { index, generation: 0 }
	}

	pub(crate) fn get(&self, id: MountedId) -> Option<&Mounted<D>> {
		self.slots.get(id.index as usize).filter(|slot| slot.generation == id.generation)?.record.as_ref()
	}

	pub(crate) fn get_mut(&mut self, id: MountedId) -> Option<&mut Mounted<D>> {
		self.slots.get_mut(id.index as usize).filter(|slot| slot.generation == id.generation)?.record.as_mut()
	}

	/// Frees the slot and invalidates `id`.
	pub(crate) fn remove(&mut self, id: MountedId) -> Option<Mounted<D>> {
		let slot = self.slots.get_mut(id.index as usize).filter(|slot| slot.generation == id.generation)?;
		let record = slot.record.take()?;
		slot.generation = slot.generation.wrapping_add(1);
		self.free_list.push(id.index);
		self.len -= 1;
		Some(record)
	}

	pub(crate) fn len(&self) -> usize {
		self.len
	}
}
