use crate::{
	arena::{Mounted, MountedId},
	diff::{DomDiffer, ReorderStrategy},
	host::Document,
	vdom::{Key, Node},
};
use hashbrown::{HashMap, HashSet};
use std::collections::VecDeque;
use tracing::{trace, trace_span};

impl<D: Document> DomDiffer<D> {
	/// Matches keyed children by key and unkeyed ones by their order among the unkeyed, then reorders what was reused.
	///
	/// # Panics
	///
	/// Iff two of the `new` siblings share a key. This is checked before anything is touched.
	pub(crate) fn diff_keyed(&mut self, old: Vec<MountedId>, new: Vec<Node<D::Event>>, parent: &D::Node, next: Option<&D::Node>) -> Vec<MountedId> {
		let span = trace_span!("Diffing keyed children", "old.len()" = old.len(), "new.len()" = new.len());
		let _enter = span.enter();

		{
			let mut seen = HashSet::<&Key>::new();
			for key in new.iter().filter_map(Node::key) {
				assert!(seen.insert(key), "Duplicate key {:?} among siblings.", key);
			}
		}

		let mut keyed_old = HashMap::new();
		let mut unkeyed_old = VecDeque::new();
		for (index, &id) in old.iter().enumerate() {
			match self.arena.get(id).and_then(Mounted::key) {
				Some(key) => {
					keyed_old.insert(key.clone(), index);
				}
				None => unkeyed_old.push_back(index),
			}
		}
		let sources = new
			.iter()
			.map(|node| match node.key() {
				Some(key) => keyed_old.remove(key),
				None => unkeyed_old.pop_front(),
			})
			.collect::<Vec<_>>();

		let mut reused = vec![false; old.len()];
		for &source in sources.iter().flatten() {
			reused[source] = true;
		}
		for (index, &id) in old.iter().enumerate() {
			if !reused[index] {
				self.destroy(id);
			}
		}

		let retained = old.iter().enumerate().filter(|&(index, _)| reused[index]).map(|(_, &id)| id).collect::<Vec<_>>();
		let end = self.region_end(&retained, next);
		let stable = self.stable_positions(&sources);

		let mut anchor = end;
		let mut patched = Vec::with_capacity(new.len());
		for (index, node) in new.into_iter().enumerate().rev() {
			let id = match sources[index] {
				None => self.mount_before(node, parent, anchor.as_ref()),
				Some(source) => {
					let id = self.patch_node(old[source], node, parent, anchor.as_ref());
					if !stable[index] {
						self.move_before(id, parent, anchor.as_ref());
					}
					id
				}
			};
			if let Some(first) = self.first_live(id) {
				anchor = Some(first);
			}
			patched.push(id);
		}
		patched.reverse();
		patched
	}

	/// Which new positions hold a reused child that can stay where it is.
	fn stable_positions(&self, sources: &[Option<usize>]) -> Vec<bool> {
		let mut stable = vec![false; sources.len()];
		match self.options.reorder {
			ReorderStrategy::Naive => (),
			ReorderStrategy::Minimal => {
				let reused = sources.iter().enumerate().filter_map(|(index, source)| source.map(|source| (index, source))).collect::<Vec<_>>();
				let order = reused.iter().map(|&(_, source)| source).collect::<Vec<_>>();
				for position in longest_increasing_subsequence(&order) {
					stable[reused[position].0] = true;
				}
			}
		}
		stable
	}

	/// Moves all live nodes of `id` in front of `reference`, unless they already end right there.
	fn move_before(&mut self, id: MountedId, parent: &D::Node, reference: Option<&D::Node>) {
		let nodes = self.live_nodes(id);
		let last = match nodes.last() {
			Some(last) => last,
			None => return,
		};
		if self.document.next_sibling(last).as_ref() == reference && self.document.parent_node(last).as_ref() == Some(parent) {
			trace!(?id, "Already in place.");
			return;
		}

		let span = trace_span!("Moving", ?id, "nodes.len()" = nodes.len());
		let _enter = span.enter();
		for node in &nodes {
			self.insert(parent, node, reference);
		}
	}
}

/// Indices of one longest strictly increasing subsequence of `sequence`, in ascending order.
pub(crate) fn longest_increasing_subsequence(sequence: &[usize]) -> Vec<usize> {
	// `tails[length - 1]` is the index ending the best subsequence of that length found so far.
	let mut tails: Vec<usize> = Vec::new();
	let mut predecessors = vec![None; sequence.len()];
	for (index, &value) in sequence.iter().enumerate() {
		let length = tails.partition_point(|&tail| sequence[tail] < value);
		if length > 0 {
			predecessors[index] = Some(tails[length - 1]);
		}
		if length == tails.len() {
			tails.push(index);
		} else {
			tails[length] = index;
		}
	}

	let mut subsequence = Vec::with_capacity(tails.len());
	let mut current = tails.last().copied();
	while let Some(index) = current {
		subsequence.push(index);
		current = predecessors[index];
	}
	subsequence.reverse();
	subsequence
}
