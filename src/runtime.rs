//! A model-view-update runtime on top of [`DomDiffer`].
//!
//! An [`App`] owns the current state of one [`Component`] and the tree it last rendered.
//! Actions are queued and processed strictly one at a time, each in its own update cycle:
//! [`Component::update`], then [`Component::render`], then a patch against the live document.
//! Actions dispatched during a cycle (for example from [`render`](`Component::render`) or as side effect of a patch) are run afterwards, in order.

use crate::{
	arena::MountedId,
	diff::{DifferOptions, DomDiffer},
	host::Document,
	vdom::Node,
};
use core::fmt::{self, Debug, Formatter};
use std::{
	cell::{Cell, Ref, RefCell},
	collections::VecDeque,
	rc::{Rc, Weak},
};
use tracing::{info, trace, trace_span, warn};

/// The application logic driven by an [`App`].
///
/// `E` is the event type of the [`Document`] the component renders into.
pub trait Component<E>: 'static {
	type State: 'static;
	type Action: 'static;

	/// The pure state transition for one action.
	fn update(&self, state: &Self::State, action: Self::Action) -> Self::State;

	/// Describes the UI for `state`.
	///
	/// Event handlers should capture clones of `emit`, or values derived from it via [`Emitter::map`].
	fn render(&self, state: &Self::State, emit: &Emitter<Self::Action>) -> Node<E>;
}

/// Sends messages of type `A` somewhere, usually into an [`App`]'s action queue.
pub struct Emitter<A: 'static>(Rc<dyn Fn(A)>);
impl<A: 'static> Emitter<A> {
	pub fn new(sink: impl 'static + Fn(A)) -> Self {
		Self(Rc::new(sink))
	}

	pub fn emit(&self, message: A) {
		(self.0)(message);
	}

	/// Derives an [`Emitter`] for a child view, resolving each of its outbound events into one of this emitter's messages.
	///
	/// ```
	/// use xylem_dom::runtime::Emitter;
	/// use std::{cell::RefCell, rc::Rc};
	///
	/// enum ToggleEvent { Toggled(bool) }
	/// #[derive(Debug, PartialEq)]
	/// enum Action { SetDarkMode(bool) }
	///
	/// let received = Rc::new(RefCell::new(Vec::new()));
	/// let emit = Emitter::new({
	///     let received = received.clone();
	///     move |action| received.borrow_mut().push(action)
	/// });
	///
	/// let child = emit.map(|ToggleEvent::Toggled(on)| Action::SetDarkMode(on));
	/// child.emit(ToggleEvent::Toggled(true));
	/// assert_eq!(*received.borrow(), vec![Action::SetDarkMode(true)]);
	/// ```
	#[must_use]
	pub fn map<B: 'static>(&self, resolve: impl 'static + Fn(B) -> A) -> Emitter<B> {
		let parent = self.clone();
		Emitter::new(move |event| parent.emit(resolve(event)))
	}

	/// An event handler that emits one message per event.
	pub fn callback<E>(&self, message: impl 'static + Fn(&E) -> A) -> impl 'static + Fn(&E) {
		let emit = self.clone();
		move |event| emit.emit(message(event))
	}

	/// An event handler that emits a message only for some events.
	pub fn filter_callback<E>(&self, message: impl 'static + Fn(&E) -> Option<A>) -> impl 'static + Fn(&E) {
		let emit = self.clone();
		move |event| {
			if let Some(message) = message(event) {
				emit.emit(message);
			}
		}
	}
}
impl<A: 'static> Clone for Emitter<A> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}
impl<A: 'static> Debug for Emitter<A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Emitter").field(&Rc::as_ptr(&self.0)).finish()
	}
}

/// A mounted [`Component`].
///
/// Dropping the [`App`] leaves its live nodes in place but detaches nothing,
/// so call [`unmount`](`App::unmount`) first to clean up.
/// [`Emitter`]s that outlive the [`App`] ignore further messages.
pub struct App<D: Document, C: Component<D::Event>>(Rc<Shared<D, C>>);

struct Shared<D: Document, C: Component<D::Event>> {
	component: C,
	state: RefCell<C::State>,
	differ: RefCell<DomDiffer<D>>,
	host: D::Node,
	root: Cell<Option<MountedId>>,
	queue: RefCell<VecDeque<C::Action>>,
	updating: Cell<bool>,
	unmounted: Cell<bool>,
	cycles: Cell<u64>,
	emitter: Emitter<C::Action>,
}

impl<D: Document, C: Component<D::Event>> App<D, C> {
	/// Renders `component` for `state` and appends the result to `host`.
	pub fn mount(component: C, state: C::State, document: D, host: D::Node) -> Self {
		Self::mount_with_options(component, state, document, host, DifferOptions::default())
	}

	pub fn mount_with_options(component: C, state: C::State, document: D, host: D::Node, options: DifferOptions) -> Self {
		let shared = Rc::new_cyclic(|weak: &Weak<Shared<D, C>>| {
			let weak = weak.clone();
			Shared {
				component,
				state: RefCell::new(state),
				differ: RefCell::new(DomDiffer::with_options(document, options)),
				host,
				root: Cell::new(None),
				queue: RefCell::new(VecDeque::new()),
				updating: Cell::new(false),
				unmounted: Cell::new(false),
				cycles: Cell::new(0),
				emitter: Emitter::new(move |action| match weak.upgrade() {
					Some(shared) => shared.dispatch(action),
					None => warn!("Dropped an action emitted after its app was dropped."),
				}),
			}
		});

		{
			let span = trace_span!("Initial render");
			let _enter = span.enter();
			let _updating = Updating::enter(&shared.updating);
			shared.render();
			shared.drain();
		}
		App(shared)
	}

	/// Queues `action`. If no cycle is running, this runs cycles until the queue is empty before returning.
	pub fn dispatch(&self, action: C::Action) {
		self.0.dispatch(action);
	}

	#[must_use]
	pub fn emitter(&self) -> Emitter<C::Action> {
		self.0.emitter.clone()
	}

	/// The current state.
	///
	/// # Panics
	///
	/// The returned [`Ref`] must be dropped before the next cycle starts.
	/// Holding it across [`dispatch`](`App::dispatch`) or [`Emitter::emit`] makes that cycle panic when it stores the new state.
	#[must_use]
	pub fn state(&self) -> Ref<'_, C::State> {
		self.0.state.borrow()
	}

	/// How many update cycles have completed. The initial render isn't counted.
	#[must_use]
	pub fn cycles(&self) -> u64 {
		self.0.cycles.get()
	}

	#[must_use]
	pub fn is_updating(&self) -> bool {
		self.0.updating.get()
	}

	#[must_use]
	pub fn is_mounted(&self) -> bool {
		!self.0.unmounted.get()
	}

	/// The mounted root, or [`None`] after [`unmount`](`App::unmount`).
	#[must_use]
	pub fn root(&self) -> Option<MountedId> {
		self.0.root.get()
	}

	/// # Panics
	///
	/// Iff called during a patch.
	#[must_use]
	pub fn differ(&self) -> Ref<'_, DomDiffer<D>> {
		self.0.differ.borrow()
	}

	#[must_use]
	pub fn host(&self) -> &D::Node {
		&self.0.host
	}

	/// Destroys the rendered tree. Pending and later actions are discarded.
	///
	/// If a cycle is running, this happens once it completes.
	pub fn unmount(&self) {
		let shared = &self.0;
		if shared.unmounted.replace(true) {
			return warn!("Tried to unmount an app that isn't mounted (anymore). Ignoring.");
		}
		if shared.updating.get() {
			trace!("Deferring unmount until the current cycle completes.");
		} else {
			shared.tear_down();
		}
	}
}
impl<D: Document, C: Component<D::Event>> Debug for App<D, C> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("App")
			.field("root", &self.0.root.get())
			.field("queued", &self.0.queue.borrow().len())
			.field("updating", &self.0.updating.get())
			.field("unmounted", &self.0.unmounted.get())
			.field("cycles", &self.0.cycles.get())
			.finish_non_exhaustive()
	}
}

impl<D: Document, C: Component<D::Event>> Shared<D, C> {
	fn dispatch(&self, action: C::Action) {
		if self.unmounted.get() {
			return warn!("Dropped an action dispatched to an unmounted app.");
		}

		self.queue.borrow_mut().push_back(action);
		if self.updating.get() {
			trace!("Queued action behind the current cycle.");
			return;
		}

		let _updating = Updating::enter(&self.updating);
		self.drain();
	}

	fn next_action(&self) -> Option<C::Action> {
		self.queue.borrow_mut().pop_front()
	}

	fn drain(&self) {
		while let Some(action) = self.next_action() {
			if self.unmounted.get() {
				break;
			}
			self.cycle(action);
		}
		if self.unmounted.get() {
			self.tear_down();
		}
	}

	fn cycle(&self, action: C::Action) {
		let cycle = self.cycles.get() + 1;
		let span = trace_span!("Update cycle", cycle);
		let _enter = span.enter();

		let next = self.component.update(&self.state.borrow(), action);
		*self.state.borrow_mut() = next;
		self.render();

		self.cycles.set(cycle);
		info!("Completed update cycle {}.", cycle);
	}

	fn render(&self) {
		let vdom = self.component.render(&self.state.borrow(), &self.emitter);
		let mut differ = self.differ.borrow_mut();
		let root = match self.root.get() {
			Some(root) => differ.patch(root, vdom, &self.host),
			None => differ.mount(vdom, &self.host, None),
		};
		self.root.set(Some(root));
	}

	fn tear_down(&self) {
		self.queue.borrow_mut().clear();
		if let Some(root) = self.root.take() {
			let span = trace_span!("Unmounting");
			let _enter = span.enter();
			self.differ.borrow_mut().destroy(root);
		}
	}
}

/// Marks the app as updating until dropped, including when a panic unwinds through a cycle.
struct Updating<'a>(&'a Cell<bool>);
impl<'a> Updating<'a> {
	fn enter(updating: &'a Cell<bool>) -> Self {
		debug_assert!(!updating.get());
		updating.set(true);
		Self(updating)
	}
}
impl Drop for Updating<'_> {
	fn drop(&mut self) {
		self.0.set(false);
	}
}
