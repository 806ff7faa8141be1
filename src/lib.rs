#![doc(html_root_url = "https://docs.rs/xylem-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod arena;
mod destroy;
mod diff;
pub mod host;
mod keyed;
pub mod listeners;
pub mod load;
pub mod memory;
mod mount;
pub mod runtime;
pub mod vdom;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use arena::MountedId;
pub use diff::{DifferOptions, DomDiffer, ReorderStrategy};
pub use host::Document;
pub use runtime::{App, Component, Emitter};
pub use vdom::{Element, Key, Node, NodeKind, Props, Value};

use core::fmt::{self, Debug, Formatter};

/// Formats text content and attribute values only with the `dangerous-logging` feature, and their length otherwise.
pub(crate) struct Sensitive<'a>(pub(crate) &'a str);
impl Debug for Sensitive<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if cfg!(feature = "dangerous-logging") {
			Debug::fmt(self.0, f)
		} else {
			write!(f, "<{} bytes>", self.0.len())
		}
	}
}
