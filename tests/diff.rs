mod common;

use std::{
	cell::Cell,
	panic::{catch_unwind, AssertUnwindSafe},
	rc::Rc,
};
use xylem_dom::{
	memory::{Event, MemoryDocument, Mutation, NodeRef},
	DifferOptions, Document, DomDiffer, Element, MountedId, Node, ReorderStrategy,
};

fn list(keys: &[&'static str]) -> Node<Event> {
	Element::new("ul").children(keys.iter().map(|&key| Element::new("li").key(key).child(key))).into()
}

fn mounted(node: Node<Event>) -> (MemoryDocument, DomDiffer<MemoryDocument>, MountedId) {
	common::init();
	let document = MemoryDocument::recording();
	let mut differ = DomDiffer::new(document.clone());
	let id = differ.mount(node, &document.body(), None);
	document.take_mutations();
	(document, differ, id)
}

fn live_children(differ: &DomDiffer<MemoryDocument>, id: MountedId) -> Vec<NodeRef> {
	differ.document().child_nodes(differ.live_node(id).unwrap())
}

/// Patching `old` to `new` must leave the same document as mounting `new` directly.
fn assert_patch_matches_mount(old: &Node<Event>, new: &Node<Event>) {
	for reorder in [ReorderStrategy::Minimal, ReorderStrategy::Naive] {
		common::init();
		let patched = MemoryDocument::new();
		let mut differ = DomDiffer::with_options(patched.clone(), DifferOptions { reorder });
		let id = differ.mount(old.clone(), &patched.body(), None);
		differ.patch(id, new.clone(), &patched.body());

		let fresh = MemoryDocument::new();
		DomDiffer::new(fresh.clone()).mount(new.clone(), &fresh.body(), None);

		assert_eq!(common::loaded(&patched, patched.body()), common::loaded(&fresh, fresh.body()), "{:?} -> {:?} ({:?})", old, new, reorder);
	}
}

fn form(checked: bool, class: Option<&'static str>, label: &'static str) -> Node<Event> {
	Element::new("form")
		.attr("action", "#")
		.child(Element::new("input").attr("type", "checkbox").prop("checked", checked).on("change", |_| ()))
		.child(
			Element::new("label")
				.maybe_child(class.map(|class| Element::new("span").class(class).style("font-weight", "bold")))
				.child(label),
		)
		.into()
}

#[test]
fn patching_an_identical_tree_does_nothing() {
	let tree = || {
		Node::fragment(vec![
			form(true, Some("important"), "Done"),
			list(&["a", "b", "c"]),
			Node::fragment(vec![Node::text("x"), Node::fragment(Vec::<Node<Event>>::new())]),
		])
	};
	let (document, mut differ, id) = mounted(tree());
	let listeners = differ.listener_count();

	assert_eq!(differ.patch(id, tree(), &document.body()), id);
	assert_eq!(document.take_mutations(), Vec::<Mutation>::new());
	assert_eq!(differ.listener_count(), listeners);
}

#[test]
fn keyed_reorder_moves_only_what_is_out_of_order() {
	let (document, mut differ, id) = mounted(list(&["a", "b", "c"]));
	let ul = *differ.live_node(id).unwrap();
	let [a, b, c]: [NodeRef; 3] = live_children(&differ, id).try_into().unwrap();

	assert_eq!(differ.patch(id, list(&["c", "a", "b"]), &document.body()), id);

	assert_eq!(live_children(&differ, id), vec![c, a, b]);
	assert_eq!(common::texts(&document, ul), vec!["c", "a", "b"]);
	assert_eq!(document.take_mutations(), vec![Mutation::Insert { parent: ul, child: c }]);
}

#[test]
fn naive_reorder_keeps_identity_too() {
	common::init();
	let document = MemoryDocument::recording();
	let mut differ = DomDiffer::with_options(
		document.clone(),
		DifferOptions {
			reorder: ReorderStrategy::Naive,
		},
	);
	let id = differ.mount(list(&["a", "b", "c"]), &document.body(), None);
	let [a, b, c]: [NodeRef; 3] = live_children(&differ, id).try_into().unwrap();
	document.take_mutations();

	differ.patch(id, list(&["c", "a", "b"]), &document.body());

	assert_eq!(live_children(&differ, id), vec![c, a, b]);
	let moves = document.take_mutations();
	assert_eq!(moves.len(), 2);
	assert!(moves.iter().all(|mutation| matches!(mutation, Mutation::Insert { .. })));
}

#[test]
fn removing_a_key_destroys_only_that_node() {
	let items = |keys: &[&'static str]| -> Node<Event> { Element::new("ul").children(keys.iter().map(|&key| Element::new("li").key(key).on("click", |_| ()).child(key))).into() };
	let (document, mut differ, id) = mounted(items(&["a", "b", "c"]));
	let ul = *differ.live_node(id).unwrap();
	let [a, b, c]: [NodeRef; 3] = live_children(&differ, id).try_into().unwrap();
	let mounted_before = differ.mounted_count();
	assert_eq!((document.total_listener_count(), differ.listener_count()), (3, 3));

	differ.patch(id, items(&["a", "c"]), &document.body());

	assert_eq!(live_children(&differ, id), vec![a, c]);
	assert_eq!(
		document.take_mutations(),
		vec![
			Mutation::RemoveListener { node: b, event: "click".to_owned() },
			Mutation::Remove { parent: ul, child: b },
		]
	);
	assert_eq!(differ.mounted_count(), mounted_before - 2);
	assert_eq!((document.total_listener_count(), differ.listener_count()), (2, 2));
	assert_eq!((document.listener_count(a), document.listener_count(c)), (1, 1));
}

#[test]
fn new_keys_are_mounted_in_place() {
	let (document, mut differ, id) = mounted(list(&["a", "c"]));
	let ul = *differ.live_node(id).unwrap();
	let [a, c]: [NodeRef; 2] = live_children(&differ, id).try_into().unwrap();

	differ.patch(id, list(&["d", "a", "b", "c", "e"]), &document.body());

	let children = live_children(&differ, id);
	assert_eq!(common::texts(&document, ul), vec!["d", "a", "b", "c", "e"]);
	assert_eq!((children[1], children[3]), (a, c));
	assert!(document.take_mutations().iter().all(|mutation| match mutation {
		Mutation::Insert { child, .. } => *child != a && *child != c,
		_ => true,
	}));
}

#[test]
fn a_type_change_replaces_at_the_same_index() {
	let (document, mut differ, id) = mounted(Element::new("p").child("a").child("b").child("c").into());
	let p = *differ.live_node(id).unwrap();
	let [a, b, c]: [NodeRef; 3] = live_children(&differ, id).try_into().unwrap();

	differ.patch(id, Element::new("p").child("a").child(Element::new("div").child("b")).child("c").into(), &document.body());

	let children = live_children(&differ, id);
	assert_eq!(children.len(), 3);
	assert_eq!((children[0], children[2]), (a, c));
	assert_ne!(children[1], b);
	assert_eq!(document.tag_name(&children[1]).as_deref(), Some("div"));
	assert_eq!(document.inner_html(p), "a<div>b</div>c");
}

#[test]
fn a_key_change_is_a_new_identity() {
	let (document, mut differ, id) = mounted(Element::new("div").key("one").child("x").into());
	let before = *differ.live_node(id).unwrap();

	let patched = differ.patch(id, Element::new("div").key("two").child("x").into(), &document.body());

	assert_ne!(patched, id);
	assert!(!differ.is_mounted(id));
	assert_ne!(*differ.live_node(patched).unwrap(), before);
	assert_eq!(document.child_nodes(&document.body()), vec![*differ.live_node(patched).unwrap()]);
}

#[test]
fn a_different_tag_case_recreates_the_element() {
	let (document, mut differ, id) = mounted(Element::new("DIV").into());
	let patched = differ.patch(id, Element::new("div").into(), &document.body());
	assert_ne!(patched, id);
	assert_eq!(document.inner_html(document.body()), "<div></div>");
}

#[test]
fn root_replacement_keeps_the_position_among_foreign_nodes() {
	common::init();
	let document = MemoryDocument::new();
	let body = document.body();
	for text in ["before", "after"] {
		let node = document.create_text_node(text);
		document.insert_before(&body, &node, None).unwrap();
	}
	let mut differ = DomDiffer::new(document.clone());
	let id = differ.mount(Node::text("old"), &body, Some(1));

	differ.patch(id, Element::new("b").child("new").into(), &body);
	assert_eq!(document.inner_html(body), "before<b>new</b>after");
}

#[test]
fn props_are_reconciled_per_category() {
	let (document, mut differ, id) = mounted(
		Element::new("input")
			.attr("type", "text")
			.attr("placeholder", "What needs to be done?")
			.prop("value", "draft")
			.prop("autofocus", true)
			.class("new-todo")
			.style("color", "red")
			.style("margin", "0")
			.into(),
	);
	let input = *differ.live_node(id).unwrap();

	differ.patch(
		id,
		Element::new("input")
			.attr("type", "text")
			.prop("value", "")
			.prop("autofocus", true)
			.style("color", "blue")
			.style("margin", "0")
			.into(),
		&document.body(),
	);

	let mut mutations = document.take_mutations();
	mutations.sort_by_key(|mutation| format!("{:?}", mutation));
	let mut expected = vec![
		Mutation::RemoveAttribute {
			node: input,
			name: "placeholder".to_owned(),
		},
		Mutation::SetProperty {
			node: input,
			name: "value".to_owned(),
		},
		Mutation::RemoveClass { node: input },
		Mutation::SetStyle {
			node: input,
			name: "color".to_owned(),
		},
	];
	expected.sort_by_key(|mutation| format!("{:?}", mutation));
	assert_eq!(mutations, expected);
	assert_eq!(document.attribute(input, "placeholder"), None);
	assert_eq!(document.class_name(input), None);
	assert_eq!(document.style_property(input, "color").as_deref(), Some("blue"));
}

#[test]
fn class_and_style_attributes_patch_like_their_categories() {
	let (document, mut differ, id) = mounted(Element::new("p").class("a").style("color", "red").into());
	let p = *differ.live_node(id).unwrap();

	differ.patch(id, Element::new("p").attr("class", "b").attr("style", "color: blue;").into(), &document.body());

	assert_eq!(document.class_name(p).as_deref(), Some("b"));
	assert_eq!(document.style_property(p, "color").as_deref(), Some("blue"));
	assert_eq!(document.attribute(p, "class"), None);
	assert_eq!(
		document.take_mutations(),
		vec![Mutation::SetClass { node: p }, Mutation::SetStyle { node: p, name: "color".to_owned() }]
	);
	assert_patch_matches_mount(&Element::new("p").class("a").into(), &Element::new("p").attr("class", "b").into());
}

#[test]
fn removed_properties_are_reset() {
	let (document, mut differ, id) = mounted(Element::new("input").prop("checked", true).into());
	let input = *differ.live_node(id).unwrap();

	differ.patch(id, Element::new("input").into(), &document.body());

	assert_eq!(document.property(input, "checked"), None);
	assert_eq!(
		document.take_mutations(),
		vec![Mutation::RemoveProperty {
			node: input,
			name: "checked".to_owned()
		}]
	);
}

#[test]
fn handlers_are_swapped_without_touching_native_listeners() {
	let first = Rc::new(Cell::new(0));
	let second = Rc::new(Cell::new(0));
	let button = |count: &Rc<Cell<u32>>| -> Node<Event> {
		let count = count.clone();
		Element::new("button").on("click", move |_| count.set(count.get() + 1)).into()
	};
	let (document, mut differ, id) = mounted(button(&first));
	let live = *differ.live_node(id).unwrap();

	differ.patch(id, button(&second), &document.body());
	assert_eq!(document.take_mutations(), Vec::<Mutation>::new());

	document.dispatch_event(live, Event::new("click"));
	assert_eq!((first.get(), second.get()), (0, 1));

	differ.patch(id, Element::new("button").on("dblclick", |_| ()).into(), &document.body());
	assert_eq!(
		document.take_mutations(),
		vec![
			Mutation::AddListener {
				node: live,
				event: "dblclick".to_owned()
			},
			Mutation::RemoveListener {
				node: live,
				event: "click".to_owned()
			},
		]
	);
	assert_eq!(document.dispatch_event(live, Event::new("click")), 0);
}

#[test]
fn mixed_lists_pair_unkeyed_children_in_order() {
	let mixed = |first: &'static str, second: &'static str, text: &'static str| -> Node<Event> {
		Element::new("div")
			.child(Element::new("p").key(first).child(first))
			.child(text)
			.child(Element::new("p").key(second).child(second))
			.child(Element::new("hr"))
			.into()
	};
	let (document, mut differ, id) = mounted(mixed("a", "b", "first"));
	let [a, text, b, hr]: [NodeRef; 4] = live_children(&differ, id).try_into().unwrap();

	differ.patch(id, mixed("b", "a", "second"), &document.body());

	assert_eq!(live_children(&differ, id), vec![b, text, a, hr]);
	assert_eq!(document.text(&text).as_deref(), Some("second"));
}

#[test]
fn gaining_a_key_is_a_new_identity() {
	let (document, mut differ, id) = mounted(Element::new("ul").child(Element::new("li").child("x")).into());
	let [before]: [NodeRef; 1] = live_children(&differ, id).try_into().unwrap();

	differ.patch(id, Element::new("ul").child(Element::new("li").key(1).child("x")).into(), &document.body());

	let [after]: [NodeRef; 1] = live_children(&differ, id).try_into().unwrap();
	assert_ne!(before, after);
}

#[test]
fn duplicate_keys_panic_before_any_mutation() {
	let (document, mut differ, id) = mounted(list(&["a", "b"]));

	let result = catch_unwind(AssertUnwindSafe(|| differ.patch(id, list(&["a", "a"]), &document.body())));

	assert!(result.is_err());
	assert_eq!(document.take_mutations(), Vec::<Mutation>::new());
}

#[test]
#[should_panic = "not (or no longer) mounted"]
fn patching_a_destroyed_node_panics() {
	let (document, mut differ, id) = mounted(Node::text("gone"));
	differ.destroy(id);
	differ.patch(id, Node::text("back"), &document.body());
}

#[test]
fn fragments_splice_into_their_parent() {
	let (document, mut differ, id) = mounted(
		Element::new("div")
			.child(Node::fragment(Vec::<Node<Event>>::new()))
			.child("b")
			.child(Node::fragment(vec![Node::text("c"), Node::text("d")]))
			.into(),
	);
	let div = *differ.live_node(id).unwrap();
	assert_eq!(document.inner_html(div), "bcd");

	differ.patch(
		id,
		Element::new("div")
			.child(Node::fragment(vec![Node::text("a")]))
			.child("b")
			.child(Node::fragment(vec![Node::text("c")]))
			.into(),
		&document.body(),
	);
	assert_eq!(document.inner_html(div), "abc");
}

#[test]
fn an_empty_root_fragment_keeps_its_position() {
	common::init();
	let document = MemoryDocument::new();
	let body = document.body();
	let tail = document.create_text_node("tail");
	document.insert_before(&body, &tail, None).unwrap();
	let mut differ = DomDiffer::new(document.clone());
	let id = differ.mount(Node::fragment(Vec::<Node<Event>>::new()), &body, Some(0));

	let id = differ.patch(id, Node::fragment(Vec::<Node<Event>>::new()), &body);
	differ.patch(id, Node::fragment(vec![Node::text("x")]), &body);
	assert_eq!(document.inner_html(body), "xtail");
}

#[test]
fn a_root_that_renders_nothing_comes_back_in_place() {
	common::init();
	let document = MemoryDocument::new();
	let body = document.body();
	let tail = document.create_text_node("tail");
	document.insert_before(&body, &tail, None).unwrap();
	let mut differ = DomDiffer::new(document.clone());
	let id = differ.mount(Element::new("p").into(), &body, Some(0));

	let id = differ.patch(id, Node::fragment(Vec::<Node<Event>>::new()), &body);
	assert_eq!(document.inner_html(body), "tail");
	let id = differ.patch(id, Node::fragment(Vec::<Node<Event>>::new()), &body);
	let id = differ.patch(id, Element::new("p").into(), &body);
	assert_eq!(document.inner_html(body), "<p></p>tail");

	differ.destroy(id);
	assert_eq!(document.inner_html(body), "tail");
}

#[test]
fn an_empty_root_appends_once_its_anchor_is_gone() {
	common::init();
	let document = MemoryDocument::new();
	let body = document.body();
	let tail = document.create_text_node("tail");
	document.insert_before(&body, &tail, None).unwrap();
	let mut differ = DomDiffer::new(document.clone());
	let id = differ.mount(Node::fragment(Vec::<Node<Event>>::new()), &body, Some(0));

	document.remove_child(&body, &tail).unwrap();
	let other = document.create_text_node("other");
	document.insert_before(&body, &other, None).unwrap();
	differ.patch(id, Node::text("x"), &body);
	assert_eq!(document.inner_html(body), "otherx");
}

#[test]
fn text_drift_is_repaired() {
	let (document, mut differ, id) = mounted(Node::text("expected"));
	let live = *differ.live_node(id).unwrap();
	document.set_text(&live, "tampered");
	document.take_mutations();

	differ.patch(id, Node::text("expected"), &document.body());
	assert_eq!(document.text(&live).as_deref(), Some("expected"));
}

#[test]
fn patch_results_match_fresh_mounts() {
	let transitions: Vec<(Node<Event>, Node<Event>)> = vec![
		(list(&["a", "b", "c", "d", "e"]), list(&["e", "d", "c", "b", "a"])),
		(list(&["a", "b", "c", "d", "e"]), list(&["b", "f", "a", "e", "g"])),
		(list(&[]), list(&["a", "b"])),
		(list(&["a", "b"]), list(&[])),
		(form(false, None, "Todo"), form(true, Some("strike"), "Done")),
		(form(true, Some("strike"), "Done"), form(false, None, "Todo")),
		(
			Node::fragment(vec![Node::text("a"), list(&["x"]), Node::fragment(vec![Node::text("b")])]),
			Node::fragment(vec![list(&["y", "x"]), Node::text("a"), Node::fragment(Vec::<Node<Event>>::new()), Node::text("c")]),
		),
		(
			Element::new("div").child(Element::new("p").key(1).child("one")).child("loose").child(Element::new("p").key(2)).into(),
			Element::new("div").child("loose").child(Element::new("p").key(2)).child(Element::new("span").key(1).child("one")).into(),
		),
		(Node::text("text"), list(&["a"])),
	];

	for (old, new) in &transitions {
		assert_patch_matches_mount(old, new);
	}
}
