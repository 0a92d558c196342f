//! Browser backend tests
//!
//! Run with `wasm-pack test --headless --chrome crates/magnetic-pages`.

#![cfg(target_arch = "wasm32")]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use magnetic_core::conf::Settings;
use magnetic_core::reactive::Observer;
use magnetic_pages::dom::{Document, Element, Event, EventSource, Position};
use magnetic_pages::events::{custom_stream, dispatch_custom};
use magnetic_pages::{AppContext, Component, ManagedNode, MediaQuery, Payload};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn mount(document: &Document, tag: &str, class: &str, count: usize) -> Vec<Element> {
	(0..count)
		.map(|_| {
			let element = document.create_element(tag).unwrap();
			element.set_attribute("class", class).unwrap();
			document.body().append_child(&element).unwrap();
			element
		})
		.collect()
}

#[wasm_bindgen_test]
fn test_listener_handle_detaches_on_drop() {
	let document = Document::current().unwrap();
	let button = mount(&document, "button", "wasm-handle", 1).remove(0);
	let count = Rc::new(Cell::new(0));
	let sink = count.clone();

	let handle = button
		.listen("click", Rc::new(move |_: &Event| sink.set(sink.get() + 1)))
		.unwrap();
	button.dispatch_event(&Event::new("click").unwrap()).unwrap();
	drop(handle);
	button.dispatch_event(&Event::new("click").unwrap()).unwrap();

	assert_eq!(count.get(), 1);
	button.remove();
}

#[wasm_bindgen_test]
fn test_default_actions_mutate_the_page() {
	let document = Document::current().unwrap();
	let ctx = AppContext::new(document.clone(), Settings::default());
	let target = document.create_element("div").unwrap();
	target.set_attribute("id", "wasm-target").unwrap();
	document.body().append_child(&target).unwrap();
	let node = ManagedNode::by_id(&ctx, "wasm-target").unwrap();
	let sibling = document.create_element("p").unwrap();

	node.fire_action("innerHTML", "<b>hi</b>");
	node.fire_action("opacity", 0.5);
	node.fire_action("appendSibling", (sibling.clone(), Position::AfterEnd));

	assert_eq!(target.inner_html(), "<b>hi</b>");
	assert_eq!(target.style_property("opacity").as_deref(), Some("0.5"));
	assert!(sibling.is_connected());

	node.fire_action("remove", ());
	assert!(!target.is_connected());
	assert_eq!(node.element().unwrap().tag_name().to_lowercase(), "span");
	node.release();
	sibling.remove();
}

#[wasm_bindgen_test]
fn test_component_local_routing() {
	let document = Document::current().unwrap();
	let ctx = AppContext::new(document.clone(), Settings::default());
	let elements = mount(&document, "button", "mag-wasmcard", 3);
	let component = Component::new(&ctx, "wasmcard").unwrap();
	let clicked = Rc::new(RefCell::new(Vec::new()));
	let sink = clicked.clone();
	component
		.on_event_local("click", move |element: &Element, _: &Payload| {
			sink.borrow_mut().push(element.get_attribute("data-mag-id").unwrap_or_default());
			Ok(element.clone())
		})
		.unwrap();

	elements[1].dispatch_event(&Event::bubbling("click").unwrap()).unwrap();

	assert_eq!(*clicked.borrow(), vec![component.ids()[1].clone()]);
	component.dispose();
	for element in elements {
		element.remove();
	}
}

#[wasm_bindgen_test]
fn test_custom_event_detail_round_trip() {
	let document = Document::current().unwrap();
	let ctx = AppContext::new(document, Settings::default());
	let stream = custom_stream::<String>(&ctx, "wasm_locale");
	let seen = Rc::new(RefCell::new(Vec::new()));
	let sink = seen.clone();
	stream
		.subscribe("test", Observer::new(move |locale: &String| sink.borrow_mut().push(locale.clone())))
		.unwrap();

	dispatch_custom(&ctx, "wasm_locale", "es").unwrap();

	assert_eq!(*seen.borrow(), vec!["es".to_string()]);
}

#[wasm_bindgen_test]
fn test_media_query_delivers_on_subscribe() {
	let document = Document::current().unwrap();
	let query = MediaQuery::width(&document.window(), None, None).unwrap();
	let seen = Rc::new(RefCell::new(Vec::new()));
	let sink = seen.clone();

	query.subscribe("test", Observer::new(move |m: &bool| sink.borrow_mut().push(*m))).unwrap();

	assert_eq!(seen.borrow().len(), 1);
}
