//! Component and event routing integration tests
//!
//! Success Criteria:
//! 1. Discovery gives every matching element one unique identity
//! 2. Local events reach only the instance they happened on
//! 3. Global events reach every instance
//! 4. Media queries deliver their state on subscribe and on resize
//! 5. Failed actions stay visible on the element and leave it bound
//! 6. Several window routes on one event coexist
//! 7. An action that fires another action on its own node leaves the node
//!    bound to the element in the document
//!
//! Test Categories:
//! - Happy Path: 5 tests
//! - Error Path: 3 tests
//! - Edge Cases: 3 tests
//! - Property-based: 1 test
//! - Use Cases: 2 tests

#![cfg(not(target_arch = "wasm32"))]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use magnetic_core::reactive::{Observer, State};
use magnetic_pages::dom::{Document, Element, Event};
use magnetic_pages::{
	ActionError, ActionHooks, AppContext, Component, EventStream, ManagedNode, MediaQuery, PagesError, Payload,
};
use proptest::prelude::*;
use rstest::*;

// ============================================================================
// Fixtures
// ============================================================================

fn page_with(class: &str, count: usize) -> (AppContext, Vec<Element>) {
	let document = Document::new();
	let body = document.body();
	let elements = (0..count)
		.map(|index| {
			let element = document.create_element("button").unwrap();
			element.set_attribute("class", class).unwrap();
			element.set_inner_html(&format!("item {}", index));
			body.append_child(&element).unwrap();
			element
		})
		.collect();
	(AppContext::with_defaults(document), elements)
}

#[fixture]
fn cards() -> (AppContext, Vec<Element>) {
	page_with("mag-card", 3)
}

fn recording(log: &Rc<RefCell<Vec<String>>>) -> impl Fn(&Element, &Payload) -> Result<Element, ActionError> + 'static {
	let log = Rc::clone(log);
	move |element: &Element, _: &Payload| {
		log.borrow_mut().push(element.get_attribute("data-mag-id").unwrap_or_default());
		Ok(element.clone())
	}
}

// ============================================================================
// Happy Path
// ============================================================================

#[rstest]
fn test_local_click_runs_only_on_clicked_instance(cards: (AppContext, Vec<Element>)) {
	let (ctx, elements) = cards;
	let component = Component::new(&ctx, "card").unwrap();
	let log = Rc::new(RefCell::new(Vec::new()));
	component.on_event_local("click", recording(&log)).unwrap();

	elements[1].dispatch_event(&Event::bubbling("click").unwrap()).unwrap();

	assert_eq!(*log.borrow(), vec![component.ids()[1].clone()]);
}

#[rstest]
fn test_global_event_reaches_every_instance_in_order(cards: (AppContext, Vec<Element>)) {
	let (ctx, _) = cards;
	let component = Component::new(&ctx, "card").unwrap();
	let log = Rc::new(RefCell::new(Vec::new()));
	component.on_event_global("resize", recording(&log)).unwrap();

	ctx.window().dispatch_event(&Event::new("resize").unwrap()).unwrap();

	assert_eq!(*log.borrow(), component.ids());
}

#[rstest]
fn test_global_action_receives_event_payload(cards: (AppContext, Vec<Element>)) {
	let (ctx, elements) = cards;
	let component = Component::new(&ctx, "card").unwrap();
	component
		.on_event_global("theme", |element: &Element, payload: &Payload| {
			let theme = payload.detail().and_then(|d| d.as_str().map(str::to_string)).unwrap_or_default();
			element.set_attribute("data-theme", &theme)?;
			Ok(element.clone())
		})
		.unwrap();

	ctx.window().dispatch_custom_event("theme", serde_json::json!("dark")).unwrap();

	assert!(elements.iter().all(|e| e.get_attribute("data-theme").as_deref() == Some("dark")));
}

#[rstest]
fn test_media_query_tracks_viewport() {
	let document = Document::new();
	let window = document.window();
	window.resize_to(1280);
	let is_mobile = State::new(true);
	let mobile = MediaQuery::width(&window, Some(768), None).unwrap();
	let target = is_mobile.clone();

	mobile.subscribe("app", Observer::new(move |m: &bool| target.update(*m))).unwrap();
	assert!(!is_mobile.get());

	window.resize_to(600);
	assert!(is_mobile.get());
}

#[rstest]
fn test_side_effect_observes_replacements() {
	let (ctx, _) = page_with("mag-card", 1);
	let component = Component::new(&ctx, "card").unwrap();
	let tags = Rc::new(RefCell::new(Vec::new()));
	let sink = tags.clone();
	let _subscriptions = component.side_effect(Observer::new(move |e: &Element| sink.borrow_mut().push(e.tag_name())));
	let section = ctx.document().create_element("section").unwrap();

	component.fire_action("replace", section);
	component.fire_action("remove", ());

	assert_eq!(*tags.borrow(), vec!["button", "section", "span"]);
}

// ============================================================================
// Error Path
// ============================================================================

#[rstest]
fn test_failed_action_is_visible_and_recoverable(cards: (AppContext, Vec<Element>)) {
	let (ctx, elements) = cards;
	let component = Component::new(&ctx, "card").unwrap();
	let errors = Rc::new(RefCell::new(Vec::new()));
	let sink = errors.clone();
	component.add_action_with(
		"explode",
		|_: &Element, _: &Payload| Err(ActionError::failed("boom")),
		ActionHooks::new().on_error(move |err| sink.borrow_mut().push(err.to_string())),
	);

	component.fire_action("explode", ());
	assert!(elements.iter().all(|e| e.has_attribute("data-mag-error")));
	assert_eq!(errors.borrow().len(), 3);

	component.fire_action("innerHTML", "fixed");
	assert!(elements.iter().all(|e| !e.has_attribute("data-mag-error")));
	assert!(elements.iter().all(|e| e.inner_html() == "fixed"));
}

#[rstest]
fn test_unknown_action_changes_nothing(cards: (AppContext, Vec<Element>)) {
	let (ctx, elements) = cards;
	let component = Component::new(&ctx, "card").unwrap();
	let before: Vec<String> = elements.iter().map(Element::outer_html).collect();

	component.fire_action("doesNotExist", "x");

	let after: Vec<String> = elements.iter().map(Element::outer_html).collect();
	assert_eq!(before, after);
}

#[rstest]
fn test_event_stream_id_misuse() {
	let document = Document::new();
	let stream = EventStream::new(document.window(), "load", |_: &Event| true);
	stream.subscribe("splash", Observer::empty()).unwrap();

	assert!(matches!(
		stream.subscribe("splash", Observer::empty()),
		Err(PagesError::DuplicateSubscription(_))
	));
	assert!(matches!(stream.unsubscribe("menu"), Err(PagesError::UnknownSubscription(_))));
	assert!(stream.unsubscribe("splash").is_ok());
}

// ============================================================================
// Edge Cases
// ============================================================================

#[rstest]
fn test_on_load_and_global_load_both_run(cards: (AppContext, Vec<Element>)) {
	let (ctx, _) = cards;
	let component = Component::new(&ctx, "card").unwrap();
	let loaded = Rc::new(RefCell::new(Vec::new()));
	let routed = Rc::new(RefCell::new(Vec::new()));
	component.on_load(recording(&loaded)).unwrap();
	component.on_event_global("load", recording(&routed)).unwrap();

	ctx.window().dispatch_event(&Event::new("load").unwrap()).unwrap();

	assert_eq!(*loaded.borrow(), component.ids());
	assert_eq!(*routed.borrow(), component.ids());
}

#[rstest]
fn test_global_route_registered_twice_keeps_one_listener(cards: (AppContext, Vec<Element>)) {
	let (ctx, _) = cards;
	let component = Component::new(&ctx, "card").unwrap();
	let first = Rc::new(RefCell::new(Vec::new()));
	let second = Rc::new(RefCell::new(Vec::new()));
	let loaded = Rc::new(RefCell::new(Vec::new()));
	component.on_load(recording(&loaded)).unwrap();
	component.on_event_global("load", recording(&first)).unwrap();
	component.on_event_global("load", recording(&second)).unwrap();

	ctx.window().dispatch_event(&Event::new("load").unwrap()).unwrap();

	assert!(first.borrow().is_empty());
	assert_eq!(*second.borrow(), component.ids());
	assert_eq!(loaded.borrow().len(), 3);
}

#[rstest]
fn test_action_replacing_its_own_node() {
	let (ctx, _) = page_with("mag-card", 1);
	let component = Component::new(&ctx, "card").unwrap();
	let id = component.ids()[0].clone();
	let node = component.node(&id).unwrap();
	let section = ctx.document().create_element("section").unwrap();
	let payload = section.clone();
	component.add_action("swap", move |element: &Element, _: &Payload| {
		node.fire_action("replace", payload.clone());
		Ok(element.clone())
	});

	component.fire_action("swap", ());

	let bound = component.node(&id).unwrap().element().unwrap();
	assert_eq!(bound, section);
	assert!(bound.is_connected());
	assert_eq!(ctx.document().body().children(), vec![section]);
}

// ============================================================================
// Property-based
// ============================================================================

#[rstest]
fn test_discovery_identities_are_unique() {
	proptest!(|(count in 0usize..24)| {
		let (ctx, elements) = page_with("mag-item", count);
		let component = Component::new(&ctx, "item").unwrap();

		let ids = component.ids();
		prop_assert_eq!(ids.len(), count);
		prop_assert_eq!(ids.iter().collect::<HashSet<_>>().len(), count);
		for (element, id) in elements.iter().zip(&ids) {
			let attr = element.get_attribute("data-mag-id");
			prop_assert_eq!(attr.as_deref(), Some(id.as_str()));
		}
	});
}

// ============================================================================
// Use Cases
// ============================================================================

#[rstest]
fn test_menu_toggle_between_standalone_node_and_component() {
	let (ctx, elements) = page_with("mag-link", 2);
	let menu = ctx.document().create_element("nav").unwrap();
	menu.set_attribute("id", "menu").unwrap();
	ctx.document().body().append_child(&menu).unwrap();

	let menu_node = ManagedNode::by_id(&ctx, "menu").unwrap();
	let links = Component::new(&ctx, "link").unwrap();
	let node = menu_node.clone();
	links
		.on_event_local("click", move |element: &Element, _: &Payload| {
			node.fire_action("opacity", 0.0);
			Ok(element.clone())
		})
		.unwrap();

	elements[0].dispatch_event(&Event::new("click").unwrap()).unwrap();

	assert_eq!(menu.style_property("opacity").as_deref(), Some("0"));
}

#[rstest]
fn test_regenerate_after_markup_change(cards: (AppContext, Vec<Element>)) {
	let (ctx, elements) = cards;
	let component = Component::new(&ctx, "card").unwrap();
	let log = Rc::new(RefCell::new(Vec::new()));
	component.on_event_local_tracked("click", recording(&log)).unwrap();
	elements[2].remove();

	component.regenerate().unwrap();
	elements[2].dispatch_event(&Event::new("click").unwrap()).unwrap();
	elements[0].dispatch_event(&Event::new("click").unwrap()).unwrap();

	assert_eq!(component.ids().len(), 2);
	assert_eq!(*log.borrow(), vec![component.ids()[0].clone()]);
}
