//! Browser backend over `web_sys`.

use std::fmt;

use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use super::{DomError, EventCallback, EventSource, Position};

fn host(err: JsValue) -> DomError {
	DomError::Host(
		err.as_string()
			.or_else(|| {
				js_sys::JSON::stringify(&err)
					.ok()
					.and_then(|s| s.as_string())
			})
			.unwrap_or_else(|| "unknown JavaScript error".to_string()),
	)
}

fn to_js(value: &Value) -> Result<JsValue, DomError> {
	let text = serde_json::to_string(value).map_err(|e| DomError::Host(e.to_string()))?;
	js_sys::JSON::parse(&text).map_err(host)
}

fn from_js(value: &JsValue) -> Option<Value> {
	if value.is_undefined() || value.is_null() {
		return None;
	}
	let text = js_sys::JSON::stringify(value).ok()?.as_string()?;
	serde_json::from_str(&text).ok()
}

fn attribute_selector(name: &str, value: Option<&str>) -> String {
	match value {
		Some(value) => format!(
			"[{}=\"{}\"]",
			name,
			value.replace('\\', "\\\\").replace('"', "\\\"")
		),
		None => format!("[{}]", name),
	}
}

fn listen_on(
	target: &web_sys::EventTarget,
	event_type: &str,
	callback: EventCallback,
) -> Result<ListenerHandle, DomError> {
	let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
		callback(&Event { inner: event });
	}) as Box<dyn FnMut(_)>);
	target
		.add_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref())
		.map_err(host)?;
	Ok(ListenerHandle {
		target: target.clone(),
		event_type: event_type.to_string(),
		closure: Some(closure),
	})
}

/// The browser document.
///
/// The body and window are resolved once, when the handle is created.
#[derive(Clone)]
pub struct Document {
	inner: web_sys::Document,
	body: web_sys::Element,
	window: web_sys::Window,
}

impl Document {
	/// Returns the document of the current window.
	pub fn current() -> Result<Self, DomError> {
		let document = web_sys::window()
			.and_then(|window| window.document())
			.ok_or_else(|| DomError::Host("no document available".to_string()))?;
		Self::wrap(document)
	}

	fn wrap(inner: web_sys::Document) -> Result<Self, DomError> {
		let window = inner
			.default_view()
			.or_else(web_sys::window)
			.ok_or_else(|| DomError::Host("document has no window".to_string()))?;
		let body = inner
			.body()
			.map(Into::into)
			.or_else(|| inner.document_element())
			.ok_or_else(|| DomError::Host("document has no body".to_string()))?;
		Ok(Self { inner, body, window })
	}

	/// Returns the `<body>` element.
	pub fn body(&self) -> Element {
		Element {
			inner: self.body.clone(),
		}
	}

	/// Creates a detached element.
	pub fn create_element(&self, tag: &str) -> Result<Element, DomError> {
		self.inner
			.create_element(tag)
			.map(|inner| Element { inner })
			.map_err(host)
	}

	/// Returns the element whose `id` is `id`.
	pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
		self.inner.get_element_by_id(id).map(|inner| Element { inner })
	}

	/// Returns the first element with `name="value"`.
	pub fn query_attribute(&self, name: &str, value: &str) -> Option<Element> {
		self.inner
			.query_selector(&attribute_selector(name, Some(value)))
			.ok()
			.flatten()
			.map(|inner| Element { inner })
	}

	/// Returns elements carrying `class`, in document order.
	pub fn elements_by_class(&self, class: &str) -> Vec<Element> {
		let collection = self.inner.get_elements_by_class_name(class);
		(0..collection.length())
			.filter_map(|index| collection.item(index))
			.map(|inner| Element { inner })
			.collect()
	}

	/// Returns elements carrying attribute `name` (optionally equal to
	/// `value`), in document order.
	pub fn elements_with_attribute(&self, name: &str, value: Option<&str>) -> Vec<Element> {
		let Ok(list) = self.inner.query_selector_all(&attribute_selector(name, value)) else {
			return Vec::new();
		};
		(0..list.length())
			.filter_map(|index| list.item(index))
			.filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
			.map(|inner| Element { inner })
			.collect()
	}

	/// Returns the window of this document.
	pub fn window(&self) -> Window {
		Window {
			inner: self.window.clone(),
		}
	}
}

impl PartialEq for Document {
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl fmt::Debug for Document {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Document").finish_non_exhaustive()
	}
}

impl TryFrom<web_sys::Document> for Document {
	type Error = DomError;

	fn try_from(inner: web_sys::Document) -> Result<Self, Self::Error> {
		Self::wrap(inner)
	}
}

/// Browser element.
#[derive(Clone, PartialEq, Eq)]
pub struct Element {
	inner: web_sys::Element,
}

impl Element {
	/// Underlying `web_sys` element.
	pub fn as_web(&self) -> &web_sys::Element {
		&self.inner
	}

	/// Lowercase tag name.
	pub fn tag_name(&self) -> String {
		self.inner.tag_name().to_ascii_lowercase()
	}

	/// Returns the attribute value, if present.
	pub fn get_attribute(&self, name: &str) -> Option<String> {
		self.inner.get_attribute(name)
	}

	/// Returns true if the attribute is present.
	pub fn has_attribute(&self, name: &str) -> bool {
		self.inner.has_attribute(name)
	}

	/// Sets an attribute, replacing any previous value.
	pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), DomError> {
		self.inner.set_attribute(name, value).map_err(host)
	}

	/// Removes an attribute. Removing an absent attribute is a no-op.
	pub fn remove_attribute(&self, name: &str) -> Result<(), DomError> {
		self.inner.remove_attribute(name).map_err(host)
	}

	/// Returns true if the `class` attribute lists `class`.
	pub fn has_class(&self, class: &str) -> bool {
		self.inner.class_list().contains(class)
	}

	/// Serialized content of the element.
	pub fn inner_html(&self) -> String {
		self.inner.inner_html()
	}

	/// Replaces the content of the element with `markup`.
	pub fn set_inner_html(&self, markup: &str) {
		self.inner.set_inner_html(markup);
	}

	/// Serialized element, including its own tag.
	pub fn outer_html(&self) -> String {
		self.inner.outer_html()
	}

	/// Text of the element and its descendants, without markup.
	pub fn text_content(&self) -> String {
		self.inner.text_content().unwrap_or_default()
	}

	/// Replaces the content of the element with plain text.
	pub fn set_text_content(&self, text: &str) {
		self.inner.set_text_content(Some(text));
	}

	fn style(&self) -> Result<web_sys::CssStyleDeclaration, DomError> {
		self.inner
			.dyn_ref::<web_sys::HtmlElement>()
			.map(|element| element.style())
			.ok_or_else(|| DomError::Host(format!("<{}> has no inline style", self.tag_name())))
	}

	/// Inline style property value.
	pub fn style_property(&self, name: &str) -> Option<String> {
		self.style()
			.ok()?
			.get_property_value(name)
			.ok()
			.filter(|value| !value.is_empty())
	}

	/// Sets an inline style property. An empty value removes it.
	pub fn set_style_property(&self, name: &str, value: &str) -> Result<(), DomError> {
		let style = self.style()?;
		if value.is_empty() {
			return style.remove_property(name).map(|_| ()).map_err(host);
		}
		style.set_property(name, value).map_err(host)
	}

	/// Appends `child` as the last child, moving it from its current parent.
	pub fn append_child(&self, child: &Element) -> Result<(), DomError> {
		self.inner.append_child(&child.inner).map(|_| ()).map_err(host)
	}

	/// Inserts `other` relative to this element.
	pub fn insert_adjacent(&self, position: Position, other: &Element) -> Result<(), DomError> {
		if matches!(position, Position::BeforeBegin | Position::AfterEnd) && self.inner.parent_node().is_none() {
			return Err(DomError::NoParent);
		}
		self.inner
			.insert_adjacent_element(position.as_str(), &other.inner)
			.map(|_| ())
			.map_err(host)
	}

	/// Puts `other` in place of this element. A detached element has nothing
	/// to replace, so the call is a no-op.
	pub fn replace_with(&self, other: &Element) -> Result<(), DomError> {
		if self.inner == other.inner || self.inner.parent_node().is_none() {
			return Ok(());
		}
		self.inner.replace_with_with_node_1(&other.inner).map_err(host)
	}

	/// Detaches the element from its parent.
	pub fn remove(&self) {
		self.inner.remove();
	}

	/// Returns true if the element is attached to the document.
	pub fn is_connected(&self) -> bool {
		self.inner.is_connected()
	}

	/// Parent element, if attached.
	pub fn parent(&self) -> Option<Element> {
		self.inner.parent_element().map(|inner| Element { inner })
	}

	/// Child elements in order.
	pub fn children(&self) -> Vec<Element> {
		let collection = self.inner.children();
		(0..collection.length())
			.filter_map(|index| collection.item(index))
			.map(|inner| Element { inner })
			.collect()
	}

	/// Document the element belongs to.
	pub fn owner_document(&self) -> Result<Document, DomError> {
		let document = self
			.inner
			.owner_document()
			.ok_or_else(|| DomError::Host("element has no owner document".to_string()))?;
		Document::wrap(document)
	}

	/// Dispatches `event` at this element.
	pub fn dispatch_event(&self, event: &Event) -> Result<(), DomError> {
		self.inner.dispatch_event(&event.inner).map(|_| ()).map_err(host)
	}
}

impl fmt::Debug for Element {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Element")
			.field("tag", &self.tag_name())
			.field("id", &self.inner.id())
			.finish()
	}
}

impl From<web_sys::Element> for Element {
	fn from(inner: web_sys::Element) -> Self {
		Self { inner }
	}
}

impl EventSource for Element {
	fn listen(&self, event_type: &str, callback: EventCallback) -> Result<ListenerHandle, DomError> {
		listen_on(&self.inner, event_type, callback)
	}
}

/// The browser window.
#[derive(Clone)]
pub struct Window {
	inner: web_sys::Window,
}

impl Window {
	/// Dispatches `event` to the window listeners.
	pub fn dispatch_event(&self, event: &Event) -> Result<(), DomError> {
		self.inner.dispatch_event(&event.inner).map(|_| ()).map_err(host)
	}

	/// Dispatches a custom event carrying `detail`.
	pub fn dispatch_custom_event(&self, name: &str, detail: Value) -> Result<(), DomError> {
		self.dispatch_event(&Event::custom(name, detail)?)
	}

	/// Creates a media query list for `query`.
	pub fn match_media(&self, query: &str) -> Result<MediaQueryList, DomError> {
		self.inner
			.match_media(query)
			.map_err(host)?
			.map(|inner| MediaQueryList { inner })
			.ok_or_else(|| DomError::UnsupportedMediaQuery(query.to_string()))
	}

	/// Viewport width in CSS pixels.
	pub fn inner_width(&self) -> u32 {
		self.inner
			.inner_width()
			.ok()
			.and_then(|width| width.as_f64())
			.map(|width| width as u32)
			.unwrap_or(0)
	}
}

impl fmt::Debug for Window {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Window")
			.field("inner_width", &self.inner_width())
			.finish()
	}
}

impl EventSource for Window {
	fn listen(&self, event_type: &str, callback: EventCallback) -> Result<ListenerHandle, DomError> {
		listen_on(&self.inner, event_type, callback)
	}
}

/// Result of [`Window::match_media`].
#[derive(Clone)]
pub struct MediaQueryList {
	inner: web_sys::MediaQueryList,
}

impl MediaQueryList {
	/// Current match state.
	pub fn matches(&self) -> bool {
		self.inner.matches()
	}

	/// The media condition.
	pub fn media(&self) -> String {
		self.inner.media()
	}
}

impl fmt::Debug for MediaQueryList {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MediaQueryList")
			.field("media", &self.media())
			.field("matches", &self.matches())
			.finish()
	}
}

impl EventSource for MediaQueryList {
	fn listen(&self, event_type: &str, callback: EventCallback) -> Result<ListenerHandle, DomError> {
		listen_on(&self.inner, event_type, callback)
	}
}

/// A DOM event.
#[derive(Clone)]
pub struct Event {
	inner: web_sys::Event,
}

impl Event {
	/// Creates a non-bubbling event.
	pub fn new(event_type: &str) -> Result<Self, DomError> {
		web_sys::Event::new(event_type)
			.map(|inner| Self { inner })
			.map_err(host)
	}

	/// Creates a bubbling event, like a user click.
	pub fn bubbling(event_type: &str) -> Result<Self, DomError> {
		let init = web_sys::EventInit::new();
		init.set_bubbles(true);
		web_sys::Event::new_with_event_init_dict(event_type, &init)
			.map(|inner| Self { inner })
			.map_err(host)
	}

	/// Creates a custom event carrying `detail`.
	pub fn custom(event_type: &str, detail: Value) -> Result<Self, DomError> {
		let init = web_sys::CustomEventInit::new();
		init.set_detail(&to_js(&detail)?);
		web_sys::CustomEvent::new_with_event_init_dict(event_type, &init)
			.map(|custom| Self { inner: custom.into() })
			.map_err(host)
	}

	/// Event name.
	pub fn event_type(&self) -> String {
		self.inner.type_()
	}

	/// Detail of a custom event.
	pub fn detail(&self) -> Option<Value> {
		self.inner
			.dyn_ref::<web_sys::CustomEvent>()
			.and_then(|custom| from_js(&custom.detail()))
	}

	/// Element the event was dispatched at.
	pub fn target(&self) -> Option<Element> {
		self.inner
			.target()
			.and_then(|target| target.dyn_into::<web_sys::Element>().ok())
			.map(|inner| Element { inner })
	}

	/// Stops propagation to ancestors.
	pub fn stop_propagation(&self) {
		self.inner.stop_propagation();
	}
}

impl fmt::Debug for Event {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event")
			.field("type", &self.event_type())
			.finish_non_exhaustive()
	}
}

/// Keeps a listener attached; dropping it detaches the listener.
pub struct ListenerHandle {
	target: web_sys::EventTarget,
	event_type: String,
	closure: Option<Closure<dyn FnMut(web_sys::Event)>>,
}

impl ListenerHandle {
	/// Leaves the listener attached for the lifetime of the page.
	pub fn forget(mut self) {
		if let Some(closure) = self.closure.take() {
			closure.forget();
		}
	}
}

impl Drop for ListenerHandle {
	fn drop(&mut self) {
		if let Some(closure) = self.closure.take() {
			let _ = self
				.target
				.remove_event_listener_with_callback(&self.event_type, closure.as_ref().unchecked_ref());
		}
	}
}

impl fmt::Debug for ListenerHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ListenerHandle")
			.field("event_type", &self.event_type)
			.field("attached", &self.closure.is_some())
			.finish()
	}
}
