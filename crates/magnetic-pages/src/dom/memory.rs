//! In-memory document for native targets.
//!
//! Nodes live in an arena owned by the document; [`Element`] is a
//! `(document, index)` handle. The document has no HTML parser: markup set
//! through `set_inner_html` is kept verbatim as the element's leading content,
//! and element children are serialized after it.
//!
//! Slots of detached subtrees are reused once no handle points into them, and
//! media entries once their last list handle is dropped.
//!
//! Media queries understand `(max-width: Npx)` and `(min-width: Npx)`
//! conditions joined by `and`, plus the empty query (always matches). They are
//! evaluated against the viewport width set with [`Window::resize_to`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

use super::{DomError, EventCallback, EventSource, Position};

const BODY: usize = 0;
const DEFAULT_VIEWPORT_WIDTH: u32 = 1024;

struct NodeData {
	tag: String,
	attributes: Vec<(String, String)>,
	style: Vec<(String, String)>,
	markup: String,
	children: Vec<usize>,
	parent: Option<usize>,
}

impl NodeData {
	fn new(tag: &str) -> Self {
		Self {
			tag: tag.to_ascii_lowercase(),
			attributes: Vec::new(),
			style: Vec::new(),
			markup: String::new(),
			children: Vec::new(),
			parent: None,
		}
	}

	fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}

	fn has_class(&self, class: &str) -> bool {
		self.attribute("class")
			.is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
	Window,
	Element(usize),
	Media(usize),
}

struct Listener {
	id: u64,
	target: Target,
	event_type: String,
	callback: EventCallback,
}

#[derive(Debug, Clone, Copy)]
enum WidthCondition {
	Max(u32),
	Min(u32),
}

struct MediaEntry {
	query: String,
	conditions: Vec<WidthCondition>,
	matches: bool,
	handles: usize,
}

struct DomInner {
	nodes: RefCell<Vec<NodeData>>,
	/// Live [`Element`] handles per slot.
	handles: RefCell<Vec<usize>>,
	free: RefCell<Vec<usize>>,
	listeners: RefCell<Vec<Listener>>,
	next_listener: Cell<u64>,
	media: RefCell<Vec<Option<MediaEntry>>>,
	free_media: RefCell<Vec<usize>>,
	width: Cell<u32>,
}

impl DomInner {
	fn allocate(&self, tag: &str) -> usize {
		let reused = self.free.borrow_mut().pop();
		match reused {
			Some(key) => {
				self.nodes.borrow_mut()[key] = NodeData::new(tag);
				self.handles.borrow_mut()[key] = 0;
				key
			}
			None => {
				let mut nodes = self.nodes.borrow_mut();
				nodes.push(NodeData::new(tag));
				self.handles.borrow_mut().push(0);
				nodes.len() - 1
			}
		}
	}

	fn retain(&self, key: usize) {
		self.handles.borrow_mut()[key] += 1;
	}

	fn release(&self, key: usize) {
		let remaining = {
			let mut handles = self.handles.borrow_mut();
			handles[key] = handles[key].saturating_sub(1);
			handles[key]
		};
		if remaining == 0 {
			self.collect(key);
		}
	}

	/// Frees the detached subtree containing `key` when no handle points
	/// into it. Skipped while the arena is borrowed; a later release retries.
	fn collect(&self, key: usize) {
		let removed = {
			let (Ok(mut nodes), Ok(handles), Ok(mut listeners)) = (
				self.nodes.try_borrow_mut(),
				self.handles.try_borrow(),
				self.listeners.try_borrow_mut(),
			) else {
				return;
			};
			let mut root = key;
			while let Some(parent) = nodes[root].parent {
				root = parent;
			}
			if root == BODY {
				return;
			}
			let mut subtree = Vec::new();
			let mut stack = vec![root];
			while let Some(index) = stack.pop() {
				if handles[index] > 0 {
					return;
				}
				subtree.push(index);
				stack.extend(nodes[index].children.iter().copied());
			}
			for index in &subtree {
				nodes[*index] = NodeData::new("");
			}
			let (removed, kept): (Vec<Listener>, Vec<Listener>) = std::mem::take(&mut *listeners)
				.into_iter()
				.partition(|listener| matches!(listener.target, Target::Element(index) if subtree.contains(&index)));
			*listeners = kept;
			self.free.borrow_mut().extend(subtree);
			removed
		};
		// Callbacks may own element handles; drop them with no borrow held.
		drop(removed);
	}

	fn release_media(&self, key: usize) {
		let removed = {
			let (Ok(mut media), Ok(mut listeners)) = (self.media.try_borrow_mut(), self.listeners.try_borrow_mut())
			else {
				return;
			};
			let Some(entry) = media[key].as_mut() else {
				return;
			};
			entry.handles = entry.handles.saturating_sub(1);
			if entry.handles > 0 {
				return;
			}
			media[key] = None;
			let (removed, kept): (Vec<Listener>, Vec<Listener>) = std::mem::take(&mut *listeners)
				.into_iter()
				.partition(|listener| listener.target == Target::Media(key));
			*listeners = kept;
			self.free_media.borrow_mut().push(key);
			removed
		};
		drop(removed);
	}

	fn is_connected(&self, key: usize) -> bool {
		let nodes = self.nodes.borrow();
		let mut current = Some(key);
		while let Some(index) = current {
			if index == BODY {
				return true;
			}
			current = nodes[index].parent;
		}
		false
	}

	/// Returns true if `ancestor` is `node` or one of its ancestors.
	fn is_inclusive_ancestor(&self, ancestor: usize, node: usize) -> bool {
		let nodes = self.nodes.borrow();
		let mut current = Some(node);
		while let Some(index) = current {
			if index == ancestor {
				return true;
			}
			current = nodes[index].parent;
		}
		false
	}

	/// Connected elements in document (pre-)order.
	fn document_order(&self) -> Vec<usize> {
		let nodes = self.nodes.borrow();
		let mut order = Vec::new();
		let mut stack = vec![BODY];
		while let Some(index) = stack.pop() {
			order.push(index);
			stack.extend(nodes[index].children.iter().rev().copied());
		}
		order
	}

	fn find_all(&self, predicate: impl Fn(&NodeData) -> bool) -> Vec<usize> {
		let order = self.document_order();
		let nodes = self.nodes.borrow();
		order
			.into_iter()
			.filter(|index| predicate(&nodes[*index]))
			.collect()
	}

	fn detach(&self, key: usize) {
		let mut nodes = self.nodes.borrow_mut();
		if let Some(parent) = nodes[key].parent.take() {
			nodes[parent].children.retain(|child| *child != key);
		}
	}

	fn detach_children(&self, key: usize) {
		let children = {
			let mut nodes = self.nodes.borrow_mut();
			let children = std::mem::take(&mut nodes[key].children);
			for child in &children {
				nodes[*child].parent = None;
			}
			children
		};
		for child in children {
			self.collect(child);
		}
	}

	fn insert(&self, parent: usize, reference: Reference, child: usize) -> Result<(), DomError> {
		if self.is_inclusive_ancestor(child, parent) {
			return Err(DomError::HierarchyRequest);
		}
		self.detach(child);
		let mut nodes = self.nodes.borrow_mut();
		let children = &mut nodes[parent].children;
		match reference {
			Reference::First => children.insert(0, child),
			Reference::Last => children.push(child),
			Reference::Before(sibling) | Reference::After(sibling) => {
				let index = children
					.iter()
					.position(|c| *c == sibling)
					.ok_or(DomError::NoParent)?;
				let index = if matches!(reference, Reference::After(_)) {
					index + 1
				} else {
					index
				};
				children.insert(index, child);
			}
		}
		nodes[child].parent = Some(parent);
		Ok(())
	}

	fn add_listener(self: &Rc<Self>, target: Target, event_type: &str, callback: EventCallback) -> ListenerHandle {
		let id = self.next_listener.get();
		self.next_listener.set(id + 1);
		self.listeners.borrow_mut().push(Listener {
			id,
			target,
			event_type: event_type.to_string(),
			callback,
		});
		ListenerHandle {
			doc: Rc::downgrade(self),
			id,
			attached: true,
		}
	}

	fn remove_listener(&self, id: u64) {
		let removed = {
			let mut listeners = self.listeners.borrow_mut();
			listeners
				.iter()
				.position(|listener| listener.id == id)
				.map(|index| listeners.remove(index))
		};
		drop(removed);
	}

	fn is_listening(&self, id: u64) -> bool {
		self.listeners.borrow().iter().any(|listener| listener.id == id)
	}

	/// Invokes every listener of `target` for the event. Listeners removed by
	/// an earlier callback of the same dispatch are skipped.
	fn invoke(&self, target: Target, event: &Event) {
		let callbacks: Vec<(u64, EventCallback)> = self
			.listeners
			.borrow()
			.iter()
			.filter(|listener| listener.target == target && listener.event_type == event.inner.event_type)
			.map(|listener| (listener.id, Rc::clone(&listener.callback)))
			.collect();
		for (id, callback) in callbacks {
			if event.inner.stopped.get() {
				break;
			}
			if self.is_listening(id) {
				callback(event);
			}
		}
	}

	fn serialize(&self, key: usize, out: &mut String) {
		let nodes = self.nodes.borrow();
		serialize_node(&nodes, key, out);
	}

	fn serialize_children(&self, key: usize) -> String {
		let nodes = self.nodes.borrow();
		let mut out = nodes[key].markup.clone();
		for child in &nodes[key].children {
			serialize_node(&nodes, *child, &mut out);
		}
		out
	}

	fn text(&self, key: usize) -> String {
		let nodes = self.nodes.borrow();
		let mut out = String::new();
		collect_text(&nodes, key, &mut out);
		out
	}
}

#[derive(Debug, Clone, Copy)]
enum Reference {
	First,
	Last,
	Before(usize),
	After(usize),
}

fn serialize_node(nodes: &[NodeData], key: usize, out: &mut String) {
	let node = &nodes[key];
	out.push('<');
	out.push_str(&node.tag);
	for (name, value) in &node.attributes {
		out.push_str(&format!(" {}=\"{}\"", name, escape(value)));
	}
	if !node.style.is_empty() {
		out.push_str(&format!(" style=\"{}\"", escape(&style_text(&node.style))));
	}
	out.push('>');
	out.push_str(&node.markup);
	for child in &node.children {
		serialize_node(nodes, *child, out);
	}
	out.push_str(&format!("</{}>", node.tag));
}

fn collect_text(nodes: &[NodeData], key: usize, out: &mut String) {
	out.push_str(&strip_tags(&nodes[key].markup));
	for child in &nodes[key].children {
		collect_text(nodes, *child, out);
	}
}

fn strip_tags(markup: &str) -> String {
	let mut text = String::with_capacity(markup.len());
	let mut in_tag = false;
	for c in markup.chars() {
		match c {
			'<' => in_tag = true,
			'>' if in_tag => in_tag = false,
			_ if !in_tag => text.push(c),
			_ => {}
		}
	}
	text.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&quot;", "\"")
		.replace("&amp;", "&")
}

fn escape(text: &str) -> String {
	text.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
}

fn style_text(style: &[(String, String)]) -> String {
	style
		.iter()
		.map(|(name, value)| format!("{}: {};", name, value))
		.collect::<Vec<_>>()
		.join(" ")
}

fn parse_style(text: &str) -> Vec<(String, String)> {
	text.split(';')
		.filter_map(|declaration| {
			let (name, value) = declaration.split_once(':')?;
			let (name, value) = (name.trim(), value.trim());
			(!name.is_empty() && !value.is_empty()).then(|| (name.to_string(), value.to_string()))
		})
		.collect()
}

fn parse_media_query(query: &str) -> Result<Vec<WidthCondition>, DomError> {
	let trimmed = query.trim();
	if trimmed.is_empty() {
		return Ok(Vec::new());
	}
	trimmed
		.split(" and ")
		.map(|part| {
			parse_condition(part.trim()).ok_or_else(|| DomError::UnsupportedMediaQuery(query.to_string()))
		})
		.collect()
}

fn parse_condition(part: &str) -> Option<WidthCondition> {
	let inner = part.strip_prefix('(')?.strip_suffix(')')?;
	let (feature, value) = inner.split_once(':')?;
	let px = value.trim().strip_suffix("px")?.trim().parse().ok()?;
	match feature.trim() {
		"max-width" => Some(WidthCondition::Max(px)),
		"min-width" => Some(WidthCondition::Min(px)),
		_ => None,
	}
}

fn evaluate(conditions: &[WidthCondition], width: u32) -> bool {
	conditions.iter().all(|condition| match condition {
		WidthCondition::Max(max) => width <= *max,
		WidthCondition::Min(min) => width >= *min,
	})
}

fn valid_tag(tag: &str) -> bool {
	!tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// An in-memory document with a `<body>` root.
#[derive(Clone)]
pub struct Document {
	inner: Rc<DomInner>,
}

impl Document {
	/// Creates an empty document.
	pub fn new() -> Self {
		Self {
			inner: Rc::new(DomInner {
				nodes: RefCell::new(vec![NodeData::new("body")]),
				handles: RefCell::new(vec![0]),
				free: RefCell::new(Vec::new()),
				listeners: RefCell::new(Vec::new()),
				next_listener: Cell::new(0),
				media: RefCell::new(Vec::new()),
				free_media: RefCell::new(Vec::new()),
				width: Cell::new(DEFAULT_VIEWPORT_WIDTH),
			}),
		}
	}

	/// Returns the `<body>` element.
	pub fn body(&self) -> Element {
		self.element(BODY)
	}

	/// Creates a detached element.
	pub fn create_element(&self, tag: &str) -> Result<Element, DomError> {
		if !valid_tag(tag) {
			return Err(DomError::Host(format!("invalid tag name '{}'", tag)));
		}
		let key = self.inner.allocate(tag);
		Ok(self.element(key))
	}

	/// Returns the first connected element whose `id` is `id`.
	pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
		self.query_attribute("id", id)
	}

	/// Returns the first connected element with `name="value"`.
	pub fn query_attribute(&self, name: &str, value: &str) -> Option<Element> {
		self.inner
			.find_all(|node| node.attribute(name) == Some(value))
			.first()
			.map(|key| self.element(*key))
	}

	/// Returns connected elements carrying `class`, in document order.
	pub fn elements_by_class(&self, class: &str) -> Vec<Element> {
		self.inner
			.find_all(|node| node.has_class(class))
			.into_iter()
			.map(|key| self.element(key))
			.collect()
	}

	/// Returns connected elements carrying attribute `name` (optionally equal
	/// to `value`), in document order.
	pub fn elements_with_attribute(&self, name: &str, value: Option<&str>) -> Vec<Element> {
		self.inner
			.find_all(|node| match (node.attribute(name), value) {
				(Some(actual), Some(expected)) => actual == expected,
				(Some(_), None) => true,
				(None, _) => false,
			})
			.into_iter()
			.map(|key| self.element(key))
			.collect()
	}

	/// Returns the window of this document.
	pub fn window(&self) -> Window {
		Window {
			inner: Rc::clone(&self.inner),
		}
	}

	fn element(&self, key: usize) -> Element {
		Element::handle(&self.inner, key)
	}
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

impl PartialEq for Document {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl fmt::Debug for Document {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Document")
			.field("nodes", &self.inner.nodes.borrow().len())
			.finish_non_exhaustive()
	}
}

/// Handle to an element of a [`Document`].
pub struct Element {
	inner: Rc<DomInner>,
	key: usize,
}

impl Element {
	fn handle(inner: &Rc<DomInner>, key: usize) -> Self {
		inner.retain(key);
		Self {
			inner: Rc::clone(inner),
			key,
		}
	}

	/// Lowercase tag name.
	pub fn tag_name(&self) -> String {
		self.inner.nodes.borrow()[self.key].tag.clone()
	}

	/// Returns the attribute value, if present.
	pub fn get_attribute(&self, name: &str) -> Option<String> {
		let nodes = self.inner.nodes.borrow();
		let node = &nodes[self.key];
		if name == "style" && !node.style.is_empty() {
			return Some(style_text(&node.style));
		}
		node.attribute(name).map(str::to_string)
	}

	/// Returns true if the attribute is present.
	pub fn has_attribute(&self, name: &str) -> bool {
		self.get_attribute(name).is_some()
	}

	/// Sets an attribute, replacing any previous value.
	pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), DomError> {
		let mut nodes = self.inner.nodes.borrow_mut();
		let node = &mut nodes[self.key];
		if name == "style" {
			node.style = parse_style(value);
			return Ok(());
		}
		match node.attributes.iter_mut().find(|(key, _)| key == name) {
			Some(entry) => entry.1 = value.to_string(),
			None => node.attributes.push((name.to_string(), value.to_string())),
		}
		Ok(())
	}

	/// Removes an attribute. Removing an absent attribute is a no-op.
	pub fn remove_attribute(&self, name: &str) -> Result<(), DomError> {
		let mut nodes = self.inner.nodes.borrow_mut();
		let node = &mut nodes[self.key];
		if name == "style" {
			node.style.clear();
		}
		node.attributes.retain(|(key, _)| key != name);
		Ok(())
	}

	/// Returns true if the `class` attribute lists `class`.
	pub fn has_class(&self, class: &str) -> bool {
		self.inner.nodes.borrow()[self.key].has_class(class)
	}

	/// Serialized content of the element.
	pub fn inner_html(&self) -> String {
		self.inner.serialize_children(self.key)
	}

	/// Replaces the content of the element with `markup`.
	pub fn set_inner_html(&self, markup: &str) {
		self.inner.detach_children(self.key);
		self.inner.nodes.borrow_mut()[self.key].markup = markup.to_string();
	}

	/// Serialized element, including its own tag.
	pub fn outer_html(&self) -> String {
		let mut out = String::new();
		self.inner.serialize(self.key, &mut out);
		out
	}

	/// Text of the element and its descendants, without markup.
	pub fn text_content(&self) -> String {
		self.inner.text(self.key)
	}

	/// Replaces the content of the element with plain text.
	pub fn set_text_content(&self, text: &str) {
		self.set_inner_html(&escape(text));
	}

	/// Inline style property value.
	pub fn style_property(&self, name: &str) -> Option<String> {
		self.inner.nodes.borrow()[self.key]
			.style
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.clone())
	}

	/// Sets an inline style property. An empty value removes it.
	pub fn set_style_property(&self, name: &str, value: &str) -> Result<(), DomError> {
		let mut nodes = self.inner.nodes.borrow_mut();
		let style = &mut nodes[self.key].style;
		if value.is_empty() {
			style.retain(|(key, _)| key != name);
			return Ok(());
		}
		match style.iter_mut().find(|(key, _)| key == name) {
			Some(entry) => entry.1 = value.to_string(),
			None => style.push((name.to_string(), value.to_string())),
		}
		Ok(())
	}

	/// Appends `child` as the last child, moving it from its current parent.
	pub fn append_child(&self, child: &Element) -> Result<(), DomError> {
		self.same_document(child)?;
		self.inner.insert(self.key, Reference::Last, child.key)
	}

	/// Inserts `other` relative to this element.
	pub fn insert_adjacent(&self, position: Position, other: &Element) -> Result<(), DomError> {
		self.same_document(other)?;
		if other.key == self.key {
			return Err(DomError::HierarchyRequest);
		}
		match position {
			Position::AfterBegin => self.inner.insert(self.key, Reference::First, other.key),
			Position::BeforeEnd => self.inner.insert(self.key, Reference::Last, other.key),
			Position::BeforeBegin | Position::AfterEnd => {
				let parent = self.parent_key().ok_or(DomError::NoParent)?;
				let reference = if position == Position::BeforeBegin {
					Reference::Before(self.key)
				} else {
					Reference::After(self.key)
				};
				self.inner.insert(parent, reference, other.key)
			}
		}
	}

	/// Puts `other` in place of this element. A detached element has nothing
	/// to replace, so the call is a no-op.
	pub fn replace_with(&self, other: &Element) -> Result<(), DomError> {
		self.same_document(other)?;
		if other.key == self.key {
			return Ok(());
		}
		let Some(parent) = self.parent_key() else {
			return Ok(());
		};
		self.inner.insert(parent, Reference::Before(self.key), other.key)?;
		self.inner.detach(self.key);
		Ok(())
	}

	/// Detaches the element from its parent.
	pub fn remove(&self) {
		self.inner.detach(self.key);
	}

	/// Returns true if the element is attached to the document body.
	pub fn is_connected(&self) -> bool {
		self.inner.is_connected(self.key)
	}

	/// Parent element, if attached.
	pub fn parent(&self) -> Option<Element> {
		self.parent_key().map(|key| Element::handle(&self.inner, key))
	}

	/// Child elements in order.
	pub fn children(&self) -> Vec<Element> {
		let keys = self.inner.nodes.borrow()[self.key].children.clone();
		keys.into_iter()
			.map(|key| Element::handle(&self.inner, key))
			.collect()
	}

	/// Document the element belongs to.
	pub fn owner_document(&self) -> Result<Document, DomError> {
		Ok(Document {
			inner: Rc::clone(&self.inner),
		})
	}

	/// Dispatches `event` at this element. Bubbling events propagate to the
	/// ancestors and, for connected elements, to the window.
	pub fn dispatch_event(&self, event: &Event) -> Result<(), DomError> {
		event.inner.target.borrow_mut().get_or_insert_with(|| self.clone());
		self.inner.invoke(Target::Element(self.key), event);
		if !event.inner.bubbles {
			return Ok(());
		}
		let mut current = self.parent_key();
		while let Some(key) = current {
			if event.inner.stopped.get() {
				return Ok(());
			}
			self.inner.invoke(Target::Element(key), event);
			current = self.inner.nodes.borrow()[key].parent;
		}
		if self.is_connected() && !event.inner.stopped.get() {
			self.inner.invoke(Target::Window, event);
		}
		Ok(())
	}

	fn parent_key(&self) -> Option<usize> {
		self.inner.nodes.borrow()[self.key].parent
	}

	fn same_document(&self, other: &Element) -> Result<(), DomError> {
		if Rc::ptr_eq(&self.inner, &other.inner) {
			Ok(())
		} else {
			Err(DomError::Host("element belongs to another document".to_string()))
		}
	}
}

impl Clone for Element {
	fn clone(&self) -> Self {
		Element::handle(&self.inner, self.key)
	}
}

impl Drop for Element {
	fn drop(&mut self) {
		self.inner.release(self.key);
	}
}

impl PartialEq for Element {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner) && self.key == other.key
	}
}

impl Eq for Element {}

impl fmt::Debug for Element {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Element")
			.field("tag", &self.tag_name())
			.field("key", &self.key)
			.finish()
	}
}

impl EventSource for Element {
	fn listen(&self, event_type: &str, callback: EventCallback) -> Result<ListenerHandle, DomError> {
		Ok(self
			.inner
			.add_listener(Target::Element(self.key), event_type, callback))
	}
}

/// The window of a [`Document`].
#[derive(Clone)]
pub struct Window {
	inner: Rc<DomInner>,
}

impl Window {
	/// Dispatches `event` to the window listeners.
	pub fn dispatch_event(&self, event: &Event) -> Result<(), DomError> {
		self.inner.invoke(Target::Window, event);
		Ok(())
	}

	/// Dispatches a custom event carrying `detail`.
	pub fn dispatch_custom_event(&self, name: &str, detail: Value) -> Result<(), DomError> {
		self.dispatch_event(&Event::custom(name, detail)?)
	}

	/// Creates a media query list for `query`.
	pub fn match_media(&self, query: &str) -> Result<MediaQueryList, DomError> {
		let conditions = parse_media_query(query)?;
		let matches = evaluate(&conditions, self.inner.width.get());
		let entry = MediaEntry {
			query: query.to_string(),
			conditions,
			matches,
			handles: 1,
		};
		let reused = self.inner.free_media.borrow_mut().pop();
		let mut media = self.inner.media.borrow_mut();
		let key = match reused {
			Some(key) => {
				media[key] = Some(entry);
				key
			}
			None => {
				media.push(Some(entry));
				media.len() - 1
			}
		};
		Ok(MediaQueryList {
			inner: Rc::clone(&self.inner),
			key,
		})
	}

	/// Viewport width in CSS pixels.
	pub fn inner_width(&self) -> u32 {
		self.inner.width.get()
	}

	/// Resizes the viewport. Every media query list whose match state flips
	/// receives a `change` event.
	pub fn resize_to(&self, width: u32) {
		self.inner.width.set(width);
		let flipped: Vec<usize> = self
			.inner
			.media
			.borrow_mut()
			.iter_mut()
			.enumerate()
			.filter_map(|(key, slot)| {
				let entry = slot.as_mut()?;
				let matches = evaluate(&entry.conditions, width);
				(matches != entry.matches).then(|| {
					entry.matches = matches;
					key
				})
			})
			.collect();
		for key in flipped {
			let event = Event::build("change", false, None);
			self.inner.invoke(Target::Media(key), &event);
		}
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
		Ok(self.inner.add_listener(Target::Window, event_type, callback))
	}
}

/// Result of [`Window::match_media`].
pub struct MediaQueryList {
	inner: Rc<DomInner>,
	key: usize,
}

impl MediaQueryList {
	/// Current match state.
	pub fn matches(&self) -> bool {
		self.inner.media.borrow()[self.key]
			.as_ref()
			.is_some_and(|entry| entry.matches)
	}

	/// The media condition.
	pub fn media(&self) -> String {
		self.inner.media.borrow()[self.key]
			.as_ref()
			.map(|entry| entry.query.clone())
			.unwrap_or_default()
	}
}

impl Clone for MediaQueryList {
	fn clone(&self) -> Self {
		if let Some(entry) = self.inner.media.borrow_mut()[self.key].as_mut() {
			entry.handles += 1;
		}
		Self {
			inner: Rc::clone(&self.inner),
			key: self.key,
		}
	}
}

impl Drop for MediaQueryList {
	fn drop(&mut self) {
		self.inner.release_media(self.key);
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
		Ok(self
			.inner
			.add_listener(Target::Media(self.key), event_type, callback))
	}
}

struct EventData {
	event_type: String,
	bubbles: bool,
	detail: Option<Value>,
	target: RefCell<Option<Element>>,
	stopped: Cell<bool>,
}

/// A DOM event. Clones share the same event.
#[derive(Clone)]
pub struct Event {
	inner: Rc<EventData>,
}

impl Event {
	/// Creates a non-bubbling event.
	pub fn new(event_type: &str) -> Result<Self, DomError> {
		Ok(Self::build(event_type, false, None))
	}

	/// Creates a bubbling event, like a user click.
	pub fn bubbling(event_type: &str) -> Result<Self, DomError> {
		Ok(Self::build(event_type, true, None))
	}

	/// Creates a custom event carrying `detail`.
	pub fn custom(event_type: &str, detail: Value) -> Result<Self, DomError> {
		Ok(Self::build(event_type, false, Some(detail)))
	}

	fn build(event_type: &str, bubbles: bool, detail: Option<Value>) -> Self {
		Self {
			inner: Rc::new(EventData {
				event_type: event_type.to_string(),
				bubbles,
				detail,
				target: RefCell::new(None),
				stopped: Cell::new(false),
			}),
		}
	}

	/// Event name.
	pub fn event_type(&self) -> String {
		self.inner.event_type.clone()
	}

	/// Detail of a custom event.
	pub fn detail(&self) -> Option<Value> {
		self.inner.detail.clone()
	}

	/// Element the event was dispatched at.
	pub fn target(&self) -> Option<Element> {
		self.inner.target.borrow().clone()
	}

	/// Stops propagation to the remaining listeners and ancestors.
	pub fn stop_propagation(&self) {
		self.inner.stopped.set(true);
	}
}

impl fmt::Debug for Event {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event")
			.field("type", &self.inner.event_type)
			.field("detail", &self.inner.detail)
			.finish_non_exhaustive()
	}
}

/// Keeps a listener attached; dropping it detaches the listener.
pub struct ListenerHandle {
	doc: Weak<DomInner>,
	id: u64,
	attached: bool,
}

impl ListenerHandle {
	/// Leaves the listener attached for the lifetime of the document.
	pub fn forget(mut self) {
		self.attached = false;
	}
}

impl Drop for ListenerHandle {
	fn drop(&mut self) {
		if !self.attached {
			return;
		}
		if let Some(doc) = self.doc.upgrade() {
			doc.remove_listener(self.id);
		}
	}
}

impl fmt::Debug for ListenerHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ListenerHandle")
			.field("id", &self.id)
			.field("attached", &self.attached)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};

	#[fixture]
	fn document() -> Document {
		Document::new()
	}

	fn child(document: &Document, parent: &Element, tag: &str) -> Element {
		let element = document.create_element(tag).unwrap();
		parent.append_child(&element).unwrap();
		element
	}

	#[rstest]
	fn test_queries_follow_document_order(document: Document) {
		let body = document.body();
		let outer = child(&document, &body, "div");
		let inner = child(&document, &outer, "p");
		let last = child(&document, &body, "p");
		for element in [&outer, &inner, &last] {
			element.set_attribute("class", "mag-x other").unwrap();
		}

		assert_eq!(document.elements_by_class("mag-x"), vec![outer, inner, last]);
		assert!(document.elements_by_class("mag").is_empty());
	}

	#[rstest]
	fn test_detached_elements_are_not_queried(document: Document) {
		let element = document.create_element("div").unwrap();
		element.set_attribute("id", "ghost").unwrap();
		assert!(document.get_element_by_id("ghost").is_none());

		document.body().append_child(&element).unwrap();
		assert_eq!(document.get_element_by_id("ghost"), Some(element));
	}

	#[rstest]
	fn test_replace_with_keeps_position(document: Document) {
		let body = document.body();
		let first = child(&document, &body, "a");
		let second = child(&document, &body, "b");
		let third = child(&document, &body, "c");
		let replacement = document.create_element("span").unwrap();

		second.replace_with(&replacement).unwrap();

		assert_eq!(body.children(), vec![first, replacement, third]);
		assert!(!second.is_connected());
		assert!(second.parent().is_none());
	}

	#[rstest]
	fn test_replace_with_on_detached_is_noop(document: Document) {
		let detached = document.create_element("div").unwrap();
		let other = document.create_element("span").unwrap();

		detached.replace_with(&other).unwrap();

		assert!(!other.is_connected());
	}

	#[rstest]
	#[case(Position::BeforeBegin, "<div><i></i><p></p></div>")]
	#[case(Position::AfterBegin, "<div><p><i></i></p></div>")]
	#[case(Position::BeforeEnd, "<div><p><i></i></p></div>")]
	#[case(Position::AfterEnd, "<div><p></p><i></i></div>")]
	fn test_insert_adjacent(document: Document, #[case] position: Position, #[case] expected: &str) {
		let wrapper = child(&document, &document.body(), "div");
		let target = child(&document, &wrapper, "p");
		let inserted = document.create_element("i").unwrap();

		target.insert_adjacent(position, &inserted).unwrap();

		assert_eq!(wrapper.outer_html(), expected);
	}

	#[rstest]
	fn test_insert_adjacent_without_parent(document: Document) {
		let lonely = document.create_element("p").unwrap();
		let other = document.create_element("i").unwrap();

		assert_eq!(
			lonely.insert_adjacent(Position::AfterEnd, &other),
			Err(DomError::NoParent)
		);
	}

	#[rstest]
	fn test_append_ancestor_is_rejected(document: Document) {
		let outer = child(&document, &document.body(), "div");
		let inner = child(&document, &outer, "div");

		assert_eq!(inner.append_child(&outer), Err(DomError::HierarchyRequest));
	}

	#[rstest]
	fn test_inner_html_and_text(document: Document) {
		let element = child(&document, &document.body(), "div");
		element.set_inner_html("<b>Hola</b> &amp; adi&oacute;s");

		assert_eq!(element.inner_html(), "<b>Hola</b> &amp; adi&oacute;s");
		assert_eq!(element.text_content(), "Hola & adi&oacute;s");

		element.set_text_content("<hi>");
		assert_eq!(element.inner_html(), "&lt;hi&gt;");
		assert_eq!(element.text_content(), "<hi>");
	}

	#[rstest]
	fn test_style_properties(document: Document) {
		let element = document.create_element("div").unwrap();
		element.set_style_property("opacity", "0.5").unwrap();
		element.set_style_property("transform", "scale(2)").unwrap();

		assert_eq!(element.style_property("opacity").as_deref(), Some("0.5"));
		assert_eq!(
			element.get_attribute("style").as_deref(),
			Some("opacity: 0.5; transform: scale(2);")
		);

		element.set_style_property("opacity", "").unwrap();
		assert!(element.style_property("opacity").is_none());
	}

	#[rstest]
	fn test_bubbling_reaches_window(document: Document) {
		let outer = child(&document, &document.body(), "div");
		let button = child(&document, &outer, "button");
		let seen = Rc::new(RefCell::new(Vec::new()));

		let log = seen.clone();
		let _outer = outer
			.listen("click", Rc::new(move |_: &Event| log.borrow_mut().push("outer")))
			.unwrap();
		let log = seen.clone();
		let _window = document
			.window()
			.listen("click", Rc::new(move |_: &Event| log.borrow_mut().push("window")))
			.unwrap();
		let log = seen.clone();
		let _button = button
			.listen("click", Rc::new(move |event: &Event| {
				assert_eq!(event.event_type(), "click");
				log.borrow_mut().push("button");
			}))
			.unwrap();

		button.dispatch_event(&Event::bubbling("click").unwrap()).unwrap();
		button.dispatch_event(&Event::new("click").unwrap()).unwrap();

		assert_eq!(*seen.borrow(), vec!["button", "outer", "window", "button"]);
	}

	#[rstest]
	fn test_dropping_handle_detaches_listener(document: Document) {
		let window = document.window();
		let calls = Rc::new(Cell::new(0));
		let counter = calls.clone();
		let handle = window
			.listen("load", Rc::new(move |_: &Event| counter.set(counter.get() + 1)))
			.unwrap();

		window.dispatch_event(&Event::new("load").unwrap()).unwrap();
		drop(handle);
		window.dispatch_event(&Event::new("load").unwrap()).unwrap();

		assert_eq!(calls.get(), 1);
	}

	#[rstest]
	fn test_custom_event_detail(document: Document) {
		let window = document.window();
		let detail = Rc::new(RefCell::new(None));
		let sink = detail.clone();
		let _handle = window
			.listen("i18n_update", Rc::new(move |event: &Event| *sink.borrow_mut() = event.detail()))
			.unwrap();

		window
			.dispatch_custom_event("i18n_update", Value::String("es".to_string()))
			.unwrap();

		assert_eq!(*detail.borrow(), Some(Value::String("es".to_string())));
	}

	#[rstest]
	#[case("", 300, true)]
	#[case("(max-width: 768px)", 768, true)]
	#[case("(max-width: 768px)", 769, false)]
	#[case("(min-width: 400px)", 399, false)]
	#[case("(max-width: 900px) and (min-width: 400px)", 500, true)]
	#[case("(max-width: 900px) and (min-width: 400px)", 901, false)]
	fn test_media_evaluation(document: Document, #[case] query: &str, #[case] width: u32, #[case] expected: bool) {
		let window = document.window();
		window.resize_to(width);

		assert_eq!(window.match_media(query).unwrap().matches(), expected);
	}

	#[rstest]
	fn test_unsupported_media_query(document: Document) {
		assert_eq!(
			document.window().match_media("(orientation: portrait)").unwrap_err(),
			DomError::UnsupportedMediaQuery("(orientation: portrait)".to_string())
		);
	}

	#[rstest]
	fn test_resize_fires_change_on_flip(document: Document) {
		let window = document.window();
		let list = window.match_media("(max-width: 768px)").unwrap();
		let changes = Rc::new(Cell::new(0));
		let counter = changes.clone();
		let _handle = list
			.listen("change", Rc::new(move |_: &Event| counter.set(counter.get() + 1)))
			.unwrap();

		window.resize_to(1200);
		window.resize_to(500);
		window.resize_to(400);

		assert_eq!(changes.get(), 1);
		assert!(list.matches());
	}

	#[rstest]
	fn test_detached_slots_are_reused(document: Document) {
		for _ in 0..100 {
			let element = document.create_element("div").unwrap();
			child(&document, &element, "span");
		}

		assert_eq!(document.inner.nodes.borrow().len(), 3);
	}

	#[rstest]
	fn test_replaced_markup_frees_children(document: Document) {
		let list = child(&document, &document.body(), "ul");
		for _ in 0..10 {
			child(&document, &list, "li");
			list.set_inner_html("");
		}

		assert_eq!(document.inner.nodes.borrow().len(), 3);
	}

	#[rstest]
	fn test_held_descendant_keeps_subtree(document: Document) {
		let outer = document.create_element("div").unwrap();
		let inner = child(&document, &outer, "p");
		drop(outer);
		let fresh = document.create_element("section").unwrap();

		let parent = inner.parent().unwrap();
		assert_eq!(parent.tag_name(), "div");
		assert_ne!(parent, fresh);
	}

	#[rstest]
	fn test_connected_elements_are_never_freed(document: Document) {
		let element = child(&document, &document.body(), "p");
		element.set_attribute("id", "kept").unwrap();
		drop(element);

		let _fresh = document.create_element("div").unwrap();

		let kept = document.get_element_by_id("kept").unwrap();
		assert_eq!(kept.tag_name(), "p");
	}

	#[rstest]
	fn test_freed_slot_drops_its_listeners(document: Document) {
		let calls = Rc::new(Cell::new(0));
		let counter = calls.clone();
		let element = document.create_element("div").unwrap();
		element
			.listen("click", Rc::new(move |_: &Event| counter.set(counter.get() + 1)))
			.unwrap()
			.forget();
		drop(element);

		let reused = document.create_element("div").unwrap();
		reused.dispatch_event(&Event::new("click").unwrap()).unwrap();

		assert_eq!(calls.get(), 0);
		assert_eq!(document.inner.nodes.borrow().len(), 2);
	}

	#[rstest]
	fn test_media_entries_are_reused(document: Document) {
		let window = document.window();
		for _ in 0..50 {
			let list = window.match_media("(max-width: 500px)").unwrap();
			let _copy = list.clone();
		}
		let kept = window.match_media("(min-width: 100px)").unwrap();

		assert_eq!(document.inner.media.borrow().len(), 1);
		assert!(kept.matches());
	}
}
