//! Text replacer: swaps the content of the i18n component on locale events.

use std::fmt;
use std::rc::Rc;

use magnetic_core::conf::Settings;
use magnetic_core::reactive::{Observer, State};
use magnetic_pages::dom::Element;
use magnetic_pages::events::{EventStream, custom_stream, dispatch_custom};
use magnetic_pages::{ActionError, AppContext, Component, Payload, event_action_name};

use crate::catalog::Catalog;
use crate::error::I18nError;

/// Name of the component whose instances get their text replaced.
pub const COMPONENT_NAME: &str = "i18n";

const LOCALE_SUBSCRIPTION: &str = "locale";

/// Translation key of `element`: its `data-<prefix>-i18n-key`, or else its
/// `id` without the configured id prefix.
pub fn translation_key(element: &Element, settings: &Settings) -> Option<String> {
	element.get_attribute(&settings.i18n_key_attribute()).or_else(|| {
		element
			.get_attribute("id")
			.and_then(|id| id.strip_prefix(settings.i18n.id_prefix.as_str()).map(str::to_string))
	})
}

/// Replaces the markup of every `<prefix>-i18n` element when the locale
/// event (`i18n_update` by default) is dispatched on the window.
///
/// The event detail is the locale code. Elements whose key is missing from
/// the catalog keep their text and get the error attribute.
///
/// # Example
///
/// ```ignore
/// use magnetic_i18n::{Catalog, TextReplacer};
/// use std::rc::Rc;
///
/// let replacer = TextReplacer::new(&ctx, Rc::new(catalog))?;
/// replacer.apply("es")?;
/// assert_eq!(replacer.locale(), "es");
/// ```
pub struct TextReplacer {
	ctx: AppContext,
	component: Component,
	catalog: Rc<Catalog>,
	locale: State<String>,
	locale_events: EventStream<String>,
}

impl TextReplacer {
	/// Discovers the i18n elements and starts listening for the locale event.
	pub fn new(ctx: &AppContext, catalog: Rc<Catalog>) -> Result<Self, I18nError> {
		let settings = ctx.settings();
		let event = settings.i18n.event.clone();
		let component = Component::new(ctx, COMPONENT_NAME)?;
		component.on_event_global(&event, replace_text(settings.clone(), Rc::clone(&catalog), &event))?;

		let locale = State::new(settings.i18n.default_locale.clone());
		let locale_events = custom_stream::<String>(ctx, &event);
		let target = locale.clone();
		locale_events.subscribe(
			LOCALE_SUBSCRIPTION,
			Observer::new(move |code: &String| target.update(code.clone())),
		)?;

		Ok(Self {
			ctx: ctx.clone(),
			component,
			catalog,
			locale,
			locale_events,
		})
	}

	/// Dispatches the locale event for `locale`.
	pub fn apply(&self, locale: &str) -> Result<(), I18nError> {
		if !self.catalog.contains_locale(locale) {
			return Err(I18nError::UnknownLocale(locale.to_string()));
		}
		dispatch_custom(&self.ctx, self.locale_events.event_type(), locale)?;
		Ok(())
	}

	/// The locale of the last locale event, or the default locale.
	pub fn locale(&self) -> String {
		self.locale.get()
	}

	/// The locale as an observable state.
	pub fn locale_state(&self) -> &State<String> {
		&self.locale
	}

	/// The catalog.
	pub fn catalog(&self) -> &Catalog {
		&self.catalog
	}

	/// The underlying component.
	pub fn component(&self) -> &Component {
		&self.component
	}
}

impl fmt::Debug for TextReplacer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TextReplacer")
			.field("component", &self.component)
			.field("locale", &self.locale.get())
			.field("locales", &self.catalog.locales())
			.finish()
	}
}

fn replace_text(
	settings: Settings,
	catalog: Rc<Catalog>,
	event: &str,
) -> impl Fn(&Element, &Payload) -> Result<Element, ActionError> + 'static {
	let action = event_action_name(event);
	move |element: &Element, payload: &Payload| {
		let locale = payload
			.as_text()
			.map(str::to_string)
			.or_else(|| payload.detail().and_then(|detail| detail.as_str().map(str::to_string)))
			.ok_or_else(|| ActionError::invalid_payload(action.clone(), "a locale code"))?;
		let key = translation_key(element, &settings)
			.ok_or_else(|| ActionError::failed("element has no translation key"))?;
		let text = catalog
			.lookup(&locale, &key)
			.map_err(|err| ActionError::failed(err.to_string()))?;
		element.set_inner_html(text);
		Ok(element.clone())
	}
}
