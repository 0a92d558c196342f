//! Language selector: turns clicks into locale events.

use std::fmt;

use magnetic_pages::dom::Element;
use magnetic_pages::events::dispatch_custom;
use magnetic_pages::{ActionError, AppContext, Component, Payload, warn_log};

use crate::error::I18nError;

/// Name of the component whose instances select a locale.
pub const COMPONENT_NAME: &str = "langSelector";

/// Dispatches the locale event when a `<prefix>-langSelector` element is
/// clicked. The locale is the element's `data-<prefix>-i18n-lang`; elements
/// without it do nothing.
///
/// ```html
/// <button class="mag-langSelector" data-mag-i18n-lang="es">ES</button>
/// ```
pub struct LangSelector {
	component: Component,
}

impl LangSelector {
	/// Discovers the selector elements and listens for clicks on each.
	pub fn new(ctx: &AppContext) -> Result<Self, I18nError> {
		let component = Component::new(ctx, COMPONENT_NAME)?;
		let lang_attribute = ctx.settings().i18n_lang_attribute();
		let event = ctx.settings().i18n.event.clone();
		let dispatcher = ctx.clone();
		component.on_event_local("click", move |element: &Element, _: &Payload| {
			match element.get_attribute(&lang_attribute) {
				Some(locale) => dispatch_custom(&dispatcher, &event, &locale)
					.map_err(|err| ActionError::failed(err.to_string()))?,
				None => warn_log!("Language selector clicked without '{}'", lang_attribute),
			}
			Ok(element.clone())
		})?;
		Ok(Self { component })
	}

	/// The underlying component.
	pub fn component(&self) -> &Component {
		&self.component
	}
}

impl fmt::Debug for LangSelector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LangSelector")
			.field("component", &self.component)
			.finish()
	}
}
