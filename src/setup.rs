//! Application start-up wiring.

use std::rc::Rc;

use magnetic_core::reactive::{Observer, State};
use magnetic_i18n::{Catalog, I18nError, LangSelector, TextReplacer};
use magnetic_pages::dom::Event;
use magnetic_pages::{AppContext, EventStream, MediaQuery, PagesError};
use thiserror::Error;
use tracing::info;

const APP_SUBSCRIPTION: &str = "menu";

/// Failure while wiring the application.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SetupError {
	/// A stream, node or component could not be created.
	#[error(transparent)]
	Pages(#[from] PagesError),
	/// The i18n components could not be created.
	#[error(transparent)]
	I18n(#[from] I18nError),
}

/// The application state built by [`setup`].
#[derive(Debug)]
pub struct AppState {
	/// True while the viewport is at most `media.mobile_max_width` wide.
	pub is_mobile: State<bool>,
	/// True once the window `load` event fired.
	pub is_loaded: State<bool>,
	/// The mobile width query feeding `is_mobile`.
	pub mobile: MediaQuery,
	/// The window `load` event feeding `is_loaded`.
	pub load: EventStream<bool>,
	/// Replaces the `mag-i18n` texts on locale events.
	pub i18n: TextReplacer,
	/// Dispatches locale events from `mag-langSelector` clicks.
	pub lang_selector: LangSelector,
}

/// Wires the mobile flag, the load flag and the i18n pair.
///
/// Everything stays connected for as long as the returned [`AppState`] is
/// alive.
pub fn setup(ctx: &AppContext, catalog: Rc<Catalog>) -> Result<AppState, SetupError> {
	let is_mobile = State::new(false);
	let mobile = MediaQuery::width(&ctx.window(), Some(ctx.settings().media.mobile_max_width), None)?;
	let target = is_mobile.clone();
	mobile.subscribe(APP_SUBSCRIPTION, Observer::new(move |matches: &bool| target.update(*matches)))?;

	let is_loaded = State::new(false);
	let load = EventStream::new(ctx.window(), "load", |_: &Event| true);
	let target = is_loaded.clone();
	load.subscribe(APP_SUBSCRIPTION, Observer::new(move |loaded: &bool| target.update(*loaded)))?;

	let i18n = TextReplacer::new(ctx, catalog)?;
	let lang_selector = LangSelector::new(ctx)?;
	info!(
		target: "magnetic",
		"Application ready: {} i18n element(s), {} language selector(s), mobile query '{}'",
		i18n.component().ids().len(),
		lang_selector.component().ids().len(),
		mobile.query()
	);

	Ok(AppState {
		is_mobile,
		is_loaded,
		mobile,
		load,
		i18n,
		lang_selector,
	})
}
