//! Error types for the i18n components.

use magnetic_pages::PagesError;
use thiserror::Error;

/// Errors raised by the catalog and the i18n components.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum I18nError {
	/// The catalog has no entries for the locale.
	#[error("Unknown locale '{0}'")]
	UnknownLocale(String),
	/// The locale has no entry for the key.
	#[error("Missing translation for '{key}' in locale '{locale}'")]
	MissingKey {
		/// Locale looked up.
		locale: String,
		/// Key looked up.
		key: String,
	},
	/// The locale code is not a valid language identifier.
	#[error("Invalid locale '{0}'")]
	InvalidLocale(String),
	/// A corpus could not be parsed as a flat key → string map.
	#[error("Invalid translation corpus: {0}")]
	Corpus(#[from] serde_json::Error),
	/// Component discovery or event dispatch failed.
	#[error(transparent)]
	Pages(#[from] PagesError),
}
