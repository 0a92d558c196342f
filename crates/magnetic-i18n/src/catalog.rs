//! Translation catalog: locale → flat key → string maps.

use std::collections::{BTreeMap, HashMap};

use unic_langid::LanguageIdentifier;

use crate::error::I18nError;

/// Flat translation maps per locale.
///
/// # Example
///
/// ```
/// use magnetic_i18n::Catalog;
///
/// let mut catalog = Catalog::new();
/// catalog.insert_json("es", r#"{ "title": "Hola" }"#).unwrap();
/// catalog.insert("en", [("title", "Hello")]).unwrap();
///
/// assert_eq!(catalog.lookup("es", "title").unwrap(), "Hola");
/// assert_eq!(catalog.locales(), vec!["en", "es"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Catalog {
	locales: BTreeMap<String, HashMap<String, String>>,
}

impl Catalog {
	/// Creates an empty catalog.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `entries` to `locale`, replacing existing keys.
	pub fn insert<I, K, V>(&mut self, locale: &str, entries: I) -> Result<(), I18nError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		validate_locale(locale)?;
		self.locales
			.entry(locale.to_string())
			.or_default()
			.extend(entries.into_iter().map(|(key, value)| (key.into(), value.into())));
		Ok(())
	}

	/// Adds the entries of a JSON object of strings to `locale`.
	pub fn insert_json(&mut self, locale: &str, corpus: &str) -> Result<(), I18nError> {
		let entries: HashMap<String, String> = serde_json::from_str(corpus)?;
		self.insert(locale, entries)
	}

	/// Looks `key` up in `locale`.
	pub fn lookup(&self, locale: &str, key: &str) -> Result<&str, I18nError> {
		let entries = self
			.locales
			.get(locale)
			.ok_or_else(|| I18nError::UnknownLocale(locale.to_string()))?;
		entries
			.get(key)
			.map(String::as_str)
			.ok_or_else(|| I18nError::MissingKey {
				locale: locale.to_string(),
				key: key.to_string(),
			})
	}

	/// Returns true if `locale` has entries.
	pub fn contains_locale(&self, locale: &str) -> bool {
		self.locales.contains_key(locale)
	}

	/// Known locales, sorted.
	pub fn locales(&self) -> Vec<&str> {
		self.locales.keys().map(String::as_str).collect()
	}
}

fn validate_locale(locale: &str) -> Result<(), I18nError> {
	if locale.is_empty() {
		return Err(I18nError::InvalidLocale(String::new()));
	}
	locale
		.parse::<LanguageIdentifier>()
		.map(|_| ())
		.map_err(|_| I18nError::InvalidLocale(locale.to_string()))
}
