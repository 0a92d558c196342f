//! Engine settings
//!
//! [`Settings`] carries the naming conventions shared by the binding engine
//! and the components built on it: the marker prefix every component class
//! and data attribute is namespaced with, the placeholder used by the
//! `remove` action, and the i18n / media defaults.
//!
//! Settings are plain data: every field has a default, and a TOML document
//! only needs to name the keys it overrides.
//!
//! ```
//! use magnetic_core::conf::Settings;
//!
//! let settings = Settings::from_toml_str(
//!     r#"
//!     prefix = "ui"
//!
//!     [media]
//!     mobile_max_width = 640
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(settings.identity_attribute(), "data-ui-id");
//! assert_eq!(settings.component_marker("i18n"), "ui-i18n");
//! assert_eq!(settings.media.mobile_max_width, 640);
//! assert_eq!(settings.i18n.event, "i18n_update");
//! ```

use serde::Deserialize;

/// Settings error
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfError {
	/// The TOML document could not be parsed.
	#[error("Failed to parse settings: {0}")]
	Parse(#[from] toml::de::Error),

	/// A value failed validation.
	#[error("Invalid value for '{key}': {message}")]
	Invalid {
		/// Offending key.
		key: String,
		/// Why the value was rejected.
		message: String,
	},
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
	/// Marker namespace (`mag` gives `mag-<name>` classes and `data-mag-id`).
	pub prefix: String,
	/// Tag of the empty element substituted by the `remove` action.
	pub placeholder_tag: String,
	/// Internationalization conventions.
	pub i18n: I18nSettings,
	/// Media query defaults.
	pub media: MediaSettings,
}

/// Internationalization conventions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct I18nSettings {
	/// Name of the window event carrying a locale change.
	pub event: String,
	/// Locale in effect before any locale event.
	pub default_locale: String,
	/// Prefix stripped from element ids to obtain translation keys.
	pub id_prefix: String,
}

/// Media query defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaSettings {
	/// Upper viewport width (px) of the mobile layout.
	pub mobile_max_width: u32,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			prefix: "mag".to_string(),
			placeholder_tag: "span".to_string(),
			i18n: I18nSettings::default(),
			media: MediaSettings::default(),
		}
	}
}

impl Default for I18nSettings {
	fn default() -> Self {
		Self {
			event: "i18n_update".to_string(),
			default_locale: "en".to_string(),
			id_prefix: "i-".to_string(),
		}
	}
}

impl Default for MediaSettings {
	fn default() -> Self {
		Self {
			mobile_max_width: 768,
		}
	}
}

impl Settings {
	/// Parses and validates settings from a TOML document.
	pub fn from_toml_str(source: &str) -> Result<Self, ConfError> {
		let settings: Self = toml::from_str(source)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Checks that names derived from the settings are usable in markup.
	pub fn validate(&self) -> Result<(), ConfError> {
		if self.prefix.is_empty() {
			return Err(invalid("prefix", "must not be empty"));
		}
		if !self
			.prefix
			.chars()
			.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
		{
			return Err(invalid(
				"prefix",
				"only lowercase ASCII letters, digits and '-' are allowed",
			));
		}
		if self.placeholder_tag.is_empty()
			|| !self.placeholder_tag.chars().all(|c| c.is_ascii_alphanumeric())
		{
			return Err(invalid("placeholder_tag", "must be a plain tag name"));
		}
		if self.i18n.event.is_empty() {
			return Err(invalid("i18n.event", "must not be empty"));
		}
		if self.i18n.default_locale.is_empty() {
			return Err(invalid("i18n.default_locale", "must not be empty"));
		}
		Ok(())
	}

	/// Attribute holding generated instance identities (`data-<prefix>-id`).
	pub fn identity_attribute(&self) -> String {
		format!("data-{}-id", self.prefix)
	}

	/// Attribute marking elements whose last action failed.
	pub fn error_attribute(&self) -> String {
		format!("data-{}-error", self.prefix)
	}

	/// Attribute carrying a language selector's locale.
	pub fn i18n_lang_attribute(&self) -> String {
		format!("data-{}-i18n-lang", self.prefix)
	}

	/// Attribute carrying an element's translation key.
	pub fn i18n_key_attribute(&self) -> String {
		format!("data-{}-i18n-key", self.prefix)
	}

	/// Class marker of the component called `name`.
	pub fn component_marker(&self, name: &str) -> String {
		format!("{}-{}", self.prefix, name)
	}
}

fn invalid(key: &str, message: &str) -> ConfError {
	ConfError::Invalid {
		key: key.to_string(),
		message: message.to_string(),
	}
}
