//! # Tally i18n
//!
//! Translation lookup for Tally. Keys follow the `Plugin_Key` convention: the
//! part before the first underscore selects the plugin's table, the rest
//! selects the template inside it.
//!
//! Lookup never fails on a missing key; the key itself is used as the
//! template. Formatting follows printf conventions (`%s`, `%d`, `%1$s`, ...).
//!
//! ```rust
//! use tally_i18n::{Catalog, FormatPolicy, Translator};
//!
//! let mut catalog = Catalog::new();
//! catalog.insert("Foo", "Greeting", "Hello %s");
//! let translator = Translator::new(catalog, FormatPolicy::Strict);
//!
//! assert_eq!(translator.translate("Foo_Greeting", &["World".into()]).unwrap(), "Hello World");
//! assert_eq!(translator.translate("Foo_Bar", &[]).unwrap(), "Foo_Bar");
//! ```

pub mod catalog;
pub mod error;
pub mod format;
pub mod translator;

pub use catalog::Catalog;
pub use error::TranslationError;
pub use format::{sprintf, Arg};
pub use translator::{FormatPolicy, Translator};
