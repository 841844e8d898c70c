//! Translation lookup with graceful degradation

use crate::catalog::Catalog;
use crate::error::TranslationError;
use crate::format::{sprintf, Arg};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What to do when a template and its arguments disagree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatPolicy {
    /// Report the mismatch as an error. Used in development and tests.
    Strict,
    /// Log a warning and return the template unformatted
    Lenient,
}

impl FormatPolicy {
    /// Strict in debug builds, lenient in release builds
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            FormatPolicy::Strict
        } else {
            FormatPolicy::Lenient
        }
    }
}

impl Default for FormatPolicy {
    fn default() -> Self {
        Self::for_build()
    }
}

/// Looks up `Plugin_Key` style keys and formats the result
#[derive(Debug, Clone, Default)]
pub struct Translator {
    catalog: Catalog,
    policy: FormatPolicy,
}

impl Translator {
    pub fn new(catalog: Catalog, policy: FormatPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    pub fn policy(&self) -> FormatPolicy {
        self.policy
    }

    /// Template registered for `key`, if any.
    ///
    /// The key is split at its first `_` into plugin and entry name.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        let (plugin, entry) = key.split_once('_')?;
        self.catalog.get(plugin, entry)
    }

    pub fn has_translation(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Translate `key` and substitute `args`.
    ///
    /// A key missing from the catalog is not an error: the key itself is
    /// used as the template. With no arguments the template is returned
    /// verbatim. A malformed template or an argument count mismatch is an
    /// error under [`FormatPolicy::Strict`] and returns the bare template
    /// under [`FormatPolicy::Lenient`].
    pub fn translate(&self, key: &str, args: &[Arg]) -> Result<String, TranslationError> {
        let template = self.lookup(key).unwrap_or(key);
        if args.is_empty() {
            return Ok(template.to_string());
        }

        match sprintf(template, args) {
            Ok(formatted) => Ok(formatted),
            Err(e) => match self.policy {
                FormatPolicy::Strict => Err(e),
                FormatPolicy::Lenient => {
                    warn!("⚠️ Translation {} not formatted: {}", key, e);
                    Ok(template.to_string())
                }
            },
        }
    }

    /// Translate for use inside error messages. Never fails: any error
    /// falls back to the raw message.
    pub fn translate_exception(&self, message: &str, args: &[Arg]) -> String {
        self.translate(message, args).unwrap_or_else(|e| {
            debug!("Falling back to raw message for {}: {}", message, e);
            message.to_string()
        })
    }
}
