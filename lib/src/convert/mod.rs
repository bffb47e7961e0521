mod markdown;

pub use markdown::*;

use std::fmt::Debug;
use std::sync::Arc;

use crate::document::Document;
use crate::error::{Chainable, Result};

/// Converts text from an authoring markup into a publishable one.
pub trait Converter: Send + Sync + Debug {
    /// Whether this converter handles sources with extension `ext`.
    fn matches(&self, ext: &str) -> bool;

    /// The extension converted output should carry, given the source's.
    fn output_ext(&self, ext: &str) -> String;

    fn convert(&self, content: &str) -> Result<String>;

    /// Emitted before highlighted code so the converter leaves it alone.
    fn highlight_prefix(&self) -> &str {
        ""
    }

    /// Emitted after highlighted code. See [`Converter::highlight_prefix()`].
    fn highlight_suffix(&self) -> &str {
        ""
    }
}

/// An ordered registry of converters. The first converter that matches an
/// extension wins.
#[derive(Debug, Clone, Default)]
pub struct Converters {
    converters: Vec<Arc<dyn Converter>>,
}

impl Converters {
    pub fn new() -> Self {
        Converters::default()
    }

    pub fn with<C: Converter + 'static>(mut self, converter: C) -> Self {
        self.push(converter);
        self
    }

    pub fn push<C: Converter + 'static>(&mut self, converter: C) {
        self.converters.push(Arc::new(converter));
    }

    pub fn find(&self, ext: &str) -> Option<&dyn Converter> {
        self.converters.iter()
            .find(|c| c.matches(ext))
            .map(|c| &**c)
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

/// Converts `document`'s body, and its extended body if it has a non-empty
/// one, with the converter matching its extension, and rewrites the extension
/// to the converter's output extension.
///
/// Returns `Ok(false)` and leaves the document untouched if no converter
/// matches. On error the document is left untouched as well.
pub fn transform(document: &mut Document, converters: &Converters) -> Result<bool> {
    let Some(converter) = converters.find(&document.ext) else {
        log::debug!("no converter for {} ({})", document.name, document.ext);
        return Ok(false);
    };

    let body = converter.convert(&document.body).chain_with(|| error! {
        "failed to convert document body",
        "document" => &document.name,
        "extension" => &document.ext,
    })?;

    let extended = match &document.extended {
        Some(extended) if document.supports_extended() && !extended.is_empty() => {
            let converted = converter.convert(extended).chain_with(|| error! {
                "failed to convert extended body",
                "document" => &document.name,
                "extension" => &document.ext,
            })?;

            Some(converted)
        }
        _ => None,
    };

    document.ext = converter.output_ext(&document.ext);
    document.body = body;
    if extended.is_some() {
        document.extended = extended;
    }

    Ok(true)
}
