use std::sync::Arc;

use crate::convert::Converters;
use crate::frontmatter::{split_extended, FrontMatter, Parsed};
use crate::value::{Dict, Format};

/// A single source file on its way to rendered output.
///
/// A document is owned by one pipeline run: it is read, converted, composed,
/// and then its `output` is taken by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub name: Arc<str>,
    pub raw_content: String,
    pub body: String,
    pub extended: Option<String>,
    pub metadata: Dict,
    /// The current extension, including the leading `.`. Rewritten when the
    /// body is converted.
    pub ext: String,
    pub output: String,
    supports_extended: bool,
}

impl Document {
    /// A page-like document. Pages never carry extended content.
    pub fn new<N, R, E>(name: N, raw: R, ext: E) -> Self
        where N: Into<Arc<str>>, R: Into<String>, E: Into<String>
    {
        let raw_content = raw.into();
        Document {
            name: name.into(),
            body: raw_content.clone(),
            raw_content,
            extended: None,
            metadata: Dict::new(),
            ext: ext.into(),
            output: String::new(),
            supports_extended: false,
        }
    }

    /// A post-like document, which may split an extended body off its main
    /// body at a marker line declared in its metadata.
    pub fn post<N, R, E>(name: N, raw: R, ext: E) -> Self
        where N: Into<Arc<str>>, R: Into<String>, E: Into<String>
    {
        Document { supports_extended: true, ..Document::new(name, raw, ext) }
    }

    pub fn supports_extended(&self) -> bool {
        self.supports_extended
    }

    /// Splits `raw_content` into metadata and body, layering the declared
    /// metadata over `defaults`, and splits off the extended body if this
    /// document supports one.
    pub fn read<F: Format>(&mut self, front_matter: &FrontMatter<F>, defaults: Option<&Dict>) {
        let Parsed { body, metadata } = front_matter.parse(&self.name, &self.raw_content, defaults);
        self.metadata = metadata;
        self.body = body;
        self.extended = None;

        if self.supports_extended {
            if let Some((main, extended)) = split_extended(&self.body, &self.metadata) {
                self.body = main;
                self.extended = Some(extended);
            }
        }
    }

    /// The body followed by the extended body, if any.
    pub fn text(&self) -> String {
        match &self.extended {
            Some(extended) if self.supports_extended => format!("{}{}", self.body, extended),
            _ => self.body.clone(),
        }
    }

    /// The extension the output of this document should be written with.
    pub fn output_ext(&self, converters: &Converters) -> String {
        match converters.find(&self.ext) {
            Some(converter) => converter.output_ext(&self.ext),
            None => self.ext.clone(),
        }
    }
}
