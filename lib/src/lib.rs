//! Front matter, markup conversion, and layout composition for static site
//! generators.
//!
//! # Overview
//!
//! Stanza turns a raw document, a text file with an optional YAML front matter
//! block, into its final output. Rendering proceeds in three stages:
//!
//! 1. **Read.** The front matter block is split from the body and parsed into
//!    the document's _metadata_, a dictionary of string keys and JSON-like
//!    [`Value`](value::Value)s. Documents created with
//!    [`Document::post()`](document::Document::post) may also carry an
//!    _extended_ body, split off at a marker named by their `extended` key.
//!
//! 2. **Convert.** The first [`Converter`](convert::Converter) that matches
//!    the document's extension rewrites the body (and extended body) into the
//!    output markup, e.g. markdown into HTML, and fixes the output extension.
//!
//! 3. **Compose.** The body is rendered as a template against a payload of
//!    site and page data, then wrapped in its layout, that layout in its own
//!    layout, and so on. Each layout sees the previous output as `content` and
//!    contributes its own metadata to `page`. A layout that repeats in a chain
//!    ends the chain.
//!
//! ```rust
//! use stanza::prelude::*;
//!
//! let layouts = Layouts::new()
//!     .with(Layout::new("post", "<h1>{{ page.title }}</h1>{{ content }}", Dict::new()));
//!
//! let pipeline = Pipeline::new(MiniJinjaEngine::new(), Converters::new(), layouts);
//! let mut doc = Document::new("hi.txt", "---\nlayout: post\ntitle: Hi\n---\nHello", ".txt");
//! pipeline.render(&mut doc);
//! assert_eq!(doc.output, "<h1>Hi</h1>Hello");
//! ```
//!
//! Failures while rendering a single document are logged through the [`log`]
//! facade and never abort the document: the best output so far is kept.

#[macro_use]
pub mod error;
pub mod util;
pub mod value;
pub mod metadata;
pub mod frontmatter;
pub mod document;
pub mod convert;
pub mod templating;
pub mod layout;
pub mod script;
pub mod config;
pub mod pipeline;

pub use rayon;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::convert::{Converter, Converters, MarkdownConverter, MarkdownSettings};
    pub use crate::document::Document;
    pub use crate::error::{Chainable, Error, Result};
    pub use crate::frontmatter::FrontMatter;
    pub use crate::layout::{Layout, LayoutComposer, Layouts};
    pub use crate::pipeline::Pipeline;
    pub use crate::script::{Script, ScriptRunner};
    pub use crate::templating::{Engine, MiniJinjaEngine};
    pub use crate::value::{Dict, Value, Yaml, Toml};
}
