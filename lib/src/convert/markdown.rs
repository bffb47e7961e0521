use pulldown_cmark::{html, Options, Parser};
use serde::{Deserialize, Serialize};

use crate::convert::Converter;
use crate::error::Result;

/// Settings for [`MarkdownConverter`], read from the `[markdown]` table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MarkdownSettings {
    /// Extensions, with or without the leading `.`, treated as markdown.
    pub extensions: Vec<String>,
    pub smart_punctuation: bool,
    pub highlight_prefix: String,
    pub highlight_suffix: String,
}

impl Default for MarkdownSettings {
    fn default() -> Self {
        MarkdownSettings {
            extensions: ["markdown", "mkdown", "mkdn", "mkd", "md"]
                .into_iter()
                .map(String::from)
                .collect(),
            smart_punctuation: false,
            highlight_prefix: "\n".into(),
            highlight_suffix: "\n".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarkdownConverter {
    settings: MarkdownSettings,
    options: Options,
}

impl MarkdownConverter {
    pub fn new(settings: MarkdownSettings) -> Self {
        let mut options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES;

        if settings.smart_punctuation {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }

        MarkdownConverter { settings, options }
    }
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        MarkdownConverter::new(MarkdownSettings::default())
    }
}

impl Converter for MarkdownConverter {
    fn matches(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.settings.extensions.iter()
            .any(|known| known.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    fn output_ext(&self, _: &str) -> String {
        ".html".into()
    }

    fn convert(&self, content: &str) -> Result<String> {
        let parser = Parser::new_ext(content, self.options);
        let mut html_output = String::with_capacity(content.len() * 3 / 2);
        html::push_html(&mut html_output, parser);
        Ok(html_output)
    }

    fn highlight_prefix(&self) -> &str {
        &self.settings.highlight_prefix
    }

    fn highlight_suffix(&self) -> &str {
        &self.settings.highlight_suffix
    }
}
