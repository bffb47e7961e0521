use crate::error::Result;
use crate::metadata::{DictExt, Extended};
use crate::util::split_line;
use crate::value::{Dict, Format, Yaml};

/// Splits a `---`-delimited metadata block off the front of a source file.
///
/// The block must open on the very first line. Both delimiter lines consist
/// of exactly three dashes, optionally followed by whitespace. Everything
/// after the closing delimiter line is the body.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrontMatter<F = Yaml> {
    _format: F,
}

/// The result of [`FrontMatter::parse()`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Parsed {
    pub body: String,
    pub metadata: Dict,
}

fn is_delimiter(line: &str) -> bool {
    line.strip_prefix("---").map_or(false, |rest| rest.trim().is_empty())
}

impl<F: Format> FrontMatter<F> {
    pub fn new(format: F) -> Self {
        FrontMatter { _format: format }
    }

    /// Returns the metadata block and the body, or `None` if `input` doesn't
    /// open with a complete block.
    pub fn split<'a>(&self, input: &'a str) -> Option<(&'a str, &'a str)> {
        let (first, mut rest) = split_line(input);
        if !is_delimiter(first) || first.len() == input.len() {
            return None;
        }

        let start = input.len() - rest.len();
        while !rest.is_empty() {
            let end = input.len() - rest.len();
            let (line, next) = split_line(rest);
            if is_delimiter(line) {
                return Some((&input[start..end], next));
            }

            rest = next;
        }

        None
    }

    /// Parses `block` into metadata layered over `defaults`: each top-level
    /// key in `block` replaces the default outright.
    pub fn parse_metadata(&self, block: &str, defaults: Option<&Dict>) -> Result<Dict> {
        let declared = F::read_dict(block)?;
        let mut metadata = defaults.cloned().unwrap_or_default();
        metadata.extend(declared);
        Ok(metadata)
    }

    /// Splits `input` into body and metadata.
    ///
    /// Without a metadata block the body is `input` verbatim and the metadata
    /// is empty; `defaults` only apply to sources that declare a block. A block
    /// that fails to parse is logged and leaves just the defaults.
    pub fn parse(&self, name: &str, input: &str, defaults: Option<&Dict>) -> Parsed {
        let Some((block, body)) = self.split(input) else {
            return Parsed { body: input.to_string(), metadata: Dict::new() };
        };

        let metadata = self.parse_metadata(block, defaults).unwrap_or_else(|e| {
            log::error!("YAML exception reading {name}: {}", e.message());
            log::debug!("{e}");
            defaults.cloned().unwrap_or_default()
        });

        Parsed { body: body.to_string(), metadata }
    }
}

/// Splits `body` at the first line equal to the metadata's `extended` marker.
///
/// Returns `None` when there is no marker, the marker is empty or not a
/// string, or the marker line doesn't occur in `body`. The extended part may be
/// empty when the marker ends the body.
pub fn split_extended(body: &str, metadata: &Dict) -> Option<(String, String)> {
    let marker = match metadata.get_key(Extended)? {
        Ok(marker) if !marker.is_empty() => marker,
        _ => return None,
    };

    let separator = format!("{marker}\n");
    body.split_once(&separator)
        .map(|(main, extended)| (main.to_string(), extended.to_string()))
}
