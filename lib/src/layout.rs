use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::dict;
use crate::convert::Converter;
use crate::document::Document;
use crate::frontmatter::{FrontMatter, Parsed};
use crate::metadata::{DictExt, LayoutName};
use crate::templating::Engine;
use crate::value::{deep_merge, Dict, Format, Value};

/// A named template that wraps rendered content. Its metadata may name a
/// parent layout that wraps it in turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub name: Arc<str>,
    pub content: String,
    pub metadata: Dict,
}

impl Layout {
    pub fn new<N, C>(name: N, content: C, metadata: Dict) -> Self
        where N: Into<Arc<str>>, C: Into<String>
    {
        Layout { name: name.into(), content: content.into(), metadata }
    }

    /// Reads a layout from source that may open with a front matter block.
    pub fn parse<N, F>(name: N, raw: &str, front_matter: &FrontMatter<F>) -> Self
        where N: Into<Arc<str>>, F: Format
    {
        let name = name.into();
        let Parsed { body, metadata } = front_matter.parse(&name, raw, None);
        Layout { name, content: body, metadata }
    }

    /// The name of this layout's parent layout, if it declares one.
    pub fn parent(&self) -> Option<Arc<str>> {
        self.metadata.get_key(LayoutName)?.ok()
    }
}

/// Layouts by name. Read-only while documents are composed.
#[derive(Debug, Clone, Default)]
pub struct Layouts {
    map: FxHashMap<Arc<str>, Layout>,
}

impl Layouts {
    pub fn new() -> Self {
        Layouts::default()
    }

    pub fn insert(&mut self, layout: Layout) -> Option<Layout> {
        self.map.insert(layout.name.clone(), layout)
    }

    pub fn with(mut self, layout: Layout) -> Self {
        self.insert(layout);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Layout> {
        self.map.get(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn resolve(&self, name: Option<Result<Arc<str>, Value>>) -> Option<&Layout> {
        self.get(&name?.ok()?)
    }
}

impl FromIterator<Layout> for Layouts {
    fn from_iter<T: IntoIterator<Item = Layout>>(iter: T) -> Self {
        let mut layouts = Layouts::new();
        iter.into_iter().for_each(|layout| { layouts.insert(layout); });
        layouts
    }
}

/// Renders a converted document and wraps it in its chain of layouts.
///
/// ```text
///   payload = { page: metadata } <- site context <- highlight delimiters
///   output  = render(body) [+ render(extended)]
///   layout  = layouts[metadata.layout]
///   while layout:
///       payload <- { content: output, page: layout.metadata }
///       output  = render(layout)           (on failure: keep output)
///       layout  = layouts[layout.metadata.layout], unless already used
/// ```
///
/// No failure aborts composition: a template that fails to render is logged
/// and the output it would have replaced is kept. A layout chain that loops
/// back on itself is cut at the first repeated layout.
#[derive(Debug, Clone, Copy)]
pub struct LayoutComposer<'a> {
    pub engine: &'a dyn Engine,
    pub layouts: &'a Layouts,
}

impl<'a> LayoutComposer<'a> {
    pub fn new(engine: &'a dyn Engine, layouts: &'a Layouts) -> Self {
        LayoutComposer { engine, layouts }
    }

    /// The payload content is rendered against: the document's metadata as
    /// `page`, the site context merged over it, and the active converter's
    /// highlight delimiters. `converter` is the one that matched the source
    /// extension, before conversion rewrote it.
    pub fn initial_payload(
        &self,
        document: &Document,
        converter: Option<&dyn Converter>,
        site: &Dict,
    ) -> Dict {
        let mut payload = dict! { "page" => document.metadata.clone() };
        deep_merge(&mut payload, site);

        payload.insert("highlight_prefix".into(), converter.map(|c| c.highlight_prefix()).into());
        payload.insert("highlight_suffix".into(), converter.map(|c| c.highlight_suffix()).into());
        payload
    }

    /// Renders `source` or logs the failure and returns `None`.
    fn render(&self, name: &str, source: &str, payload: &Dict) -> Option<String> {
        match self.engine.render(name, source, payload) {
            Ok(rendered) => Some(rendered),
            Err(e) => {
                log::error!("{} in {}", e.message(), name);
                log::debug!("{e}");
                None
            }
        }
    }

    /// Renders `document` and its layout chain into `document.output`.
    pub fn compose(&self, document: &mut Document, converter: Option<&dyn Converter>, site: &Dict) {
        let mut payload = self.initial_payload(document, converter, site);

        let content = self.render(&document.name, &document.body, &payload)
            .unwrap_or_else(|| document.body.clone());

        let extended = match &document.extended {
            Some(extended) if document.supports_extended() => {
                let rendered = self.render(&document.name, extended, &payload)
                    .unwrap_or_else(|| extended.clone());

                Some(rendered)
            }
            _ => None,
        };

        if document.supports_extended() {
            deep_merge(&mut payload, &dict! {
                "page" => dict! {
                    "content" => content.as_str(),
                    "extended" => extended.as_deref(),
                }
            });
        }

        document.body = content;
        document.output = match &extended {
            Some(extended) => format!("{}{}", document.body, extended),
            None => document.body.clone(),
        };

        if extended.is_some() {
            document.extended = extended;
        }

        let Some(mut layout) = self.layouts.resolve(document.metadata.get_key(LayoutName)) else {
            return;
        };

        let mut used = FxHashSet::default();
        used.insert(layout.name.clone());
        loop {
            log::debug!("applying layout {} to {}", layout.name, document.name);
            deep_merge(&mut payload, &dict! {
                "content" => document.output.as_str(),
                "page" => layout.metadata.clone(),
            });

            if let Some(output) = self.render(&layout.name, &layout.content, &payload) {
                document.output = output;
            }

            layout = match self.layouts.resolve(layout.metadata.get_key(LayoutName)) {
                Some(next) if used.contains(&next.name) => {
                    log::warn!("layout cycle in {}: {} leads back to {}",
                        document.name, layout.name, next.name);

                    break;
                }
                Some(next) => {
                    used.insert(next.name.clone());
                    next
                }
                None => break,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::templating::MiniJinjaEngine;
    use crate::value::Yaml;

    fn layout(name: &str, content: &str, parent: Option<&str>) -> Layout {
        let mut metadata = Dict::new();
        if let Some(parent) = parent {
            metadata.insert_key(LayoutName, parent);
        }

        Layout::new(name, content, metadata)
    }

    fn compose(document: &mut Document, layouts: &Layouts, site: &Dict) {
        let engine = MiniJinjaEngine::new();
        LayoutComposer::new(&engine, layouts).compose(document, None, site);
    }

    fn page(body: &str, layout: Option<&str>) -> Document {
        let mut doc = Document::new("page.html", body, ".html");
        if let Some(layout) = layout {
            doc.metadata.insert_key(LayoutName, layout);
        }

        doc
    }

    #[test]
    fn no_layout_is_rendered_content() {
        let mut doc = page("Hello {{ site.name }}", None);
        compose(&mut doc, &Layouts::new(), &dict! { "site" => dict! { "name" => "World" } });
        assert_eq!(doc.output, "Hello World");
    }

    #[test]
    fn missing_layout_ends_chain() {
        let mut doc = page("Hello", Some("nope"));
        compose(&mut doc, &Layouts::new(), &dict! {});
        assert_eq!(doc.output, "Hello");
    }

    #[test]
    fn chain_applies_innermost_first() {
        let layouts = Layouts::new()
            .with(layout("post", "<article>{{ content }}</article>", Some("default")))
            .with(layout("default", "<body>{{ content }}</body>", None));

        let mut doc = page("Hi", Some("post"));
        compose(&mut doc, &layouts, &dict! {});
        assert_eq!(doc.output, "<body><article>Hi</article></body>");
    }

    #[test]
    fn cycles_terminate_after_each_layout_once() {
        let layouts = Layouts::new()
            .with(layout("a", "A({{ content }})", Some("b")))
            .with(layout("b", "B({{ content }})", Some("a")));

        let mut doc = page("x", Some("a"));
        compose(&mut doc, &layouts, &dict! {});
        assert_eq!(doc.output, "B(A(x))");

        let mut doc = page("x", Some("b"));
        compose(&mut doc, &layouts, &dict! {});
        assert_eq!(doc.output, "A(B(x))");
    }

    #[test]
    fn self_referencing_layout_applies_once() {
        let layouts = Layouts::new().with(layout("loop", "L({{ content }})", Some("loop")));
        let mut doc = page("x", Some("loop"));
        compose(&mut doc, &layouts, &dict! {});
        assert_eq!(doc.output, "L(x)");
    }

    #[test]
    fn layout_metadata_is_merged_into_page() {
        let mut default_meta = dict! { "title" => "Default Title", "lang" => "en" };
        default_meta.insert_key(LayoutName, "root");

        let layouts = Layouts::new()
            .with(Layout::new("default", "[{{ page.title }}|{{ page.lang }}|{{ page.author }}]{{ content }}", default_meta))
            .with(Layout::new("root", "<{{ page.lang }}>{{ content }}", dict! { "lang" => "fr" }));

        let mut doc = page("body", Some("default"));
        doc.metadata.insert("author".into(), "ann".into());
        compose(&mut doc, &layouts, &dict! {});
        assert_eq!(doc.output, "<fr>[Default Title|en|ann]body");
    }

    #[test]
    fn broken_layout_keeps_output_and_continues() {
        let layouts = Layouts::new()
            .with(layout("broken", "{% if %}", Some("outer")))
            .with(layout("outer", "<{{ content }}>", None));

        let mut doc = page("x", Some("broken"));
        compose(&mut doc, &layouts, &dict! {});
        assert_eq!(doc.output, "<x>");
    }

    #[test]
    fn broken_content_keeps_body() {
        let layouts = Layouts::new().with(layout("outer", "<{{ content }}>", None));
        let mut doc = page("{{ unclosed", Some("outer"));
        compose(&mut doc, &layouts, &dict! {});
        assert_eq!(doc.output, "<{{ unclosed>");
    }

    #[test]
    fn extended_content_is_appended_and_exposed() {
        let layouts = Layouts::new()
            .with(layout("post", "{{ page.content }}|{{ page.extended }}|{{ content }}", None));

        let mut post = Document::post("p.html", "", ".html");
        post.body = "main {{ 1 + 1 }} ".into();
        post.extended = Some("more {{ 2 + 2 }}".into());
        post.metadata.insert_key(LayoutName, "post");

        compose(&mut post, &layouts, &dict! {});
        assert_eq!(post.output, "main 2 |more 4|main 2 more 4");
    }

    #[test]
    fn highlight_delimiters_come_from_converter() {
        #[derive(Debug)]
        struct Raw;

        impl Converter for Raw {
            fn matches(&self, ext: &str) -> bool { ext == ".raw" }
            fn output_ext(&self, _: &str) -> String { ".html".into() }
            fn convert(&self, content: &str) -> Result<String> { Ok(content.into()) }
            fn highlight_prefix(&self) -> &str { "<raw>" }
            fn highlight_suffix(&self) -> &str { "</raw>" }
        }

        let engine = MiniJinjaEngine::new();
        let layouts = Layouts::new();
        let composer = LayoutComposer::new(&engine, &layouts);

        let mut doc = Document::new("a.html", "", ".html");
        doc.body = "{{ highlight_prefix }}code{{ highlight_suffix }}".into();
        composer.compose(&mut doc, Some(&Raw), &dict! {});
        assert_eq!(doc.output, "<raw>code</raw>");

        let mut doc = Document::new("a.txt", "", ".txt");
        doc.body = "[{{ highlight_prefix }}]".into();
        composer.compose(&mut doc, None, &dict! {});
        assert_eq!(doc.output, "[]");
    }

    #[test]
    fn layouts_parse_front_matter() {
        let layout = Layout::parse("post", "---\nlayout: default\n---\n<p>{{ content }}</p>\n", &FrontMatter::new(Yaml));
        assert_eq!(layout.parent().as_deref(), Some("default"));
        assert_eq!(layout.content, "<p>{{ content }}</p>\n");

        let layout = Layout::parse("bare", "{{ content }}", &FrontMatter::new(Yaml));
        assert_eq!(layout.parent(), None);
        assert!(layout.metadata.is_empty());
    }
}
