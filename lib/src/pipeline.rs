use std::sync::Arc;

use rayon::prelude::*;

use crate::dict;
use crate::config::Config;
use crate::convert::{transform, Converters, MarkdownConverter};
use crate::document::Document;
use crate::frontmatter::FrontMatter;
use crate::layout::{LayoutComposer, Layouts};
use crate::script::{Script, ScriptRunner};
use crate::templating::{Engine, MiniJinjaEngine};
use crate::value::{deep_merge, Dict, Yaml};

/// Everything needed to turn raw documents into final output: read front
/// matter, convert, then compose through layouts.
///
/// A pipeline is immutable once built and may be shared across threads; each
/// document is processed independently.
#[derive(Debug, Clone)]
pub struct Pipeline {
    front_matter: FrontMatter<Yaml>,
    converters: Converters,
    engine: Arc<dyn Engine>,
    layouts: Layouts,
    site: Dict,
    post_defaults: Dict,
}

impl Pipeline {
    pub fn new<E: Engine + 'static>(engine: E, converters: Converters, layouts: Layouts) -> Self {
        Pipeline {
            front_matter: FrontMatter::new(Yaml),
            converters,
            engine: Arc::new(engine),
            layouts,
            site: Dict::new(),
            post_defaults: Dict::new(),
        }
    }

    /// A pipeline with a markdown converter and the minijinja engine, set up
    /// from `config`. Scripts are not run; see [`Pipeline::run_scripts()`].
    pub fn from_config(config: &Config, layouts: Layouts) -> Self {
        let converters = Converters::new()
            .with(MarkdownConverter::new(config.markdown.clone()));

        Pipeline::new(MiniJinjaEngine::new(), converters, layouts)
            .with_site(config.site_payload())
            .with_post_defaults(config.post_defaults.clone())
    }

    /// Merges `site` into the context every document is rendered against.
    pub fn with_site(mut self, site: Dict) -> Self {
        deep_merge(&mut self.site, &site);
        self
    }

    /// Metadata that documents created with [`Document::post()`] start from.
    pub fn with_post_defaults(mut self, defaults: Dict) -> Self {
        self.post_defaults = defaults;
        self
    }

    /// Runs `scripts` now and exposes their outputs to templates as
    /// `scripts.<name>`.
    pub fn run_scripts(self, runner: &ScriptRunner, scripts: &[Script]) -> Self {
        let outputs = runner.run_all(scripts);
        self.with_site(dict! { "scripts" => outputs })
    }

    pub fn converters(&self) -> &Converters {
        &self.converters
    }

    pub fn layouts(&self) -> &Layouts {
        &self.layouts
    }

    pub fn site(&self) -> &Dict {
        &self.site
    }

    pub fn composer(&self) -> LayoutComposer<'_> {
        LayoutComposer::new(&*self.engine, &self.layouts)
    }

    /// Reads, converts, and composes `document`, leaving the result in
    /// `document.output`. Failures along the way are logged, never returned.
    pub fn render(&self, document: &mut Document) {
        let defaults = document.supports_extended().then_some(&self.post_defaults);
        document.read(&self.front_matter, defaults);

        let converter = self.converters.find(&document.ext);
        if let Err(e) = transform(document, &self.converters) {
            log::error!("{} in {}", e.message(), document.name);
            log::debug!("{e}");
        }

        self.composer().compose(document, converter, &self.site);
    }

    /// Renders every document in parallel.
    pub fn render_all(&self, documents: &mut [Document]) {
        documents.par_iter_mut().for_each(|document| self.render(document));
    }
}
