use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::dict;
use crate::convert::MarkdownSettings;
use crate::error::{Chainable, Result};
use crate::script::{Script, ScriptRunner};
use crate::value::{Dict, Format, Toml, Value};

pub const SCRIPTS_DIR: &str = "_scripts";

/// Site configuration, usually read from a TOML file.
///
/// Top-level keys that aren't recognized settings are kept in `globals` and
/// exposed to templates alongside the `[site]` table.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// The content base directory, passed to every script.
    #[serde(default)]
    pub base: Option<PathBuf>,
    /// Where scripts live, relative to `base`. Defaults to `_scripts`.
    #[serde(default)]
    pub scripts_dir: Option<PathBuf>,
    /// Metadata every post starts from before its own front matter applies.
    #[serde(default)]
    pub post_defaults: Dict,
    #[serde(default)]
    pub markdown: MarkdownSettings,
    #[serde(default)]
    pub scripts: Vec<Script>,
    #[serde(default)]
    pub site: Dict,
    #[serde(flatten)]
    pub globals: FxHashMap<String, Value>,
}

impl Config {
    pub fn from_toml(string: &str) -> Result<Self> {
        Ok(Toml::from_str(string)?)
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let string = std::fs::read_to_string(path).chain_with(|| error! {
            "failed to read configuration file",
            "path" => path.display(),
        })?;

        Config::from_toml(&string).chain_with(|| error! {
            "invalid configuration file",
            "path" => path.display(),
        })
    }

    pub fn base(&self) -> &Path {
        self.base.as_deref().unwrap_or(Path::new("."))
    }

    pub fn scripts_dir(&self) -> PathBuf {
        let dir = self.scripts_dir.as_deref().unwrap_or(Path::new(SCRIPTS_DIR));
        self.base().join(dir)
    }

    pub fn script_runner(&self) -> ScriptRunner {
        ScriptRunner::new(self.base()).script_dir(self.scripts_dir())
    }

    /// The site-wide template context: `{ site: { ... } }`, where the inner
    /// table holds unrecognized top-level keys overlaid by the `[site]` table.
    pub fn site_payload(&self) -> Dict {
        let mut site: Dict = self.globals.iter()
            .map(|(k, v)| (k.as_str().into(), v.clone()))
            .collect();

        site.extend(self.site.iter().map(|(k, v)| (k.clone(), v.clone())));
        dict! { "site" => site }
    }
}
