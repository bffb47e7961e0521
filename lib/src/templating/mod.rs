pub mod minijinja;

use std::fmt::Debug;

use crate::error::Result;
use crate::value::Dict;

pub use self::minijinja::MiniJinjaEngine;

/// Renders template source against a payload.
///
/// A failed render produces no output at all: callers decide whether to keep
/// what they had and move on.
pub trait Engine: Send + Sync + Debug {
    /// Renders `source` against `payload`. `name` identifies the template in
    /// error messages.
    fn render(&self, name: &str, source: &str, payload: &Dict) -> Result<String>;
}
