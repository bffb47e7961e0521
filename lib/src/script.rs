use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Chainable, Result};
use crate::value::{Dict, Value};

/// An external command whose standard output is exposed to templates under
/// `name`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Script {
    pub name: String,
    pub command: String,
}

impl Script {
    pub fn new<N: Into<String>, C: Into<String>>(name: N, command: C) -> Self {
        Script { name: name.into(), command: command.into() }
    }
}

/// Runs scripts one after another, each with the content base directory
/// appended as its last argument.
///
/// Runs are synchronous and unbounded: a script that never exits blocks the
/// caller forever.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    base: PathBuf,
    script_dir: Option<PathBuf>,
}

impl ScriptRunner {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        ScriptRunner { base: base.into(), script_dir: None }
    }

    /// Resolves relative script programs against `dir` instead of `PATH`.
    pub fn script_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.script_dir = Some(dir.into());
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn command(&self, script: &Script) -> Result<Command> {
        let mut words = script.command.split_whitespace();
        let Some(program) = words.next() else {
            return err!("script has an empty command", "script" => &script.name);
        };

        let program = match &self.script_dir {
            Some(dir) if Path::new(program).is_relative() => dir.join(program),
            _ => PathBuf::from(program),
        };

        let mut command = Command::new(program);
        command.args(words)
            .arg(&self.base)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        Ok(command)
    }

    /// Runs `script` to completion and returns everything it wrote to
    /// standard output.
    pub fn run(&self, script: &Script) -> Result<String> {
        let output = self.command(script)?
            .output()
            .chain_with(|| error! {
                "failed to run script",
                "script" => &script.name,
                "command" => &script.command,
            })?;

        if !output.status.success() {
            log::warn!("script {} exited with {}", script.name, output.status);
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Runs every script in order and maps each script's name to its output.
    /// A script that can't be run is logged and maps to an empty string.
    pub fn run_all(&self, scripts: &[Script]) -> Dict {
        scripts.iter()
            .map(|script| {
                let output = self.run(script).unwrap_or_else(|e| {
                    log::warn!("{}", e.message());
                    log::debug!("{e}");
                    String::new()
                });

                (Arc::from(script.name.as_str()), Value::from(output))
            })
            .collect()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::dict;

    #[test]
    fn captures_stdout_by_name() {
        let runner = ScriptRunner::new("/content");
        let outputs = runner.run_all(&[
            Script::new("echo", "echo hello"),
            Script::new("silent", "true"),
        ]);

        assert_eq!(outputs, dict! {
            "echo" => "hello /content\n",
            "silent" => "",
        });
    }

    #[test]
    fn failed_spawn_is_empty_output() {
        let runner = ScriptRunner::new("/content");
        let outputs = runner.run_all(&[
            Script::new("missing", "/definitely/not/a/program"),
            Script::new("empty", "   "),
        ]);

        assert_eq!(outputs, dict! { "missing" => "", "empty" => "" });
        assert!(runner.run(&Script::new("missing", "/definitely/not/a/program")).is_err());
    }

    #[test]
    fn scripts_resolve_against_script_dir() {
        let runner = ScriptRunner::new("/site").script_dir("/site/_scripts");

        let command = runner.command(&Script::new("stats", "stats.sh --all")).unwrap();
        assert_eq!(command.get_program(), "/site/_scripts/stats.sh");
        assert_eq!(command.get_args().collect::<Vec<_>>(), ["--all", "/site"]);

        let command = runner.command(&Script::new("abs", "/bin/echo")).unwrap();
        assert_eq!(command.get_program(), "/bin/echo");
        assert_eq!(command.get_args().collect::<Vec<_>>(), ["/site"]);
    }
}
