//! Out-of-process export plugins.
//!
//! A command plugin is any executable that reads the export request as JSON
//! on stdin and prints the produced files as a JSON array on stdout:
//!
//! ```text
//! stdin:  {"records": [{"group": "acme", "item": "spot1", "data": {...}}],
//!          "options": {"baseDir": "/repo", "date": "2024-05-01T12:00:00Z"}}
//! stdout: [{"name": "acme-spot1.ext", "content": "..."}]
//! ```
//!
//! The process runs with the plugin directory as its working directory, so
//! a historical plugin only ever sees its own snapshot.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use outdiff_types::{ExportOptions, OutputFile, Record};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ExportError, ExportResult};
use crate::plugin::{ExportPlugin, PendingExport};
use crate::registry::PluginSource;

#[derive(Debug, Deserialize)]
struct CommandConfig {
    command: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct CommandInput<'a> {
    records: &'a [Record],
    options: &'a ExportOptions,
}

/// An export plugin implemented by an external program.
#[derive(Clone, Debug)]
pub struct CommandPlugin {
    key: String,
    dir: PathBuf,
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl CommandPlugin {
    /// Build a command plugin from its manifest.
    ///
    /// A program given with a path separator is resolved against the plugin
    /// directory and must exist; a bare name is looked up on `PATH` at
    /// invocation time.
    pub fn load(source: &PluginSource) -> ExportResult<Self> {
        let config: CommandConfig = source.config()?;
        let (program, args) = config
            .command
            .split_first()
            .ok_or_else(|| source.load_error("`command` must not be empty"))?;

        let program = if program.contains(['/', '\\']) {
            let resolved = source.dir.join(program);
            if !resolved.is_file() {
                return Err(source.load_error(format!("entry point {program:?} not found")));
            }
            resolved
        } else {
            PathBuf::from(program)
        };

        Ok(Self {
            key: source.key.clone(),
            dir: source.dir.clone(),
            program,
            args: args.to_vec(),
            env: config.env,
        })
    }
}

impl ExportPlugin for CommandPlugin {
    fn key(&self) -> &str {
        &self.key
    }

    fn export(&self, records: &[Record], options: &ExportOptions) -> ExportResult<PendingExport> {
        let payload = serde_json::to_vec(&CommandInput { records, options })
            .map_err(|e| ExportError::invocation(&self.key, format!("cannot encode request: {e}")))?;

        debug!(key = %self.key, program = %self.program.display(), "spawning export process");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .envs(&self.env)
            .env("OUTDIFF_PLUGIN_KEY", &self.key)
            .env("OUTDIFF_BASE_DIR", &options.base_dir)
            .current_dir(&self.dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ExportError::invocation(
                    &self.key,
                    format!("cannot start {}: {e}", self.program.display()),
                )
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExportError::invocation(&self.key, "stdin not captured"))?;
        let key = self.key.clone();

        let handle = thread::spawn(move || {
            // Writing stdin inline can deadlock against a full stdout pipe.
            let feeder = thread::spawn(move || stdin.write_all(&payload));

            let output = child
                .wait_with_output()
                .map_err(|e| ExportError::invocation(&key, e.to_string()))?;

            match feeder.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => {
                    return Err(ExportError::invocation(&key, format!("cannot write request: {e}")))
                }
                Err(_) => return Err(ExportError::invocation(&key, "stdin writer panicked")),
            }

            if !output.status.success() {
                return Err(ExportError::Process {
                    key,
                    status: output.status.to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                });
            }

            serde_json::from_slice::<Vec<OutputFile>>(&output.stdout).map_err(|e| {
                ExportError::MalformedOutput {
                    key,
                    message: e.to_string(),
                }
            })
        });

        Ok(PendingExport::Deferred(handle))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::registry::{PluginRegistry, MANIFEST_FILE};
    use chrono::{TimeZone, Utc};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn options(base: &Path) -> ExportOptions {
        ExportOptions {
            base_dir: base.to_path_buf(),
            date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    fn record() -> Record {
        Record {
            group: "acme".into(),
            item: "spot1".into(),
            data: serde_json::json!({"name": "Spot 1"}),
        }
    }

    fn install(root: &Path, key: &str, manifest: &str, script: &str) {
        let dir = root.join("plugins").join(key);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), manifest).unwrap();
        let path = dir.join("export.sh");
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn load(root: &Path, key: &str) -> Box<dyn ExportPlugin> {
        PluginRegistry::with_builtin_kinds("plugins")
            .load(key, root)
            .map_err(|e| e.to_string())
            .unwrap()
    }

    #[test]
    fn process_output_is_decoded() {
        let root = tempfile::tempdir().unwrap();
        install(
            root.path(),
            "echo",
            "kind = \"command\"\ncommand = [\"./export.sh\"]\n",
            "#!/bin/sh\ncat > /dev/null\necho '[{\"name\": \"acme-spot1.ext\", \"content\": \"A\"}]'\n",
        );

        let plugin = load(root.path(), "echo");
        let files = plugin
            .export(&[record()], &options(root.path()))
            .unwrap()
            .wait("echo")
            .unwrap();
        assert_eq!(files, vec![OutputFile::new("acme-spot1.ext", "A")]);
    }

    #[test]
    fn request_is_written_to_stdin() {
        let root = tempfile::tempdir().unwrap();
        install(
            root.path(),
            "mirror",
            "kind = \"command\"\ncommand = [\"./export.sh\"]\n",
            "#!/bin/sh\nbody=$(cat)\ncase \"$body\" in *'\"item\":\"spot1\"'*'\"baseDir\"'*) echo '[{\"name\": \"ok\", \"content\": \"\"}]' ;; *) echo '[]' ;; esac\n",
        );

        let plugin = load(root.path(), "mirror");
        let files = plugin
            .export(&[record()], &options(root.path()))
            .unwrap()
            .wait("mirror")
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "ok");
    }

    #[test]
    fn non_zero_exit_carries_stderr() {
        let root = tempfile::tempdir().unwrap();
        install(
            root.path(),
            "fails",
            "kind = \"command\"\ncommand = [\"./export.sh\"]\n",
            "#!/bin/sh\necho 'fixture is unsupported' >&2\nexit 3\n",
        );

        let err = load(root.path(), "fails")
            .export(&[record()], &options(root.path()))
            .unwrap()
            .wait("fails")
            .unwrap_err();
        match err {
            ExportError::Process { key, stderr, .. } => {
                assert_eq!(key, "fails");
                assert_eq!(stderr, "fixture is unsupported");
            }
            other => panic!("expected Process, got {other:?}"),
        }
    }

    #[test]
    fn garbage_stdout_is_malformed_output() {
        let root = tempfile::tempdir().unwrap();
        install(
            root.path(),
            "noisy",
            "kind = \"command\"\ncommand = [\"./export.sh\"]\n",
            "#!/bin/sh\necho 'hello'\n",
        );

        let err = load(root.path(), "noisy")
            .export(&[record()], &options(root.path()))
            .unwrap()
            .wait("noisy")
            .unwrap_err();
        assert!(matches!(err, ExportError::MalformedOutput { .. }));
    }

    #[test]
    fn missing_entry_point_fails_to_load() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("plugins/gone");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(MANIFEST_FILE),
            "kind = \"command\"\ncommand = [\"./missing.sh\"]\n",
        )
        .unwrap();

        let err = PluginRegistry::with_builtin_kinds("plugins")
            .load("gone", root.path())
            .err()
            .unwrap();
        assert!(err.is_plugin_load());
    }

    #[test]
    fn empty_command_fails_to_load() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("plugins/empty");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), "kind = \"command\"\ncommand = []\n").unwrap();

        let err = PluginRegistry::with_builtin_kinds("plugins")
            .load("empty", root.path())
            .err()
            .unwrap();
        assert!(err.is_plugin_load());
    }
}
