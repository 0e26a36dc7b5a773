//! Declarative export plugins.
//!
//! A template plugin lists its outputs in `plugin.toml`:
//!
//! ```toml
//! kind = "template"
//!
//! [[outputs]]
//! name = "{group}-{item}.ext"
//! template_file = "fixture.tmpl"
//!
//! [[outputs]]
//! name = "index.txt"
//! scope = "run"
//! template = "{count} records exported at {date}\n"
//! ```
//!
//! Record-scoped outputs are rendered once per record with `{group}`,
//! `{item}`, `{record}` (pretty JSON) and `{field.<path>}` available;
//! run-scoped outputs are rendered once with `{records}`. `{date}` and
//! `{count}` are available everywhere. `{{` and `}}` produce literal braces.

use std::fs;
use std::path::PathBuf;

use outdiff_types::{ExportOptions, OutputFile, Record};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ExportError, ExportResult};
use crate::plugin::{ExportPlugin, PendingExport};
use crate::registry::PluginSource;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Scope {
    #[default]
    Record,
    Run,
}

#[derive(Debug, Deserialize)]
struct OutputConfig {
    name: String,
    template: Option<String>,
    template_file: Option<PathBuf>,
    #[serde(default)]
    scope: Scope,
}

#[derive(Debug, Deserialize)]
struct TemplateConfig {
    #[serde(default)]
    outputs: Vec<OutputConfig>,
}

#[derive(Clone, Debug)]
struct OutputTemplate {
    name: String,
    body: String,
    scope: Scope,
}

/// An export plugin that renders text templates from its manifest.
#[derive(Clone, Debug)]
pub struct TemplatePlugin {
    key: String,
    outputs: Vec<OutputTemplate>,
}

impl TemplatePlugin {
    /// Build a template plugin from its manifest, reading any
    /// `template_file` relative to the plugin directory.
    pub fn load(source: &PluginSource) -> ExportResult<Self> {
        let config: TemplateConfig = source.config()?;
        if config.outputs.is_empty() {
            return Err(source.load_error("template plugin declares no [[outputs]]"));
        }

        let mut outputs = Vec::with_capacity(config.outputs.len());
        for output in config.outputs {
            let body = match (output.template, output.template_file) {
                (Some(inline), None) => inline,
                (None, Some(file)) => fs::read_to_string(source.dir.join(&file)).map_err(|e| {
                    source.load_error(format!("cannot read template {}: {e}", file.display()))
                })?,
                _ => {
                    return Err(source.load_error(format!(
                        "output {:?} needs exactly one of `template` or `template_file`",
                        output.name
                    )))
                }
            };
            outputs.push(OutputTemplate {
                name: output.name,
                body,
                scope: output.scope,
            });
        }

        Ok(Self {
            key: source.key.clone(),
            outputs,
        })
    }

    fn render_all(&self, records: &[Record], options: &ExportOptions) -> Result<Vec<OutputFile>, String> {
        let date = options.date.to_rfc3339();
        let count = records.len().to_string();
        let mut files = Vec::new();

        for output in &self.outputs {
            match output.scope {
                Scope::Record => {
                    for record in records {
                        let lookup = |name: &str| record_value(name, record, &date, &count);
                        files.push(OutputFile::new(
                            render(&output.name, lookup)?,
                            render(&output.body, lookup)?,
                        ));
                    }
                }
                Scope::Run => {
                    let lookup = |name: &str| run_value(name, records, &date, &count);
                    files.push(OutputFile::new(
                        render(&output.name, lookup)?,
                        render(&output.body, lookup)?,
                    ));
                }
            }
        }
        Ok(files)
    }
}

impl ExportPlugin for TemplatePlugin {
    fn key(&self) -> &str {
        &self.key
    }

    fn export(&self, records: &[Record], options: &ExportOptions) -> ExportResult<PendingExport> {
        let files = self
            .render_all(records, options)
            .map_err(|message| ExportError::Template {
                key: self.key.clone(),
                message,
            })?;
        Ok(PendingExport::Ready(files))
    }
}

fn record_value(name: &str, record: &Record, date: &str, count: &str) -> Option<String> {
    match name {
        "group" => Some(record.group.clone()),
        "item" => Some(record.item.clone()),
        "record" => serde_json::to_string_pretty(&record.data).ok(),
        "date" => Some(date.to_string()),
        "count" => Some(count.to_string()),
        _ => {
            let path = name.strip_prefix("field.")?;
            record.data.pointer(&field_pointer(path)).map(value_text)
        }
    }
}

/// JSON pointer for a dotted field path, with `~` and `/` escaped per segment.
fn field_pointer(path: &str) -> String {
    path.split('.')
        .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
        .collect()
}

fn run_value(name: &str, records: &[Record], date: &str, count: &str) -> Option<String> {
    match name {
        "records" => serde_json::to_string_pretty(records).ok(),
        "date" => Some(date.to_string()),
        "count" => Some(count.to_string()),
        _ => None,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Expand `{placeholder}`s in `template` using `lookup`.
fn render(template: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("{{") {
            out.push('{');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("}}") {
            out.push('}');
            rest = after;
        } else if tail.starts_with('}') {
            return Err("unmatched '}' in template".to_string());
        } else {
            let end = tail.find('}').ok_or("unclosed '{' in template")?;
            let name = tail[1..end].trim();
            let value = lookup(name).ok_or_else(|| format!("unknown placeholder '{{{name}}}'"))?;
            out.push_str(&value);
            rest = &tail[end + 1..];
        }
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{PluginRegistry, MANIFEST_FILE};
    use chrono::{TimeZone, Utc};
    use std::path::Path;

    fn options() -> ExportOptions {
        ExportOptions {
            base_dir: PathBuf::from("/repo"),
            date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    fn record(item: &str, data: Value) -> Record {
        Record {
            group: "acme".into(),
            item: item.into(),
            data,
        }
    }

    fn load(root: &Path, manifest: &str) -> ExportResult<Box<dyn ExportPlugin>> {
        let dir = root.join("plugins/tmpl");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), manifest).unwrap();
        PluginRegistry::with_builtin_kinds("plugins").load("tmpl", root)
    }

    fn export(plugin: &dyn ExportPlugin, records: &[Record]) -> ExportResult<Vec<OutputFile>> {
        plugin.export(records, &options())?.wait(plugin.key())
    }

    #[test]
    fn render_substitutes_and_escapes() {
        let out = render("{{{a}}} and {b}", |name| match name {
            "a" => Some("x".into()),
            "b" => Some("y".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(out, "{x} and y");
    }

    #[test]
    fn render_rejects_unknown_and_unbalanced() {
        assert!(render("{nope}", |_| None).unwrap_err().contains("'{nope}'"));
        assert!(render("open {", |_| None).is_err());
        assert!(render("close }", |_| None).is_err());
    }

    #[test]
    fn record_scope_emits_one_file_per_record() {
        let root = tempfile::tempdir().unwrap();
        let plugin = load(
            root.path(),
            "kind = \"template\"\n[[outputs]]\nname = \"{group}-{item}.ext\"\ntemplate = \"{field.name}\"\n",
        )
        .unwrap();

        let files = export(
            plugin.as_ref(),
            &[
                record("spot1", serde_json::json!({"name": "Spot 1"})),
                record("spot2", serde_json::json!({"name": "Spot 2"})),
            ],
        )
        .unwrap();

        assert_eq!(
            files,
            vec![
                OutputFile::new("acme-spot1.ext", "Spot 1"),
                OutputFile::new("acme-spot2.ext", "Spot 2"),
            ]
        );
    }

    #[test]
    fn run_scope_emits_a_single_file() {
        let root = tempfile::tempdir().unwrap();
        let plugin = load(
            root.path(),
            "kind = \"template\"\n[[outputs]]\nname = \"index.txt\"\nscope = \"run\"\ntemplate = \"{count} at {date}\"\n",
        )
        .unwrap();

        let files = export(
            plugin.as_ref(),
            &[record("a", Value::Null), record("b", Value::Null)],
        )
        .unwrap();
        assert_eq!(files, vec![OutputFile::new("index.txt", "2 at 2024-05-01T12:00:00+00:00")]);
    }

    #[test]
    fn nested_fields_and_numbers() {
        let r = record("spot1", serde_json::json!({"physical": {"weight": 4.5}, "modes": ["a", "b"]}));
        assert_eq!(record_value("field.physical.weight", &r, "", "1").unwrap(), "4.5");
        assert_eq!(record_value("field.modes.1", &r, "", "1").unwrap(), "b");
        assert!(record_value("field.missing", &r, "", "1").is_none());
    }

    #[test]
    fn field_keys_with_pointer_characters() {
        let r = record(
            "spot1",
            serde_json::json!({"a/b": "slash", "a": {"b": "nested"}, "x~y": "tilde", "~1": "literal"}),
        );
        assert_eq!(record_value("field.a/b", &r, "", "1").unwrap(), "slash");
        assert_eq!(record_value("field.a.b", &r, "", "1").unwrap(), "nested");
        assert_eq!(record_value("field.x~y", &r, "", "1").unwrap(), "tilde");
        assert_eq!(record_value("field.~1", &r, "", "1").unwrap(), "literal");
        assert_eq!(field_pointer("a/b.c~d"), "/a~1b/c~0d");
    }

    #[test]
    fn template_file_is_read_from_plugin_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("plugins/tmpl");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("body.tmpl"), "<{item}/>").unwrap();

        let plugin = load(
            root.path(),
            "kind = \"template\"\n[[outputs]]\nname = \"{item}.xml\"\ntemplate_file = \"body.tmpl\"\n",
        )
        .unwrap();
        let files = export(plugin.as_ref(), &[record("spot1", Value::Null)]).unwrap();
        assert_eq!(files, vec![OutputFile::new("spot1.xml", "<spot1/>")]);
    }

    #[test]
    fn unknown_placeholder_is_a_template_error() {
        let root = tempfile::tempdir().unwrap();
        let plugin = load(
            root.path(),
            "kind = \"template\"\n[[outputs]]\nname = \"x\"\ntemplate = \"{colour}\"\n",
        )
        .unwrap();
        let err = export(plugin.as_ref(), &[record("a", Value::Null)]).unwrap_err();
        assert!(matches!(err, ExportError::Template { .. }));
    }

    #[test]
    fn invalid_manifests_fail_to_load() {
        let root = tempfile::tempdir().unwrap();
        assert!(load(root.path(), "kind = \"template\"\n").err().unwrap().is_plugin_load());

        let both = "kind = \"template\"\n[[outputs]]\nname = \"x\"\ntemplate = \"a\"\ntemplate_file = \"b\"\n";
        assert!(load(root.path(), both).err().unwrap().is_plugin_load());

        let missing_file = "kind = \"template\"\n[[outputs]]\nname = \"x\"\ntemplate_file = \"nope.tmpl\"\n";
        assert!(load(root.path(), missing_file).err().unwrap().is_plugin_load());
    }
}
