//! Data-file discovery, parsing, and adapter invocation.
//!
//! Each adapter owns the data files whose name starts with the adapter's
//! name. Files must contain a top-level sequence of mappings; anything else
//! is a load error for that file and processing continues with the rest.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::adapter::SourceAdapter;
use crate::record::{Provenance, Record};
use crate::report::RunReport;

/// Recognized structured-data file extensions.
const DATA_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{file}: parse error: {message}")]
    Parse { file: String, message: String },
    #[error("{file}: data file is not a list of mappings")]
    WrongShape { file: String },
}

/// Run every adapter over its data files and collect the tagged records.
///
/// Adapter order, then lexicographic file order, determines record order —
/// which matters downstream because merging is last-write-wins.
pub fn load_records(
    data_dir: &Path,
    adapters: &[Box<dyn SourceAdapter>],
    report: &mut RunReport,
) -> Vec<Record> {
    let mut records = Vec::new();

    for adapter in adapters {
        info!(adapter = adapter.name(), "running adapter");

        let files = match discover_files(data_dir, adapter.name()) {
            Ok(files) => files,
            Err(err) => {
                error!(adapter = adapter.name(), error = %err, "could not list data files");
                report.error(format!(
                    "could not list data files for {}: {err}",
                    adapter.name()
                ));
                continue;
            }
        };
        info!(
            adapter = adapter.name(),
            count = files.len(),
            "found data file(s)"
        );

        for file in files {
            load_file(&file, adapter.as_ref(), &mut records, report);
        }
    }

    records
}

/// Data files owned by an adapter: `{name}*.{yaml|yml|json}` in the data
/// directory, in lexicographic name order. A missing data directory yields
/// no files.
pub fn discover_files(data_dir: &Path, adapter_name: &str) -> std::io::Result<Vec<PathBuf>> {
    if !data_dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(data_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if name.starts_with(adapter_name) && DATA_EXTENSIONS.contains(&ext) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn load_file(
    path: &Path,
    adapter: &dyn SourceAdapter,
    records: &mut Vec<Record>,
    report: &mut RunReport,
) {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    info!(file = %file_name, "processing data file");

    let entries = match read_entries(path, &file_name) {
        Ok(entries) => entries,
        Err(err) => {
            error!(file = %file_name, error = %err, "skipping data file");
            report.error(err.to_string());
            return;
        }
    };

    for (index, entry) in entries.iter().enumerate() {
        debug!(entry = index + 1, total = entries.len(), "processing entry");

        let sources = match adapter.expand(entry) {
            Ok(sources) => sources,
            Err(err) => {
                error!(
                    adapter = adapter.name(),
                    file = %file_name,
                    entry = index + 1,
                    error = %err,
                    "adapter failed, skipping entry"
                );
                report.error(format!(
                    "{} adapter failed on entry {} of {file_name}: {err}",
                    adapter.name(),
                    index + 1
                ));
                continue;
            }
        };

        debug!(count = sources.len(), "source(s) expanded");
        for source in sources {
            records.push(Record {
                source,
                provenance: Provenance {
                    origin: adapter.origin(),
                    file: file_name.clone(),
                },
            });
        }
    }
}

/// Parse a data file and require a top-level sequence of mappings.
fn read_entries(path: &Path, file_name: &str) -> Result<Vec<Map<String, Value>>, LoadError> {
    let text = fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let parsed: Value = if is_json {
        serde_json::from_str(&text).map_err(|e| LoadError::Parse {
            file: file_name.to_string(),
            message: e.to_string(),
        })?
    } else {
        serde_yaml::from_str(&text).map_err(|e| LoadError::Parse {
            file: file_name.to_string(),
            message: e.to_string(),
        })?
    };

    let Value::Array(items) = parsed else {
        return Err(LoadError::WrongShape {
            file: file_name.to_string(),
        });
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map),
            _ => Err(LoadError::WrongShape {
                file: file_name.to_string(),
            }),
        })
        .collect()
}
