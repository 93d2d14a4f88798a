//! JSON reporter for machine-readable output

use crate::ScoreResult;
use serde::Serialize;

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Report a single result: the `ScoreResult` verbatim
    pub fn report(&self, result: &ScoreResult) -> String {
        self.to_json(result).unwrap_or_else(|| "{}".to_string())
    }

    /// Report results for several answer files as an array of
    /// `{ "file": ..., "result": ... }`
    pub fn report_many(&self, results: &[(String, ScoreResult)]) -> String {
        let entries: Vec<FileEntry<'_>> = results
            .iter()
            .map(|(file, result)| FileEntry { file, result })
            .collect();
        self.to_json(&entries).unwrap_or_else(|| "[]".to_string())
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> Option<String> {
        if self.pretty {
            serde_json::to_string_pretty(value).ok()
        } else {
            serde_json::to_string(value).ok()
        }
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct FileEntry<'a> {
    file: &'a str,
    result: &'a ScoreResult,
}
