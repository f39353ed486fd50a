/// Session journal
///
/// Every navigation step, fit attempt and export is recorded with its
/// timestamp and sequence number, so a reviewer can see how each row of the
/// output table came about. The journal can be exported as human-readable
/// text or JSON.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// A single journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Sequential entry number (1-based)
    pub sequence: usize,
    pub timestamp: DateTime<Local>,
    /// Short operation name ("Fit", "Navigate", ...)
    pub operation: String,
    pub description: String,
}

impl JournalEntry {
    pub fn to_text(&self) -> String {
        format!(
            "[{:03}] {} | {} | {}",
            self.sequence,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.operation,
            self.description,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionJournal {
    pub session_id: String,
    pub session_start: DateTime<Local>,
    pub source_file: String,
    pub software_version: String,
    pub entries: Vec<JournalEntry>,
}

impl SessionJournal {
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            session_start: Local::now(),
            source_file: String::new(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            entries: Vec::new(),
        }
    }

    pub fn set_source(&mut self, source: &str) {
        self.source_file = source.to_string();
    }

    /// Append an entry and echo it to the log
    pub fn add_entry(&mut self, operation: &str, description: &str) {
        let seq = self.entries.len() + 1;
        self.entries.push(JournalEntry {
            sequence: seq,
            timestamp: Local::now(),
            operation: operation.to_string(),
            description: description.to_string(),
        });
        log::info!("[JOURNAL {:03}] {}: {}", seq, operation, description);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&JournalEntry> {
        self.entries.last()
    }

    /// Export as human-readable text
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("═══════════════════════════════════════════════════════════════\n");
        out.push_str("  Spectral Peak Fitting Session\n");
        out.push_str("═══════════════════════════════════════════════════════════════\n");
        out.push_str(&format!("  Session ID:  {}\n", self.session_id));
        out.push_str(&format!(
            "  Started:     {}\n",
            self.session_start.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("  Source:      {}\n", self.source_file));
        out.push_str(&format!("  Software:    spectral-peak-fitter v{}\n", self.software_version));
        out.push_str(&format!("  Entries:     {}\n", self.entries.len()));
        out.push_str("───────────────────────────────────────────────────────────────\n\n");

        for entry in &self.entries {
            out.push_str(&entry.to_text());
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("JSON error: {}", e))
    }

    pub fn save_text(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_text())
    }

    pub fn save_json(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_json())
    }

    /// JSON for a `.json` path, text otherwise
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            self.save_json(path)
        } else {
            self.save_text(path)
        }
    }
}

impl Default for SessionJournal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_are_numbered_in_order() {
        let mut journal = SessionJournal::new();
        assert!(journal.is_empty());

        journal.add_entry("Navigate", "peak 1 of 3 (pixel 120)");
        journal.add_entry("Fit", "peak 1 over [110, 130)");
        assert_eq!(journal.len(), 2);
        assert_eq!(journal.entries[0].sequence, 1);
        assert_eq!(journal.entries[1].sequence, 2);
        assert_eq!(journal.last().map(|e| e.operation.as_str()), Some("Fit"));
    }

    #[test]
    fn test_text_export() {
        let mut journal = SessionJournal::new();
        journal.set_source("hg_lamp.txt");
        journal.add_entry("Export", "2 rows to fitted.txt");
        let text = journal.to_text();
        assert!(text.contains("Source:      hg_lamp.txt"));
        assert!(text.contains("| Export | 2 rows to fitted.txt"));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut journal = SessionJournal::new();
        journal.add_entry("Fit failed", "peak 2: no convergence");
        let parsed: SessionJournal = serde_json::from_str(&journal.to_json()).unwrap();
        assert_eq!(parsed.session_id, journal.session_id);
        assert_eq!(parsed.entries.len(), 1);
    }

    #[test]
    fn test_save_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut journal = SessionJournal::new();
        journal.add_entry("Load", "spectrum.txt");

        let json_path = dir.path().join("journal.JSON");
        journal.save(&json_path).unwrap();
        let json = std::fs::read_to_string(&json_path).unwrap();
        assert!(json.trim_start().starts_with('{'));

        let text_path = dir.path().join("journal.log");
        journal.save(&text_path).unwrap();
        let text = std::fs::read_to_string(&text_path).unwrap();
        assert!(text.contains("Spectral Peak Fitting Session"));
    }
}
