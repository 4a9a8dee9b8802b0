//! PlanStore - flat-file history of saved plans
//!
//! One pretty-printed JSON object per plan in a single directory. There is no
//! locking: two processes saving at the same instant may overwrite each
//! other's file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::PlanRecord;

/// Errors from the plan history directory
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error loading plan {filename}: {message}")]
    Malformed { filename: String, message: String },

    #[error("Plan not found: {0}")]
    NotFound(String),

    #[error("Invalid plan file name: {0}")]
    InvalidName(String),

    #[error("Failed to serialize plan: {0}")]
    Json(#[from] serde_json::Error),
}

impl HistoryError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// `YYYY-MM-DD HH:MM:SS` timestamps in plan files
mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::domain::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// A plan as stored on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPlan {
    /// File name within the plans directory
    #[serde(skip)]
    pub filename: String,
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub idea: String,
    pub plan_type: String,
    pub plan: String,
    pub iteration: u32,
}

impl SavedPlan {
    fn from_record(record: &PlanRecord) -> Self {
        Self {
            filename: String::new(),
            timestamp: record.created_at,
            idea: record.idea_description.clone(),
            plan_type: record.plan_type.clone(),
            plan: record.generated_text.clone(),
            iteration: record.iteration,
        }
    }

    pub fn timestamp_text(&self) -> String {
        self.timestamp.format(crate::domain::TIMESTAMP_FORMAT).to_string()
    }

    /// Default file name for a Markdown export of this plan
    ///
    /// `plan_<first 20 chars of the idea, alphanumerics and spaces only>_<date>.md`
    pub fn export_filename(&self) -> String {
        let snippet: String = self
            .idea
            .chars()
            .take(20)
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();
        let snippet = snippet.trim().replace(' ', "_");
        format!("plan_{}_{}.md", snippet, self.timestamp.format("%Y-%m-%d"))
    }

    /// One-line summary for listings
    pub fn summary(&self) -> String {
        let idea: String = self.idea.chars().take(50).collect();
        let ellipsis = if self.idea.chars().count() > 50 { "..." } else { "" };
        format!("{} - {}{}", self.timestamp_text(), idea, ellipsis)
    }
}

/// Result of scanning the plans directory
#[derive(Debug, Default)]
pub struct PlanListing {
    /// Readable plans, newest first
    pub plans: Vec<SavedPlan>,
    /// Files that could not be read or parsed
    pub errors: Vec<HistoryError>,
}

/// Plan history rooted at one directory
#[derive(Debug, Clone)]
pub struct PlanStore {
    dir: PathBuf,
}

impl PlanStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        debug!(dir = %dir.display(), "PlanStore::new: called");
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> Result<(), HistoryError> {
        fs::create_dir_all(&self.dir).map_err(|e| HistoryError::io(&self.dir, e))
    }

    /// Persist a plan record, returning the path written
    pub fn save(&self, record: &PlanRecord) -> Result<PathBuf, HistoryError> {
        debug!(iteration = record.iteration, "PlanStore::save: called");
        self.ensure_dir()?;

        let stem = format!(
            "plan_{}_{}",
            record.created_at.format("%Y%m%d_%H%M%S"),
            slugify(&record.idea_description)
        );
        let mut path = self.dir.join(format!("{}.json", stem));
        let mut suffix = 2;
        while path.exists() {
            path = self.dir.join(format!("{}_{}.json", stem, suffix));
            suffix += 1;
        }

        let json = serde_json::to_string_pretty(&SavedPlan::from_record(record))?;
        fs::write(&path, json).map_err(|e| HistoryError::io(&path, e))?;

        info!(path = %path.display(), "Plan saved");
        Ok(path)
    }

    /// All readable plans, newest first, plus the files that were skipped
    ///
    /// Creates the directory when it does not exist yet.
    pub fn list(&self) -> Result<PlanListing, HistoryError> {
        debug!(dir = %self.dir.display(), "PlanStore::list: called");
        self.ensure_dir()?;

        let entries = fs::read_dir(&self.dir).map_err(|e| HistoryError::io(&self.dir, e))?;
        let mut listing = PlanListing::default();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    listing.errors.push(HistoryError::io(&self.dir, e));
                    continue;
                }
            };
            let filename = entry.file_name().to_string_lossy().into_owned();
            if !filename.ends_with(".json") {
                continue;
            }

            match self.read_plan(&entry.path(), &filename) {
                Ok(plan) => listing.plans.push(plan),
                Err(e) => {
                    warn!(%filename, error = %e, "Skipping unreadable plan file");
                    listing.errors.push(e);
                }
            }
        }

        listing
            .plans
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.filename.cmp(&a.filename)));
        debug!(
            plans = listing.plans.len(),
            errors = listing.errors.len(),
            "PlanStore::list: done"
        );
        Ok(listing)
    }

    /// Load a single plan by file name
    pub fn load(&self, filename: &str) -> Result<SavedPlan, HistoryError> {
        debug!(%filename, "PlanStore::load: called");
        let path = self.resolve(filename)?;
        self.read_plan(&path, filename)
    }

    /// Remove a plan file
    pub fn delete(&self, filename: &str) -> Result<(), HistoryError> {
        debug!(%filename, "PlanStore::delete: called");
        let path = self.resolve(filename)?;
        fs::remove_file(&path).map_err(|e| HistoryError::io(&path, e))?;
        info!(%filename, "Plan deleted");
        Ok(())
    }

    /// Path of an existing plan file, rejecting anything outside the directory
    fn resolve(&self, filename: &str) -> Result<PathBuf, HistoryError> {
        if filename.is_empty() || filename.contains(['/', '\\']) || filename.starts_with('.') {
            return Err(HistoryError::InvalidName(filename.to_string()));
        }
        let path = self.dir.join(filename);
        if !path.is_file() {
            return Err(HistoryError::NotFound(filename.to_string()));
        }
        Ok(path)
    }

    fn read_plan(&self, path: &Path, filename: &str) -> Result<SavedPlan, HistoryError> {
        let content = fs::read_to_string(path).map_err(|e| HistoryError::io(path, e))?;
        let mut plan: SavedPlan = serde_json::from_str(&content).map_err(|e| HistoryError::Malformed {
            filename: filename.to_string(),
            message: e.to_string(),
        })?;
        plan.filename = filename.to_string();
        Ok(plan)
    }
}

/// Write plan text to a Markdown file
pub fn write_markdown(path: &Path, text: &str) -> Result<(), HistoryError> {
    debug!(path = %path.display(), "write_markdown: called");
    fs::write(path, text).map_err(|e| HistoryError::io(path, e))?;
    info!(path = %path.display(), "Plan exported");
    Ok(())
}

/// Convert a string to a filename-safe slug
fn slugify(s: &str) -> String {
    let slug: String = s
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(30)
        .collect();

    let slug = slug.trim_end_matches('-');
    if slug.is_empty() { "idea".to_string() } else { slug.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TIMESTAMP_FORMAT;
    use tempfile::TempDir;

    fn record(idea: &str, ts: &str) -> PlanRecord {
        let mut record = PlanRecord::new(idea, "App Development", "# Plan\n\n## Executive Summary", 2, vec![]);
        record.created_at = NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).unwrap();
        record
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Track water intake"), "track-water-intake");
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  multiple   spaces  "), "multiple-spaces");
        assert_eq!(slugify("!!!"), "idea");
        assert!(slugify(&"long idea ".repeat(10)).len() <= 30);
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let store = PlanStore::new(temp.path().join("plans"));

        let path = store.save(&record("Track water intake", "2025-03-04 05:06:07")).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "plan_20250304_050607_track-water-intake.json"
        );

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["timestamp"], "2025-03-04 05:06:07");
        assert_eq!(raw["idea"], "Track water intake");
        assert_eq!(raw["plan_type"], "App Development");
        assert_eq!(raw["iteration"], 2);

        let listing = store.list().unwrap();
        assert!(listing.errors.is_empty());
        assert_eq!(listing.plans.len(), 1);
        let plan = &listing.plans[0];
        assert_eq!(plan.idea, "Track water intake");
        assert_eq!(plan.plan_type, "App Development");
        assert_eq!(plan.plan, "# Plan\n\n## Executive Summary");
        assert_eq!(plan.iteration, 2);
        assert_eq!(plan.timestamp_text(), "2025-03-04 05:06:07");
    }

    #[test]
    fn test_save_same_second_does_not_overwrite() {
        let temp = TempDir::new().unwrap();
        let store = PlanStore::new(temp.path());

        let first = store.save(&record("Same idea", "2025-03-04 05:06:07")).unwrap();
        let second = store.save(&record("Same idea", "2025-03-04 05:06:07")).unwrap();

        assert_ne!(first, second);
        assert_eq!(store.list().unwrap().plans.len(), 2);
    }

    #[test]
    fn test_list_newest_first_and_skips_malformed() {
        let temp = TempDir::new().unwrap();
        let store = PlanStore::new(temp.path());

        store.save(&record("Older", "2024-01-01 09:00:00")).unwrap();
        store.save(&record("Newer", "2025-06-01 09:00:00")).unwrap();
        fs::write(temp.path().join("broken.json"), "{ not json").unwrap();
        fs::write(temp.path().join("notes.txt"), "ignored").unwrap();

        let listing = store.list().unwrap();
        let ideas: Vec<&str> = listing.plans.iter().map(|p| p.idea.as_str()).collect();
        assert_eq!(ideas, vec!["Newer", "Older"]);
        assert_eq!(listing.errors.len(), 1);
        assert!(listing.errors[0].to_string().contains("broken.json"));
    }

    #[test]
    fn test_list_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("plans");
        let store = PlanStore::new(&dir);

        let listing = store.list().unwrap();
        assert!(listing.plans.is_empty());
        assert!(dir.is_dir());
    }

    #[test]
    fn test_load_and_delete() {
        let temp = TempDir::new().unwrap();
        let store = PlanStore::new(temp.path());
        let path = store.save(&record("Track water intake", "2025-03-04 05:06:07")).unwrap();
        let filename = path.file_name().unwrap().to_string_lossy().into_owned();

        let plan = store.load(&filename).unwrap();
        assert_eq!(plan.filename, filename);

        store.delete(&filename).unwrap();
        assert!(!path.exists());
        assert!(matches!(store.delete(&filename), Err(HistoryError::NotFound(_))));
    }

    #[test]
    fn test_rejects_paths_outside_directory() {
        let temp = TempDir::new().unwrap();
        let store = PlanStore::new(temp.path());

        assert!(matches!(store.load("../secret.json"), Err(HistoryError::InvalidName(_))));
        assert!(matches!(store.delete("a/b.json"), Err(HistoryError::InvalidName(_))));
        assert!(matches!(store.delete(""), Err(HistoryError::InvalidName(_))));
    }

    #[test]
    fn test_export_filename() {
        let plan = SavedPlan {
            filename: String::new(),
            timestamp: NaiveDateTime::parse_from_str("2025-03-04 05:06:07", TIMESTAMP_FORMAT).unwrap(),
            idea: "Track water intake, daily!".to_string(),
            plan_type: "App Development".to_string(),
            plan: String::new(),
            iteration: 1,
        };
        assert_eq!(plan.export_filename(), "plan_Track_water_intake_2025-03-04.md");
    }

    #[test]
    fn test_write_markdown() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("plan.md");
        write_markdown(&path, "# Plan").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Plan");
    }
}
