use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::schedule::{AnalysisEntry, DaySchedule};

/// Saved extraction results, one JSON object per line in `history.data`.
#[derive(Debug)]
pub struct HistoryStore {
    pub data_dir: PathBuf,
    pub history_path: PathBuf,
}

impl HistoryStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let history_path = data_dir.join("history.data");
        if !history_path.exists() {
            fs::write(&history_path, "")
                .with_context(|| format!("failed to create {}", history_path.display()))?;
        }

        info!(
            data_dir = %data_dir.display(),
            history = %history_path.display(),
            "opened history store"
        );

        Ok(Self {
            data_dir,
            history_path,
        })
    }

    /// All entries, newest first.
    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> anyhow::Result<Vec<AnalysisEntry>> {
        let mut entries = load_jsonl(&self.history_path).context("failed to load history.data")?;
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(entries)
    }

    #[tracing::instrument(skip(self))]
    pub fn get(&self, id: i64) -> anyhow::Result<Option<AnalysisEntry>> {
        Ok(self.load()?.into_iter().find(|entry| entry.id == id))
    }

    /// Appends `entry`, bumping its id past any existing one it collides
    /// with. Returns the stored entry.
    #[tracing::instrument(skip(self, entry), fields(id = entry.id))]
    pub fn add(&self, mut entry: AnalysisEntry) -> anyhow::Result<AnalysisEntry> {
        let mut entries = self.load()?;
        if entries.iter().any(|existing| existing.id == entry.id) {
            let bumped = entries.iter().map(|e| e.id).max().unwrap_or(entry.id) + 1;
            warn!(requested = entry.id, assigned = bumped, "history id collision");
            entry.id = bumped;
        }

        entries.push(entry.clone());
        self.save(&entries)?;
        info!(id = entry.id, days = entry.schedule.len(), "added history entry");
        Ok(entry)
    }

    #[tracing::instrument(skip(self))]
    pub fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let entries = self.load()?;
        let before = entries.len();
        let kept: Vec<AnalysisEntry> = entries.into_iter().filter(|entry| entry.id != id).collect();
        if kept.len() == before {
            debug!(id, "no history entry to delete");
            return Ok(false);
        }

        self.save(&kept)?;
        info!(id, "deleted history entry");
        Ok(true)
    }

    /// Replaces the day with the same date in entry `id`, or inserts it in
    /// date order.
    #[tracing::instrument(skip(self, day), fields(date = %day.date))]
    pub fn update_day(&self, id: i64, day: DaySchedule) -> anyhow::Result<AnalysisEntry> {
        let mut entries = self.load()?;
        let entry = entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| anyhow!("history entry not found: {id}"))?;

        match entry.schedule.iter_mut().find(|existing| existing.date == day.date) {
            Some(existing) => *existing = day,
            None => {
                entry.schedule.push(day);
                entry.schedule.sort_by_key(|d| d.date);
            }
        }

        let updated = entry.clone();
        self.save(&entries)?;
        Ok(updated)
    }

    fn save(&self, entries: &[AnalysisEntry]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.history_path, entries).context("failed to save history.data")
    }
}

#[tracing::instrument(skip(path))]
fn load_jsonl(path: &Path) -> anyhow::Result<Vec<AnalysisEntry>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let entry: AnalysisEntry = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(entry);
    }

    debug!(count = out.len(), "loaded history entries");
    Ok(out)
}

#[tracing::instrument(skip(path, entries))]
fn save_jsonl_atomic(path: &Path, entries: &[AnalysisEntry]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = entries.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for entry in entries {
        let serialized = serde_json::to_string(entry)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
