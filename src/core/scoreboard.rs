use crate::domain::model::{GameKind, GameOutcome};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub timestamp: DateTime<Utc>,
    pub game: GameKind,
    pub score: u32,
    pub detail: String,
}

/// 以 CSV 附加寫入的成績紀錄
#[derive(Debug, Clone)]
pub struct ScoreLog {
    path: PathBuf,
}

impl ScoreLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, outcome: &GameOutcome) -> Result<ScoreRecord> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let write_header = file.metadata()?.len() == 0;

        let record = ScoreRecord {
            timestamp: Utc::now(),
            game: outcome.game,
            score: outcome.score,
            detail: outcome.detail.clone(),
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        writer.serialize(&record)?;
        writer.flush()?;

        tracing::debug!("📝 Score {} for {} appended to {:?}", record.score, record.game, self.path);
        Ok(record)
    }

    /// 檔案不存在時回傳空清單
    pub fn records(&self) -> Result<Vec<ScoreRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn best_score(&self, game: GameKind) -> Result<Option<u32>> {
        Ok(self
            .records()?
            .into_iter()
            .filter(|r| r.game == game)
            .map(|r| r.score)
            .max())
    }
}
