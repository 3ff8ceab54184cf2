use std::{
    fmt,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::{GaitError, Result},
    record::TugAnalysisRecord,
    types::SubtaskDurations,
};

const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "mkv", "webm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssessmentId(Uuid);

impl AssessmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AssessmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AssessmentId {
    type Err = GaitError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| GaitError::InvalidAssessmentId { id: s.to_string() })
    }
}

/// Where assessments keep their durations, analysis results and video.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn save_durations(&self, id: &AssessmentId, durations: &SubtaskDurations)
    -> Result<()>;
    async fn load_durations(&self, id: &AssessmentId) -> Result<SubtaskDurations>;
    async fn save_record(&self, id: &AssessmentId, record: &TugAnalysisRecord) -> Result<()>;
    async fn load_record(&self, id: &AssessmentId) -> Result<TugAnalysisRecord>;
    async fn video_path(&self, id: &AssessmentId) -> Result<PathBuf>;
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("gaitguard")
}

/// One directory per assessment, holding JSON files and the trial video.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn assessment_dir(&self, id: &AssessmentId) -> PathBuf {
        self.root.join("assessments").join(id.to_string())
    }

    fn durations_path(&self, id: &AssessmentId) -> PathBuf {
        self.assessment_dir(id).join("durations.json")
    }

    fn record_path(&self, id: &AssessmentId) -> PathBuf {
        self.assessment_dir(id).join("analysis.json")
    }

    /// Copy a recorded video into the assessment's directory.
    pub async fn import_video(&self, id: &AssessmentId, source: &Path) -> Result<PathBuf> {
        let dir = self.assessment_dir(id);
        fs::create_dir_all(&dir).await?;
        let ext = source
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "mp4".to_string());
        let target = dir.join(format!("video.{ext}"));
        fs::copy(source, &target).await?;
        Ok(target)
    }

    async fn write_json<T: Serialize + Sync>(
        &self,
        id: &AssessmentId,
        path: &Path,
        value: &T,
    ) -> Result<()> {
        fs::create_dir_all(self.assessment_dir(id)).await?;
        let pretty_json = serde_json::to_string_pretty(value)?;
        fs::write(path, &pretty_json).await?;
        debug!(path = %path.display(), "saved");
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(&self, id: &AssessmentId, path: &Path) -> Result<T> {
        let json_content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(GaitError::AssessmentNotFound { id: id.to_string() });
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&json_content)?)
    }
}

#[async_trait]
impl AssessmentStore for JsonFileStore {
    async fn save_durations(
        &self,
        id: &AssessmentId,
        durations: &SubtaskDurations,
    ) -> Result<()> {
        self.write_json(id, &self.durations_path(id), durations).await
    }

    async fn load_durations(&self, id: &AssessmentId) -> Result<SubtaskDurations> {
        self.read_json(id, &self.durations_path(id)).await
    }

    async fn save_record(&self, id: &AssessmentId, record: &TugAnalysisRecord) -> Result<()> {
        self.write_json(id, &self.record_path(id), record).await
    }

    async fn load_record(&self, id: &AssessmentId) -> Result<TugAnalysisRecord> {
        self.read_json(id, &self.record_path(id)).await
    }

    async fn video_path(&self, id: &AssessmentId) -> Result<PathBuf> {
        let not_found = || GaitError::AssessmentNotFound { id: id.to_string() };
        let mut entries = match fs::read_dir(self.assessment_dir(id)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
                    return Ok(path);
                }
            }
        }
        Err(not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_durations_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let id = AssessmentId::new();
        let durations = SubtaskDurations::from_array([1.1, 2.2, 0.9, 2.4, 1.0, 1.6]);

        store.save_durations(&id, &durations).await.unwrap();
        assert_eq!(store.load_durations(&id).await.unwrap(), durations);
    }

    #[tokio::test]
    async fn test_missing_assessment() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let id = AssessmentId::new();

        assert!(matches!(
            store.load_durations(&id).await,
            Err(GaitError::AssessmentNotFound { .. })
        ));
        assert!(matches!(
            store.load_record(&id).await,
            Err(GaitError::AssessmentNotFound { .. })
        ));
        assert!(matches!(
            store.video_path(&id).await,
            Err(GaitError::AssessmentNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_imported_video_is_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data"));
        let id = AssessmentId::new();

        let source = dir.path().join("Trial.MP4");
        std::fs::write(&source, b"not really a video").unwrap();
        let imported = store.import_video(&id, &source).await.unwrap();

        assert_eq!(imported.file_name().unwrap(), "video.mp4");
        assert_eq!(store.video_path(&id).await.unwrap(), imported);
    }

    #[test]
    fn test_assessment_id_parse() {
        let id = AssessmentId::new();
        assert_eq!(id.to_string().parse::<AssessmentId>().unwrap(), id);
        assert!("not-a-uuid".parse::<AssessmentId>().is_err());
    }
}
