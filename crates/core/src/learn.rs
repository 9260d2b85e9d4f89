//! "Learn content" for a whole folder: gather every saved transcript below it
//! and turn them into captions the Q&A flow can use.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::client::{CaptionClient, FolderFile};
use crate::error::ApiError;
use crate::storage::KeyValueStore;
use crate::store::ItemStore;

/// The remote side of folder learning.
#[async_trait]
pub trait FolderLearner {
    async fn learn(&self, folder_name: &str, files: &[FolderFile]) -> Result<Vec<String>, ApiError>;
}

#[async_trait]
impl FolderLearner for CaptionClient {
    async fn learn(&self, folder_name: &str, files: &[FolderFile]) -> Result<Vec<String>, ApiError> {
        self.learn_folder_content(folder_name, files).await
    }
}

#[derive(Error, Debug)]
pub enum LearnError {
    #[error("no folder named \"{name}\"")]
    FolderNotFound { name: String },

    /// Nothing below the folder holds non-blank content.
    #[error("This folder and its subfolders are empty.")]
    EmptyFolder { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonSource {
    Service,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderLesson {
    pub folder_name: String,
    pub captions: Vec<String>,
    pub source: LessonSource,
    /// Set when the saved file contents were used instead of the service's answer.
    pub notice: Option<String>,
}

pub async fn learn_folder<S, L>(
    store: &ItemStore<S>,
    learner: &L,
    folder_name: &str,
) -> Result<FolderLesson, LearnError>
where
    S: KeyValueStore,
    L: FolderLearner + ?Sized,
{
    let not_found = || LearnError::FolderNotFound {
        name: folder_name.to_string(),
    };
    let folder_path = store.find_folder_path(folder_name).ok_or_else(not_found)?;

    let files: Vec<FolderFile> = store
        .collect_files(&folder_path)
        .map_err(|_| not_found())?
        .into_iter()
        .map(|node| FolderFile {
            name: node.name.clone(),
            content: node.content().unwrap_or_default().to_string(),
        })
        .collect();

    if files.is_empty() {
        return Err(LearnError::EmptyFolder {
            name: folder_name.to_string(),
        });
    }

    info!(folder = folder_name, files = files.len(), "learning folder content");

    let notice = match learner.learn(folder_name, &files).await {
        Ok(captions) if !captions.is_empty() => {
            return Ok(FolderLesson {
                folder_name: folder_name.to_string(),
                captions,
                source: LessonSource::Service,
                notice: None,
            });
        }
        Ok(_) => "The service returned no captions; using the saved file contents.".to_string(),
        Err(e) => {
            warn!(folder = folder_name, error = %e, "folder learning failed, falling back");
            format!("{} Using the saved file contents.", e.user_message())
        }
    };

    Ok(FolderLesson {
        folder_name: folder_name.to_string(),
        captions: files.into_iter().map(|f| f.content).collect(),
        source: LessonSource::Fallback,
        notice: Some(notice),
    })
}
