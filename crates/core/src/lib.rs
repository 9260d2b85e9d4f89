pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod learn;
pub mod quiz;
pub mod sanitize;
pub mod storage;
pub mod store;
pub mod tree;
pub mod types;
pub mod video;

pub use client::{
    CaptionClient, Captions, ChannelInfo, CollectionKind, FolderFile, Language, MAX_COLLECTION_LINKS,
    VideoLookup,
};
pub use config::{Config, get_root_data_dir};
pub use error::{
    ApiError, CaptutorError, ItemKind, PathError, PersistenceError, Result, StoreError,
    ValidationError,
};
pub use format::{
    caption_page, format_answer_feedback, format_history, format_listing, format_quiz_question,
    format_quiz_result, total_pages,
};
pub use learn::{FolderLearner, FolderLesson, LearnError, LessonSource, learn_folder};
pub use quiz::{
    Answer, GeneratedQuiz, MAX_REFRESHES, QuestionKind, QuizFormat, QuizQuestion, QuizResult,
    QuizSession, RefreshedQuestion,
};
pub use sanitize::{sanitize_name, validated_name};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::ItemStore;
pub use tree::{ItemPath, Node, NodeId, NodeKind, Tree};
pub use types::{ChatItem, ChatMessage, HistoryScope, Item, Sender};
pub use video::{extract_video_id, validate_video_url};
