//! The library store: the folder tree of saved transcripts plus the flat chat list.
//!
//! Every successful mutation rewrites the affected blob (whole tree or whole
//! chat list) to storage before returning. Storage failures never abort a
//! mutation; they are logged and the in-memory state stays authoritative.

use tracing::{debug, warn};

use crate::{
    error::{ItemKind, PathError, StoreError, ValidationError},
    history::{clear_history, load_history, save_history},
    sanitize::{file_name, validated_name},
    storage::{CHATS_KEY, KeyValueStore, TREE_KEY},
    tree::{ItemPath, Node, NodeId, NodeKind, Tree},
    types::{ChatItem, ChatMessage, HistoryScope, Item},
};

pub struct ItemStore<S: KeyValueStore> {
    storage: S,
    tree: Tree,
    chats: Vec<ChatItem>,
}

impl<S: KeyValueStore> ItemStore<S> {
    /// Restore the tree and chat list from `storage`, starting empty when
    /// nothing usable is stored.
    pub fn open(storage: S) -> Self {
        let tree = load_tree(&storage);
        let chats = load_chats(&storage);
        debug!(
            nodes = tree.node_count(),
            chats = chats.len(),
            "item store opened"
        );
        Self {
            storage,
            tree,
            chats,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.tree.get(id)
    }

    pub fn resolve(&self, path: &[usize]) -> Result<&Node, PathError> {
        let id = self.tree.resolve(path)?;
        self.tree
            .get(id)
            .ok_or(PathError::NotAFolder { depth: path.len() })
    }

    /// Children of the folder at `folder_path`, with their index in that folder.
    pub fn list(&self, folder_path: &[usize]) -> Result<Vec<(usize, &Node)>, PathError> {
        let folder = self.tree.resolve_folder(folder_path)?;
        Ok(self
            .tree
            .children(folder)
            .iter()
            .enumerate()
            .filter_map(|(i, id)| self.tree.get(*id).map(|n| (i, n)))
            .collect())
    }

    pub fn folder_exists(&self, name: &str, parent_path: &[usize]) -> Result<bool, PathError> {
        let parent = self.tree.resolve_folder(parent_path)?;
        Ok(self.tree.folder_exists(parent, name))
    }

    pub fn file_exists(&self, name: &str, parent_path: &[usize]) -> Result<bool, PathError> {
        let parent = self.tree.resolve_folder(parent_path)?;
        Ok(self.tree.file_exists(parent, name))
    }

    pub fn create_folder(
        &mut self,
        parent_path: &[usize],
        raw_name: &str,
    ) -> Result<NodeId, StoreError> {
        let name = validated_name(raw_name)?;
        let parent = self.tree.resolve_folder(parent_path)?;
        if self.tree.folder_exists(parent, &name) {
            return Err(ValidationError::DuplicateName {
                kind: ItemKind::Folder,
                name,
            }
            .into());
        }

        let kind = NodeKind::Folder {
            children: Vec::new(),
        };
        let id = self
            .tree
            .append_child(parent, name, kind)
            .ok_or(PathError::NotAFolder {
                depth: parent_path.len(),
            })?;
        debug!(path = ?parent_path, "folder created");
        self.persist_tree();
        Ok(id)
    }

    /// Add a transcript file. The stored name is the sanitized base name plus `.txt`.
    pub fn create_file(
        &mut self,
        parent_path: &[usize],
        raw_name: &str,
        content: impl Into<String>,
        video_id: Option<String>,
    ) -> Result<NodeId, StoreError> {
        let name = file_name(&validated_name(raw_name)?);
        let parent = self.tree.resolve_folder(parent_path)?;
        if self.tree.file_exists(parent, &name) {
            return Err(ValidationError::DuplicateName {
                kind: ItemKind::File,
                name,
            }
            .into());
        }

        let kind = NodeKind::File {
            content: Some(content.into()),
            video_id,
        };
        let id = self
            .tree
            .append_child(parent, name, kind)
            .ok_or(PathError::NotAFolder {
                depth: parent_path.len(),
            })?;
        debug!(path = ?parent_path, "file created");
        self.persist_tree();
        Ok(id)
    }

    /// Save a video's captions into the library, one blank line between captions.
    pub fn save_transcript(
        &mut self,
        parent_path: &[usize],
        title: &str,
        captions: &[String],
        video_id: Option<String>,
    ) -> Result<NodeId, StoreError> {
        self.create_file(parent_path, title, captions.join("\n\n"), video_id)
    }

    pub fn rename_item(
        &mut self,
        parent_path: &[usize],
        index: usize,
        raw_new_name: &str,
        kind: ItemKind,
    ) -> Result<(), StoreError> {
        let base = validated_name(raw_new_name)?;
        let parent = self.tree.resolve_folder(parent_path)?;
        let target = self.tree.child_at(parent, index, parent_path.len())?;

        let found = self
            .tree
            .get(target)
            .map(Node::kind)
            .ok_or(PathError::NotAFolder {
                depth: parent_path.len(),
            })?;
        if found != kind {
            return Err(StoreError::WrongKind {
                expected: kind,
                found,
            });
        }

        let name = match kind {
            ItemKind::File => file_name(&base),
            _ => base,
        };
        if self
            .tree
            .find_sibling(parent, kind, &name, Some(target))
            .is_some()
        {
            return Err(ValidationError::DuplicateName { kind, name }.into());
        }

        self.tree.rename(target, name);
        debug!(path = ?parent_path, index, "item renamed");
        self.persist_tree();
        Ok(())
    }

    /// Remove `children[index]` of the folder at `parent_path`, subtree included.
    pub fn delete_item(&mut self, parent_path: &[usize], index: usize) -> Result<Item, StoreError> {
        let parent = self.tree.resolve_folder(parent_path)?;
        self.tree.child_at(parent, index, parent_path.len())?;
        let removed = self
            .tree
            .remove_child(parent, index)
            .ok_or(PathError::NotAFolder {
                depth: parent_path.len(),
            })?;
        debug!(path = ?parent_path, index, name = removed.name(), "item deleted");
        self.persist_tree();
        Ok(removed)
    }

    /// Files with non-blank content anywhere below the folder at `folder_path`.
    pub fn collect_files(&self, folder_path: &[usize]) -> Result<Vec<&Node>, PathError> {
        let folder = self.tree.resolve_folder(folder_path)?;
        Ok(self.collect_files_in(folder))
    }

    pub fn collect_files_in(&self, folder: NodeId) -> Vec<&Node> {
        self.tree
            .collect_files(folder)
            .into_iter()
            .filter_map(|id| self.tree.get(id))
            .collect()
    }

    /// Path of the first folder named exactly `name`. `Some(vec![])` means the root.
    pub fn find_folder_path(&self, name: &str) -> Option<ItemPath> {
        self.tree
            .find_folder(name)
            .and_then(|id| self.tree.path_of(id))
    }

    pub fn chats(&self) -> &[ChatItem] {
        &self.chats
    }

    pub fn chat(&self, name: &str) -> Option<&ChatItem> {
        self.chats.iter().find(|c| c.name == name)
    }

    /// Return the chat called `name`, creating it with `content_if_new` if absent.
    /// An existing chat is never overwritten.
    pub fn upsert_chat(&mut self, name: &str, video_id: &str, content_if_new: &str) -> &ChatItem {
        let position = match self.chats.iter().position(|c| c.name == name) {
            Some(existing) => existing,
            None => {
                self.chats.push(ChatItem {
                    name: name.to_string(),
                    content: content_if_new.to_string(),
                    video_id: video_id.to_string(),
                });
                debug!(name, "chat created");
                self.persist_chats();
                self.chats.len() - 1
            }
        };
        &self.chats[position]
    }

    pub fn rename_chat(&mut self, name: &str, raw_new_name: &str) -> Result<(), StoreError> {
        let new_name = validated_name(raw_new_name)?;
        let position = self
            .chats
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| StoreError::ChatNotFound {
                name: name.to_string(),
            })?;
        let taken = self
            .chats
            .iter()
            .enumerate()
            .any(|(i, c)| i != position && c.name == new_name);
        if taken {
            return Err(ValidationError::DuplicateName {
                kind: ItemKind::Chat,
                name: new_name,
            }
            .into());
        }

        self.chats[position].name = new_name;
        self.persist_chats();
        Ok(())
    }

    /// Returns whether a chat was removed.
    pub fn delete_chat(&mut self, name: &str) -> bool {
        let before = self.chats.len();
        self.chats.retain(|c| c.name != name);
        let removed = self.chats.len() != before;
        if removed {
            self.persist_chats();
        }
        removed
    }

    /// Replace a chat's content in place, for regenerated or edited transcripts.
    pub fn set_chat_content(&mut self, name: &str, content: &str) -> Result<(), StoreError> {
        let chat = self
            .chats
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| StoreError::ChatNotFound {
                name: name.to_string(),
            })?;
        chat.content = content.to_string();
        self.persist_chats();
        Ok(())
    }

    pub fn history(&self, scope: &HistoryScope) -> Vec<ChatMessage> {
        load_history(&self.storage, scope)
    }

    /// Append to a Q&A transcript and return the updated transcript.
    pub fn append_history(
        &self,
        scope: &HistoryScope,
        messages: impl IntoIterator<Item = ChatMessage>,
    ) -> Vec<ChatMessage> {
        let mut history = load_history(&self.storage, scope);
        history.extend(messages);
        save_history(&self.storage, scope, &history);
        history
    }

    pub fn clear_history(&self, scope: &HistoryScope) {
        clear_history(&self.storage, scope);
    }

    fn persist_tree(&self) {
        persist(&self.storage, TREE_KEY, &self.tree.to_item());
    }

    fn persist_chats(&self) {
        persist(&self.storage, CHATS_KEY, &self.chats);
    }
}

fn persist<S: KeyValueStore, T: serde::Serialize + ?Sized>(storage: &S, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(crate::error::PersistenceError::from)
        .and_then(|json| storage.set(key, &json));
    match result {
        Ok(()) => debug!(key, "persisted"),
        Err(e) => warn!(key, error = %e, "could not persist, keeping in-memory state"),
    }
}

fn load_tree<S: KeyValueStore>(storage: &S) -> Tree {
    let raw = match storage.get(TREE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Tree::new(),
        Err(e) => {
            warn!(error = %e, "could not read folder tree, starting empty");
            return Tree::new();
        }
    };
    let parsed = serde_json::from_str::<Item>(&raw)
        .map_err(crate::error::PersistenceError::from)
        .and_then(|item| Tree::from_item(&item));
    parsed.unwrap_or_else(|e| {
        warn!(error = %e, "discarding malformed folder tree, starting empty");
        Tree::new()
    })
}

fn load_chats<S: KeyValueStore>(storage: &S) -> Vec<ChatItem> {
    match storage.get(CHATS_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "discarding malformed chat list");
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!(error = %e, "could not read chat list");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> ItemStore<MemoryStore> {
        ItemStore::open(MemoryStore::new())
    }

    #[test]
    fn starts_with_an_empty_root() {
        let store = store();
        let root = store.resolve(&[]).unwrap();
        assert_eq!(root.name, "root");
        assert!(root.children().is_empty());
        // Nothing is written until the first mutation.
        assert!(store.storage().is_empty());
    }

    #[test]
    fn created_folder_is_found_in_any_case() {
        let mut store = store();
        store.create_folder(&[], "Physics Lectures").unwrap();
        assert!(store.folder_exists("physics lectures", &[]).unwrap());
        assert!(store.folder_exists("PHYSICS LECTURES", &[]).unwrap());
        assert!(!store.file_exists("Physics Lectures", &[]).unwrap());
    }

    #[test]
    fn create_folder_stores_the_sanitized_name() {
        let mut store = store();
        let id = store.create_folder(&[], "  <b>Maths!</b>  ").unwrap();
        assert_eq!(store.node(id).unwrap().name, "Maths");
    }

    #[test]
    fn invalid_length_leaves_tree_untouched() {
        let mut store = store();
        let before = store.tree().clone();
        let long = "y".repeat(51);
        for raw in ["ab", "<i>x</i>", "!!!!!!", long.as_str()] {
            let err = store.create_folder(&[], raw).unwrap_err();
            assert!(matches!(
                err,
                StoreError::Validation(ValidationError::InvalidLength { .. })
            ));
        }
        assert_eq!(store.tree(), &before);
        assert!(store.storage().is_empty());
    }

    #[test]
    fn duplicate_folder_differing_in_case_is_rejected() {
        let mut store = store();
        store.create_folder(&[], "Biology").unwrap();
        let err = store.create_folder(&[], "BIOLOGY").unwrap_err();
        assert_eq!(
            err,
            StoreError::Validation(ValidationError::DuplicateName {
                kind: ItemKind::Folder,
                name: "BIOLOGY".to_string(),
            })
        );
        assert_eq!(store.list(&[]).unwrap().len(), 1);
    }

    #[test]
    fn folders_and_files_may_share_a_name() {
        let mut store = store();
        store.create_file(&[], "Notes", "x", None).unwrap();
        store.create_folder(&[], "Notes.txt").unwrap();
        assert_eq!(store.list(&[]).unwrap().len(), 2);
    }

    #[test]
    fn same_name_in_different_folders_is_fine() {
        let mut store = store();
        store.create_folder(&[], "Alpha").unwrap();
        store.create_folder(&[], "Beta").unwrap();
        store.create_folder(&[0], "Shared").unwrap();
        store.create_folder(&[1], "Shared").unwrap();
        assert!(store.folder_exists("shared", &[0]).unwrap());
        assert!(store.folder_exists("shared", &[1]).unwrap());
    }

    #[test]
    fn create_under_a_file_is_a_path_error() {
        let mut store = store();
        store.create_file(&[], "Intro", "hello", None).unwrap();
        let err = store.create_folder(&[0], "Nested").unwrap_err();
        assert_eq!(err, StoreError::Path(PathError::NotAFolder { depth: 1 }));
        let err = store.create_folder(&[3], "Nested").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Path(PathError::IndexOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn save_transcript_appends_suffix_and_joins_captions() {
        let mut store = store();
        store.create_folder(&[], "Lectures").unwrap();
        let captions = vec!["first".to_string(), "second".to_string()];
        let id = store
            .save_transcript(&[0], "Waves 101", &captions, Some("abcdefghijk".to_string()))
            .unwrap();

        let node = store.node(id).unwrap();
        assert_eq!(node.name, "Waves 101.txt");
        assert_eq!(node.content(), Some("first\n\nsecond"));
        assert_eq!(node.video_id(), Some("abcdefghijk"));

        let again = store.save_transcript(&[0], "waves 101", &captions, None);
        assert!(matches!(
            again,
            Err(StoreError::Validation(ValidationError::DuplicateName {
                kind: ItemKind::File,
                ..
            }))
        ));
    }

    #[test]
    fn rename_file_colliding_with_sibling_is_rejected() {
        let mut store = store();
        store.create_file(&[], "Intro", "a", None).unwrap();
        store.create_file(&[], "Outro", "b", None).unwrap();

        let err = store
            .rename_item(&[], 1, "INTRO", ItemKind::File)
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Validation(ValidationError::DuplicateName {
                kind: ItemKind::File,
                name: "INTRO.txt".to_string(),
            })
        );
        assert_eq!(store.resolve(&[1]).unwrap().name, "Outro.txt");
    }

    #[test]
    fn rename_may_change_case_of_itself() {
        let mut store = store();
        store.create_folder(&[], "chemistry").unwrap();
        store
            .rename_item(&[], 0, "Chemistry", ItemKind::Folder)
            .unwrap();
        assert_eq!(store.resolve(&[0]).unwrap().name, "Chemistry");
    }

    #[test]
    fn rename_file_adds_suffix() {
        let mut store = store();
        store.create_file(&[], "Draft", "a", None).unwrap();
        store.rename_item(&[], 0, "Final", ItemKind::File).unwrap();
        assert_eq!(store.resolve(&[0]).unwrap().name, "Final.txt");
    }

    #[test]
    fn rename_with_wrong_kind_or_bad_length_is_rejected() {
        let mut store = store();
        store.create_folder(&[], "Folder").unwrap();
        let err = store
            .rename_item(&[], 0, "Another", ItemKind::File)
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::WrongKind {
                expected: ItemKind::File,
                found: ItemKind::Folder
            }
        );
        let err = store
            .rename_item(&[], 0, "no", ItemKind::Folder)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::InvalidLength { len: 2, .. })
        ));
        assert_eq!(store.resolve(&[0]).unwrap().name, "Folder");
    }

    #[test]
    fn delete_removes_descendants_from_collect_files() {
        let mut store = store();
        store.create_folder(&[], "Aaa").unwrap();
        store.create_folder(&[0], "Bbb").unwrap();
        store.create_file(&[0, 0], "file1", "one", None).unwrap();
        store.create_file(&[0], "file2", "two", None).unwrap();
        store.create_file(&[], "top", "three", None).unwrap();

        let names: Vec<_> = store
            .collect_files(&[])
            .unwrap()
            .iter()
            .map(|n| n.name.clone())
            .collect();
        assert_eq!(names, ["file1.txt", "file2.txt", "top.txt"]);

        let removed = store.delete_item(&[], 0).unwrap();
        assert_eq!(removed.name(), "Aaa");
        let names: Vec<_> = store
            .collect_files(&[])
            .unwrap()
            .iter()
            .map(|n| n.name.clone())
            .collect();
        assert_eq!(names, ["top.txt"]);
        assert_eq!(store.find_folder_path("Bbb"), None);
    }

    #[test]
    fn delete_out_of_range_is_a_path_error() {
        let mut store = store();
        let err = store.delete_item(&[], 0).unwrap_err();
        assert_eq!(
            err,
            StoreError::Path(PathError::IndexOutOfRange {
                depth: 0,
                index: 0,
                len: 0
            })
        );
    }

    #[test]
    fn find_folder_path_separates_root_and_missing() {
        let mut store = store();
        store.create_folder(&[], "Outer").unwrap();
        store.create_folder(&[0], "Inner").unwrap();
        assert_eq!(store.find_folder_path("root"), Some(vec![]));
        assert_eq!(store.find_folder_path("Inner"), Some(vec![0, 0]));
        assert_eq!(store.find_folder_path("inner"), None);
        assert_eq!(store.find_folder_path("Nowhere"), None);
    }

    #[test]
    fn upsert_chat_never_overwrites() {
        let mut store = store();
        store.upsert_chat("Video A", "id1", "hello");
        let chat = store.upsert_chat("Video A", "id1", "different");
        assert_eq!(chat.content, "hello");
        assert_eq!(store.chats().len(), 1);
    }

    #[test]
    fn rename_and_delete_chat() {
        let mut store = store();
        store.upsert_chat("Video A", "id1", "a");
        store.upsert_chat("Video B", "id2", "b");

        assert!(matches!(
            store.rename_chat("Video A", "Video B"),
            Err(StoreError::Validation(ValidationError::DuplicateName {
                kind: ItemKind::Chat,
                ..
            }))
        ));
        assert!(matches!(
            store.rename_chat("Missing", "Whatever"),
            Err(StoreError::ChatNotFound { .. })
        ));

        store.rename_chat("Video A", "<em>Lecture</em> one").unwrap();
        assert_eq!(store.chat("Lecture one").unwrap().video_id, "id1");
        assert!(store.chat("Video A").is_none());

        assert!(store.delete_chat("Lecture one"));
        assert!(!store.delete_chat("Lecture one"));
        assert_eq!(store.chats().len(), 1);
    }

    #[test]
    fn set_chat_content_overwrites_in_place() {
        let mut store = store();
        store.upsert_chat("Video A", "id1", "old");
        store.set_chat_content("Video A", "new").unwrap();
        assert_eq!(store.chat("Video A").unwrap().content, "new");
    }

    #[test]
    fn reopen_restores_tree_and_chats() {
        let storage = MemoryStore::new();
        let mut first = ItemStore::open(storage.clone());
        first.create_folder(&[], "Saved").unwrap();
        first
            .create_file(&[0], "Clip", "text", Some("vid".to_string()))
            .unwrap();
        first.upsert_chat("Clip", "vid", "text");

        let second = ItemStore::open(storage);
        assert_eq!(second.tree(), first.tree());
        assert_eq!(second.chats(), first.chats());
    }

    #[test]
    fn malformed_storage_falls_back_to_defaults() {
        let storage = MemoryStore::new();
        storage.set(TREE_KEY, "{\"oops\"").unwrap();
        storage.set(CHATS_KEY, "42").unwrap();
        let store = ItemStore::open(storage);
        assert_eq!(store.tree(), &Tree::new());
        assert!(store.chats().is_empty());
    }

    #[test]
    fn file_root_falls_back_to_default() {
        let storage = MemoryStore::new();
        storage
            .set(TREE_KEY, r#"{"name":"root","type":"file"}"#)
            .unwrap();
        let store = ItemStore::open(storage);
        assert!(store.resolve(&[]).unwrap().is_folder());
    }

    #[test]
    fn history_appends_accumulate() {
        let store = store();
        let scope = HistoryScope::Folder("Physics".to_string());
        store.append_history(&scope, [ChatMessage::user("q1")]);
        let all = store.append_history(&scope, [ChatMessage::bot("a1")]);
        assert_eq!(all.len(), 2);
        assert_eq!(store.history(&scope), all);

        store.clear_history(&scope);
        assert!(store.history(&scope).is_empty());
    }
}
