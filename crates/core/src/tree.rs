//! Arena-backed folder tree for the transcript library.
//!
//! Nodes are addressed by [`NodeId`] handles that survive sibling inserts and
//! removals. Index paths (`[2, 0]` = first child of the root's third child) are
//! still accepted everywhere the consumer tracks a "current folder", and are
//! resolved against the live tree on each call.

use crate::{
    error::{ItemKind, PathError, PersistenceError},
    sanitize::names_match,
    types::Item,
};

/// Ordered child indices from the root. The empty path is the root.
pub type ItemPath = Vec<usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Folder {
        children: Vec<NodeId>,
    },
    File {
        content: Option<String>,
        video_id: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

impl Node {
    pub fn kind(&self) -> ItemKind {
        match self.kind {
            NodeKind::Folder { .. } => ItemKind::Folder,
            NodeKind::File { .. } => ItemKind::File,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder { .. })
    }

    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Folder { children } => children,
            NodeKind::File { .. } => &[],
        }
    }

    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { content, .. } => content.as_deref(),
            NodeKind::Folder { .. } => None,
        }
    }

    pub fn video_id(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { video_id, .. } => video_id.as_deref(),
            NodeKind::Folder { .. } => None,
        }
    }
}

/// Removed nodes are tombstoned in place rather than compacted, so handles
/// stay stable and the arena only grows for the life of a `Tree`.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Option<Node>>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.to_item() == other.to_item()
    }
}

impl Tree {
    /// A tree holding only an empty root folder named "root".
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node {
                name: "root".to_string(),
                parent: None,
                kind: NodeKind::Folder {
                    children: Vec::new(),
                },
            })],
        }
    }

    pub fn from_item(item: &Item) -> Result<Self, PersistenceError> {
        let Item::Folder { name, children } = item else {
            return Err(PersistenceError::InvalidRoot);
        };

        let mut tree = Self::new();
        if let Some(Some(root)) = tree.nodes.get_mut(0) {
            root.name = name.clone();
        }
        for child in children {
            tree.insert_item(NodeId::ROOT, child);
        }
        Ok(tree)
    }

    fn insert_item(&mut self, parent: NodeId, item: &Item) {
        match item {
            Item::Folder { name, children } => {
                let kind = NodeKind::Folder {
                    children: Vec::new(),
                };
                if let Some(id) = self.append_child(parent, name.clone(), kind) {
                    for child in children {
                        self.insert_item(id, child);
                    }
                }
            }
            Item::File {
                name,
                content,
                video_id,
            } => {
                let kind = NodeKind::File {
                    content: content.clone(),
                    video_id: video_id.clone(),
                };
                self.append_child(parent, name.clone(), kind);
            }
        }
    }

    pub fn to_item(&self) -> Item {
        self.item(NodeId::ROOT).unwrap_or_else(Item::empty_root)
    }

    /// Nested snapshot of the subtree under `id`.
    pub fn item(&self, id: NodeId) -> Option<Item> {
        let node = self.get(id)?;
        let item = match &node.kind {
            NodeKind::Folder { children } => Item::Folder {
                name: node.name.clone(),
                children: children.iter().filter_map(|c| self.item(*c)).collect(),
            },
            NodeKind::File { content, video_id } => Item::File {
                name: node.name.clone(),
                content: content.clone(),
                video_id: video_id.clone(),
            },
        };
        Some(item)
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or(&[])
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Walk `children[index]` from the root for each step of `path`.
    pub fn resolve(&self, path: &[usize]) -> Result<NodeId, PathError> {
        let mut current = NodeId::ROOT;
        for (depth, &index) in path.iter().enumerate() {
            current = self.child_at(current, index, depth)?;
        }
        Ok(current)
    }

    /// Like [`Tree::resolve`], but the target must be a folder.
    pub fn resolve_folder(&self, path: &[usize]) -> Result<NodeId, PathError> {
        let id = self.resolve(path)?;
        match self.get(id) {
            Some(node) if node.is_folder() => Ok(id),
            _ => Err(PathError::NotAFolder { depth: path.len() }),
        }
    }

    pub(crate) fn child_at(
        &self,
        parent: NodeId,
        index: usize,
        depth: usize,
    ) -> Result<NodeId, PathError> {
        let node = self.get(parent).ok_or(PathError::NotAFolder { depth })?;
        let NodeKind::Folder { children } = &node.kind else {
            return Err(PathError::NotAFolder { depth });
        };
        children
            .get(index)
            .copied()
            .ok_or(PathError::IndexOutOfRange {
                depth,
                index,
                len: children.len(),
            })
    }

    /// Index path of a live node, the inverse of [`Tree::resolve`].
    pub fn path_of(&self, id: NodeId) -> Option<ItemPath> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.get(current)?.parent {
            let position = self.children(parent).iter().position(|c| *c == current)?;
            path.push(position);
            current = parent;
        }
        path.reverse();
        Some(path)
    }

    /// Sibling of the given kind whose name matches case-insensitively.
    pub fn find_sibling(
        &self,
        parent: NodeId,
        kind: ItemKind,
        name: &str,
        except: Option<NodeId>,
    ) -> Option<NodeId> {
        self.children(parent).iter().copied().find(|&c| {
            Some(c) != except
                && self
                    .get(c)
                    .is_some_and(|n| n.kind() == kind && names_match(&n.name, name))
        })
    }

    pub fn folder_exists(&self, parent: NodeId, name: &str) -> bool {
        self.find_sibling(parent, ItemKind::Folder, name, None)
            .is_some()
    }

    /// `name` is compared as stored, so it must already carry the `.txt` suffix.
    pub fn file_exists(&self, parent: NodeId, name: &str) -> bool {
        self.find_sibling(parent, ItemKind::File, name, None).is_some()
    }

    /// Append to `parent`'s children. Returns `None` if `parent` is not a live folder.
    pub(crate) fn append_child(
        &mut self,
        parent: NodeId,
        name: String,
        kind: NodeKind,
    ) -> Option<NodeId> {
        let id = NodeId(self.nodes.len());
        match self.nodes.get_mut(parent.0) {
            Some(Some(Node {
                kind: NodeKind::Folder { children },
                ..
            })) => children.push(id),
            _ => return None,
        }
        self.nodes.push(Some(Node {
            name,
            parent: Some(parent),
            kind,
        }));
        Some(id)
    }

    /// Detach `children[index]` of `parent` and drop its whole subtree.
    pub(crate) fn remove_child(&mut self, parent: NodeId, index: usize) -> Option<Item> {
        let removed = match self.nodes.get_mut(parent.0) {
            Some(Some(Node {
                kind: NodeKind::Folder { children },
                ..
            })) if index < children.len() => children.remove(index),
            _ => return None,
        };
        let snapshot = self.item(removed);
        self.drop_subtree(removed);
        snapshot
    }

    fn drop_subtree(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id.0).and_then(Option::take) else {
            return;
        };
        if let NodeKind::Folder { children } = node.kind {
            for child in children {
                self.drop_subtree(child);
            }
        }
    }

    pub(crate) fn rename(&mut self, id: NodeId, name: String) -> bool {
        match self.nodes.get_mut(id.0) {
            Some(Some(node)) => {
                node.name = name;
                true
            }
            _ => false,
        }
    }

    /// Files with non-blank content under `folder`, depth-first pre-order.
    pub fn collect_files(&self, folder: NodeId) -> Vec<NodeId> {
        let mut files = Vec::new();
        self.collect_files_into(folder, &mut files);
        files
    }

    fn collect_files_into(&self, folder: NodeId, files: &mut Vec<NodeId>) {
        for &child in self.children(folder) {
            let Some(node) = self.get(child) else {
                continue;
            };
            match &node.kind {
                NodeKind::File { content, .. } => {
                    if content.as_deref().is_some_and(|c| !c.trim().is_empty()) {
                        files.push(child);
                    }
                }
                NodeKind::Folder { .. } => self.collect_files_into(child, files),
            }
        }
    }

    /// First folder named exactly `name` in pre-order, the root included.
    pub fn find_folder(&self, name: &str) -> Option<NodeId> {
        self.find_folder_from(NodeId::ROOT, name)
    }

    fn find_folder_from(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let node = self.get(id)?;
        if !node.is_folder() {
            return None;
        }
        if node.name == name {
            return Some(id);
        }
        node.children()
            .iter()
            .find_map(|&child| self.find_folder_from(child, name))
    }
}
