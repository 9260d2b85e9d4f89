use serde::{Deserialize, Serialize};

/// Persisted form of the library tree, one JSON object per node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Item {
    Folder {
        name: String,
        #[serde(default)]
        children: Vec<Item>,
    },
    File {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(rename = "videoId", default, skip_serializing_if = "Option::is_none")]
        video_id: Option<String>,
    },
}

impl Item {
    pub fn empty_root() -> Self {
        Item::Folder {
            name: "root".to_string(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Folder { name, .. } | Item::File { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatItem {
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub video_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One line of a Q&A transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }
}

/// Which Q&A transcript a message belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HistoryScope {
    /// The single-video chat.
    Video,
    /// A folder-level chat, keyed by folder name.
    Folder(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_the_browser_layout() {
        let json = r#"{"name":"root","type":"folder","children":[
            {"name":"Physics","type":"folder"},
            {"name":"Intro.txt","type":"file","content":"hello","videoId":"dQw4w9WgXcQ"}
        ]}"#;
        let item: Item = serde_json::from_str(json).unwrap();
        let Item::Folder { children, .. } = &item else {
            panic!("root should be a folder");
        };
        assert_eq!(
            children[0],
            Item::Folder {
                name: "Physics".to_string(),
                children: vec![]
            }
        );
        assert_eq!(
            children[1],
            Item::File {
                name: "Intro.txt".to_string(),
                content: Some("hello".to_string()),
                video_id: Some("dQw4w9WgXcQ".to_string()),
            }
        );
    }

    #[test]
    fn file_without_content_omits_fields() {
        let item = Item::File {
            name: "Empty.txt".to_string(),
            content: None,
            video_id: None,
        };
        assert_eq!(
            serde_json::to_string(&item).unwrap(),
            r#"{"type":"file","name":"Empty.txt"}"#
        );
    }

    #[test]
    fn chat_item_uses_camel_case_video_id() {
        let chat = ChatItem {
            name: "Video A".to_string(),
            content: "hello".to_string(),
            video_id: "id1".to_string(),
        };
        let json = serde_json::to_value(&chat).unwrap();
        assert_eq!(json["videoId"], "id1");
    }
}
