use serde::{Deserialize, Serialize};

/// Closed set of tag categories. Only sub-topic tags exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagType {
    #[serde(rename = "subTopic")]
    SubTopic,
}

impl TagType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagType::SubTopic => "subTopic",
        }
    }
}

impl From<String> for TagType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "subTopic" => TagType::SubTopic,
            _ => TagType::SubTopic, // Default fallback
        }
    }
}

impl std::fmt::Display for TagType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tag value attached to a message. Tags are immutable value data: a
/// message's tag list is only ever replaced wholesale, never edited in
/// place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Caller-supplied label. Unique within one message's tag list by
    /// convention only.
    pub id: String,
    #[serde(rename = "type")]
    pub tag_type: TagType,
    /// Assigned by the store when the tag is persisted; never supplied by
    /// callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
}

impl Tag {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_type: TagType::SubTopic,
            reference_id: None,
        }
    }
}

// ========== DTOs (Data Transfer Objects) ==========

/// One matched message inside a tag-search group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSummary {
    pub sender_id: String,
    pub message: String,
    pub tags: Vec<Tag>,
}

/// One group in the tag-search result: all matched messages sharing the
/// same distinct combination of matching tag ids
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedMessageGroup {
    /// Sorted distinct tag ids that matched the query for every message in
    /// this group
    pub tag_combination: Vec<String>,
    pub messages: Vec<MessageSummary>,
    /// Same combination again, kept as a separate field for callers that
    /// select it directly
    pub tag_id: Vec<String>,
}
