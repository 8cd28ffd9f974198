use serde::Deserialize;
use serde_json::Value;

use crate::model::EntryKind;

// One feed row as the backend serializes it. Timestamps stay raw so the
// normalizer can report which field failed; `resources` stays raw because
// its shape varies.
#[derive(Debug, Deserialize)]
pub(crate) struct WireRow {
    pub kind: EntryKind,
    pub id: i64,
    pub author_profile_id: i64,
    pub author_name: String,
    #[serde(default)]
    pub author_avatar_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub body: String,
    #[serde(default)]
    pub like_count: Option<i64>,
    #[serde(default)]
    pub comment_count: Option<i64>,
    pub published_at: String,
    #[serde(default)]
    pub resources: Option<Value>,
    pub is_followed_author: bool,
    pub is_favorited: bool,
    pub is_promoted: bool,
    #[serde(default)]
    pub view_count: Option<i64>,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub ends_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireResource {
    pub url: String,
}
