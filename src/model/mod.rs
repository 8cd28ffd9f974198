use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Post,
    Announcement,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Post => "post",
            EntryKind::Announcement => "announcement",
        }
    }
}

/// Identity of a feed entry within one session: posts and announcements
/// have separate id spaces on the backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct EntryKey {
    pub kind: EntryKind,
    pub id: i64,
}

impl EntryKey {
    pub fn post(id: i64) -> Self {
        Self { kind: EntryKind::Post, id }
    }

    pub fn announcement(id: i64) -> Self {
        Self { kind: EntryKind::Announcement, id }
    }
}

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AnnouncementDetails {
    pub view_count: Option<i64>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl AnnouncementDetails {
    /// Open-ended on either side when the bound is absent.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.starts_at.is_none_or(|s| s <= now) && self.ends_at.is_none_or(|e| now < e)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryDetails {
    Post,
    Announcement(AnnouncementDetails),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedEntry {
    pub id: i64,
    pub author_profile_id: i64,
    pub author_name: String,
    pub author_avatar_url: Option<String>,
    pub title: Option<String>,
    pub body: String,
    pub like_count: Option<i64>,
    pub comment_count: Option<i64>,
    pub published_at: DateTime<Utc>,
    pub resources: Vec<String>,
    pub is_followed_author: bool,
    pub is_favorited: bool,
    pub is_promoted: bool,
    /// Client-local; never read from the wire.
    pub viewer_has_liked: bool,
    pub details: EntryDetails,
}

impl FeedEntry {
    pub fn kind(&self) -> EntryKind {
        match self.details {
            EntryDetails::Post => EntryKind::Post,
            EntryDetails::Announcement(_) => EntryKind::Announcement,
        }
    }

    pub fn key(&self) -> EntryKey {
        EntryKey { kind: self.kind(), id: self.id }
    }

    pub fn announcement(&self) -> Option<&AnnouncementDetails> {
        match &self.details {
            EntryDetails::Announcement(a) => Some(a),
            EntryDetails::Post => None,
        }
    }

    pub(crate) fn announcement_mut(&mut self) -> Option<&mut AnnouncementDetails> {
        match &mut self.details {
            EntryDetails::Announcement(a) => Some(a),
            EntryDetails::Post => None,
        }
    }
}

/// Authoritative like state reported by the backend after a toggle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub liked_now: bool,
    pub total_likes: i64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveState {
    pub saved_now: bool,
}
