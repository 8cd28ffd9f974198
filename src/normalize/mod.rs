//! Turns loosely-typed RPC payloads into [`FeedEntry`] values.
//!
//! Decoding is all-or-nothing per call: one bad row fails the whole page.
//! The shape fallbacks the backend is known to produce are listed as named
//! cases ([`PayloadShape`], [`ResourcesShape`]) rather than retried decodes.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::FeedError;
use crate::model::{
    AnnouncementDetails, EntryDetails, EntryKind, FeedEntry, LikeState, SaveState,
};

pub mod time;
mod wire;

use wire::{WireResource, WireRow};

/// How an RPC result arrived on the wire.
#[derive(Debug, PartialEq)]
pub enum PayloadShape {
    /// A JSON array of rows (set-returning functions).
    Rows(Vec<Value>),
    /// A single JSON object (scalar-returning functions).
    SingleRow(Value),
    /// `null`: the function produced nothing.
    NoRows,
}

impl PayloadShape {
    pub fn classify(payload: Value) -> Result<Self, FeedError> {
        match payload {
            Value::Array(rows) => Ok(PayloadShape::Rows(rows)),
            obj @ Value::Object(_) => Ok(PayloadShape::SingleRow(obj)),
            Value::Null => Ok(PayloadShape::NoRows),
            other => {
                Err(FeedError::schema(None, format!("expected rows, got {}", json_type(&other))))
            }
        }
    }

    fn into_rows(self) -> Vec<Value> {
        match self {
            PayloadShape::Rows(rows) => rows,
            PayloadShape::SingleRow(row) => vec![row],
            PayloadShape::NoRows => Vec::new(),
        }
    }

    fn into_first(self) -> Option<Value> {
        self.into_rows().into_iter().next()
    }
}

/// How the `resources` column arrived.
#[derive(Debug, PartialEq)]
pub enum ResourcesShape {
    /// Array of `{url}` objects.
    List(Vec<Value>),
    /// A bare object: a server-side serialization artifact, read as empty.
    ObjectArtifact,
    /// Absent or `null`.
    Missing,
}

impl ResourcesShape {
    pub fn classify(raw: Option<Value>) -> Result<Self, String> {
        match raw {
            None | Some(Value::Null) => Ok(ResourcesShape::Missing),
            Some(Value::Array(items)) => Ok(ResourcesShape::List(items)),
            Some(Value::Object(_)) => Ok(ResourcesShape::ObjectArtifact),
            Some(other) => Err(format!(
                "`resources`: expected array or object, got {}",
                json_type(&other)
            )),
        }
    }

    fn into_urls(self) -> Result<Vec<String>, String> {
        match self {
            ResourcesShape::List(items) => items
                .into_iter()
                .map(|item| {
                    serde_json::from_value::<WireResource>(item)
                        .map(|r| r.url)
                        .map_err(|e| format!("`resources`: {e}"))
                })
                .collect(),
            ResourcesShape::ObjectArtifact | ResourcesShape::Missing => Ok(Vec::new()),
        }
    }
}

/// Decode one page of feed rows from raw bytes.
pub fn decode_page(bytes: &[u8]) -> Result<Vec<FeedEntry>, FeedError> {
    decode_page_value(parse_json(bytes)?)
}

pub fn decode_page_value(payload: Value) -> Result<Vec<FeedEntry>, FeedError> {
    PayloadShape::classify(payload)?
        .into_rows()
        .into_iter()
        .enumerate()
        .map(|(i, row)| decode_row(i, row))
        .collect()
}

fn decode_row(index: usize, row: Value) -> Result<FeedEntry, FeedError> {
    let w: WireRow =
        serde_json::from_value(row).map_err(|e| FeedError::schema(Some(index), e.to_string()))?;

    let resources = ResourcesShape::classify(w.resources)
        .and_then(ResourcesShape::into_urls)
        .map_err(|reason| FeedError::schema(Some(index), reason))?;
    let published_at = time::required("published_at", &w.published_at)?;

    // announcement-only columns are ignored on posts
    let details = match w.kind {
        EntryKind::Post => EntryDetails::Post,
        EntryKind::Announcement => EntryDetails::Announcement(AnnouncementDetails {
            view_count: w.view_count,
            starts_at: time::optional("starts_at", w.starts_at.as_deref())?,
            ends_at: time::optional("ends_at", w.ends_at.as_deref())?,
        }),
    };

    Ok(FeedEntry {
        id: w.id,
        author_profile_id: w.author_profile_id,
        author_name: w.author_name,
        author_avatar_url: w.author_avatar_url,
        title: w.title,
        body: w.body,
        like_count: w.like_count,
        comment_count: w.comment_count,
        published_at,
        resources,
        is_followed_author: w.is_followed_author,
        is_favorited: w.is_favorited,
        is_promoted: w.is_promoted,
        viewer_has_liked: false,
        details,
    })
}

pub fn decode_like_result(bytes: &[u8], function: &'static str) -> Result<LikeState, FeedError> {
    decode_single(bytes, function)
}

pub fn decode_save_result(bytes: &[u8], function: &'static str) -> Result<SaveState, FeedError> {
    decode_single(bytes, function)
}

// Toggle functions return one row, sometimes wrapped in an array.
fn decode_single<T: DeserializeOwned>(
    bytes: &[u8],
    function: &'static str,
) -> Result<T, FeedError> {
    let row = PayloadShape::classify(parse_json(bytes)?)?
        .into_first()
        .ok_or(FeedError::NotFound(function))?;
    serde_json::from_value(row).map_err(|e| FeedError::schema(None, e.to_string()))
}

fn parse_json(bytes: &[u8]) -> Result<Value, FeedError> {
    serde_json::from_slice(bytes).map_err(|e| FeedError::schema(None, format!("invalid JSON: {e}")))
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
