use std::collections::HashSet;

use serde::Serialize;

use crate::model::{EntryKey, FeedEntry};

use super::pagination::Paginator;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Interaction {
    Like,
    Save,
}

/// Mutable engine state. Only touched while the engine's mutex is held.
#[derive(Debug)]
pub(crate) struct FeedState {
    pub entries: Vec<FeedEntry>,
    pub pager: Paginator,
    pub loading_initial: bool,
    pub loading_more: bool,
    pub refreshing: bool,
    pub last_error: Option<String>,
    // sequence of the last replacing load started / applied; appends and
    // rollbacks remember `landed` and are dropped once it has moved
    pub issued: u64,
    pub landed: u64,
    pub pending: HashSet<(EntryKey, Interaction)>,
    pub viewed: HashSet<EntryKey>,
}

impl FeedState {
    pub fn new(page_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            pager: Paginator::new(page_size),
            loading_initial: false,
            loading_more: false,
            refreshing: false,
            last_error: None,
            issued: 0,
            landed: 0,
            pending: HashSet::new(),
            viewed: HashSet::new(),
        }
    }

    pub fn entry_mut(&mut self, key: EntryKey) -> Option<&mut FeedEntry> {
        self.entries.iter_mut().find(|e| e.key() == key)
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            entries: self.entries.clone(),
            is_loading_initial: self.loading_initial,
            is_loading_more: self.loading_more,
            is_refreshing: self.refreshing,
            has_more: self.pager.has_more(),
            last_error: self.last_error.clone(),
        }
    }
}

/// What the UI observes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedSnapshot {
    pub entries: Vec<FeedEntry>,
    pub is_loading_initial: bool,
    pub is_loading_more: bool,
    pub is_refreshing: bool,
    pub has_more: bool,
    pub last_error: Option<String>,
}

impl FeedSnapshot {
    pub fn is_idle(&self) -> bool {
        !(self.is_loading_initial || self.is_loading_more || self.is_refreshing)
    }

    pub fn entry(&self, key: EntryKey) -> Option<&FeedEntry> {
        self.entries.iter().find(|e| e.key() == key)
    }
}
