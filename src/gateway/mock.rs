use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::FeedError;
use crate::model::{EntryKey, FeedEntry, LikeState, SaveState};

use super::FeedGateway;

#[derive(Clone, Debug, PartialEq)]
pub enum GatewayCall {
    FetchPage { profile_id: i64, limit: usize, offset: usize },
    ToggleLike { entry: EntryKey, profile_id: i64 },
    ToggleFavorite { entry: EntryKey, profile_id: i64 },
    RecordView { entry_id: i64 },
}

/// Handles for a scripted response that is held until released.
/// `entered` resolves once the call has reached the gateway.
pub struct Gate {
    pub entered: oneshot::Receiver<()>,
    pub release: oneshot::Sender<()>,
}

struct Scripted<T> {
    result: Result<T, FeedError>,
    gate: Option<(oneshot::Sender<()>, oneshot::Receiver<()>)>,
}

impl<T> Scripted<T> {
    async fn resolve(self) -> Result<T, FeedError> {
        if let Some((entered, release)) = self.gate {
            let _ = entered.send(());
            let _ = release.await;
        }
        self.result
    }
}

type Queue<T> = Mutex<VecDeque<Scripted<T>>>;

/// Queue-backed fake gateway. Each operation pops its own queue; an empty
/// queue answers `MockQueueEmpty` (views answer `Ok`).
#[derive(Default)]
pub struct MockGateway {
    pages: Queue<Vec<FeedEntry>>,
    likes: Queue<LikeState>,
    saves: Queue<SaveState>,
    views: Queue<()>,
    calls: Mutex<Vec<GatewayCall>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn push<T>(queue: &Queue<T>, result: Result<T, FeedError>) {
    lock(queue).push_back(Scripted { result, gate: None });
}

fn push_gated<T>(queue: &Queue<T>, result: Result<T, FeedError>) -> Gate {
    let (entered_tx, entered_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel();
    lock(queue).push_back(Scripted { result, gate: Some((entered_tx, release_rx)) });
    Gate { entered: entered_rx, release: release_tx }
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, resp: Result<Vec<FeedEntry>, FeedError>) {
        push(&self.pages, resp);
    }

    pub fn push_gated_page(&self, resp: Result<Vec<FeedEntry>, FeedError>) -> Gate {
        push_gated(&self.pages, resp)
    }

    pub fn push_like(&self, resp: Result<LikeState, FeedError>) {
        push(&self.likes, resp);
    }

    pub fn push_gated_like(&self, resp: Result<LikeState, FeedError>) -> Gate {
        push_gated(&self.likes, resp)
    }

    pub fn push_save(&self, resp: Result<SaveState, FeedError>) {
        push(&self.saves, resp);
    }

    pub fn push_gated_save(&self, resp: Result<SaveState, FeedError>) -> Gate {
        push_gated(&self.saves, resp)
    }

    pub fn push_view(&self, resp: Result<(), FeedError>) {
        push(&self.views, resp);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: GatewayCall) {
        lock(&self.calls).push(call);
    }
}

async fn next<T>(queue: &Queue<T>) -> Result<T, FeedError> {
    let scripted = lock(queue).pop_front();
    match scripted {
        Some(s) => s.resolve().await,
        None => Err(FeedError::MockQueueEmpty),
    }
}

#[async_trait]
impl FeedGateway for MockGateway {
    async fn fetch_page(
        &self,
        profile_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<FeedEntry>, FeedError> {
        self.record(GatewayCall::FetchPage { profile_id, limit, offset });
        next(&self.pages).await
    }

    async fn toggle_like(&self, entry: EntryKey, profile_id: i64) -> Result<LikeState, FeedError> {
        self.record(GatewayCall::ToggleLike { entry, profile_id });
        next(&self.likes).await
    }

    async fn toggle_favorite(
        &self,
        entry: EntryKey,
        profile_id: i64,
    ) -> Result<SaveState, FeedError> {
        self.record(GatewayCall::ToggleFavorite { entry, profile_id });
        next(&self.saves).await
    }

    async fn record_announcement_view(&self, entry_id: i64) -> Result<(), FeedError> {
        self.record(GatewayCall::RecordView { entry_id });
        let scripted = lock(&self.views).pop_front();
        match scripted {
            Some(s) => s.resolve().await,
            None => Ok(()),
        }
    }
}
