//! Feed session engine: owns the in-memory feed and its loading flags and
//! coordinates every gateway round trip against them.
//!
//! All state sits behind one mutex that is never held across an `.await`;
//! gateway calls are the only suspension points.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::FeedError;
use crate::gateway::{FeedGateway, TimeoutGateway};
use crate::telemetry;
use crate::telemetry::ops::fetch::Phase as FetchPhase;

mod interact;
pub mod pagination;
mod state;

pub use interact::ToggleOutcome;
pub use state::FeedSnapshot;

use state::FeedState;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A guard refused to start the load; nothing was fetched.
    Skipped,
    Applied { added: usize },
    /// The page arrived after a newer replacing load and was dropped.
    Discarded,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum LoadKind {
    Initial,
    More,
    Refresh,
}

impl LoadKind {
    fn as_str(&self) -> &'static str {
        match self {
            LoadKind::Initial => "load_initial",
            LoadKind::More => "load_more",
            LoadKind::Refresh => "refresh",
        }
    }

    fn replaces(&self) -> bool {
        !matches!(self, LoadKind::More)
    }
}

struct Ticket {
    limit: usize,
    offset: usize,
    seq: u64,
}

pub struct FeedEngine {
    gateway: Arc<dyn FeedGateway>,
    state: Mutex<FeedState>,
    updates: watch::Sender<FeedSnapshot>,
    session: Uuid,
}

impl FeedEngine {
    pub fn new(gateway: Arc<dyn FeedGateway>, cfg: EngineConfig) -> Self {
        let gateway: Arc<dyn FeedGateway> = match cfg.request_timeout {
            Some(limit) => Arc::new(TimeoutGateway::new(gateway, limit)),
            None => gateway,
        };
        let state = FeedState::new(cfg.page_size);
        let (updates, _) = watch::channel(state.snapshot());
        Self { gateway, state: Mutex::new(state), updates, session: Uuid::new_v4() }
    }

    pub fn session_id(&self) -> Uuid {
        self.session
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.state().snapshot()
    }

    /// Receives a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.updates.subscribe()
    }

    pub fn dismiss_error(&self) {
        let mut st = self.state();
        if st.last_error.take().is_some() {
            self.commit(&st);
        }
    }

    pub async fn load_initial(&self, profile_id: i64) -> Result<FetchOutcome, FeedError> {
        self.load(LoadKind::Initial, profile_id).await
    }

    pub async fn load_more(&self, profile_id: i64) -> Result<FetchOutcome, FeedError> {
        self.load(LoadKind::More, profile_id).await
    }

    pub async fn refresh(&self, profile_id: i64) -> Result<FetchOutcome, FeedError> {
        self.load(LoadKind::Refresh, profile_id).await
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit(&self, st: &FeedState) {
        self.updates.send_replace(st.snapshot());
    }

    async fn load(&self, kind: LoadKind, profile_id: i64) -> Result<FetchOutcome, FeedError> {
        let root = telemetry::fetch().root_span_kv(
            self.session,
            [("action", kind.as_str().to_string()), ("profile", profile_id.to_string())],
        );
        self.run_load(kind, profile_id).instrument(root).await
    }

    async fn run_load(&self, kind: LoadKind, profile_id: i64) -> Result<FetchOutcome, FeedError> {
        let log = telemetry::fetch();

        let (ticket, flag) = {
            let mut st = self.state();
            match begin(&mut st, kind) {
                Some(t) => {
                    self.commit(&st);
                    (t, LoadFlag { engine: self, kind, armed: true })
                }
                None => {
                    log.debug_kv("skipped", [("action", kind.as_str().to_string())]);
                    return Ok(FetchOutcome::Skipped);
                }
            }
        };

        let result = self
            .gateway
            .fetch_page(profile_id, ticket.limit, ticket.offset)
            .instrument(log.span(&FetchPhase::Request))
            .await;

        let _apply = log.span(&FetchPhase::Apply).entered();
        let mut st = self.state();
        flag.release(&mut st);

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                // feed stays as it was; only the flag and the error change
                st.last_error = Some(err.to_string());
                self.commit(&st);
                log.warn_kv(
                    "fetch failed",
                    [("action", kind.as_str().to_string()), ("error", err.to_string())],
                );
                return Err(err);
            }
        };

        let fetched = page.len();
        let fresh = if kind.replaces() {
            ticket.seq > st.landed
        } else {
            ticket.seq == st.landed
        };
        if !fresh {
            self.commit(&st);
            log.debug_kv(
                "stale page dropped",
                [("action", kind.as_str().to_string()), ("fetched", fetched.to_string())],
            );
            return Ok(FetchOutcome::Discarded);
        }

        let state = &mut *st;
        let added = if kind.replaces() {
            state.pager.replace(&mut state.entries, page);
            state.landed = ticket.seq;
            state.entries.len()
        } else {
            state.pager.merge(&mut state.entries, page)
        };

        self.commit(&st);
        log.page_summary(kind.as_str(), fetched, added, st.entries.len(), st.pager.has_more());
        Ok(FetchOutcome::Applied { added })
    }
}

/// Clears the load's flag when the load finishes or its future is dropped.
struct LoadFlag<'a> {
    engine: &'a FeedEngine,
    kind: LoadKind,
    armed: bool,
}

impl LoadFlag<'_> {
    fn release(mut self, st: &mut FeedState) {
        self.armed = false;
        clear_flag(st, self.kind);
    }
}

impl Drop for LoadFlag<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut st = self.engine.state();
        clear_flag(&mut st, self.kind);
        self.engine.commit(&st);
        telemetry::fetch().debug_kv("load cancelled", [("action", self.kind.as_str().to_string())]);
    }
}

fn clear_flag(st: &mut FeedState, kind: LoadKind) {
    match kind {
        LoadKind::Initial => st.loading_initial = false,
        LoadKind::More => st.loading_more = false,
        LoadKind::Refresh => st.refreshing = false,
    }
}

// Guards for each load kind; on success the matching flag is raised.
fn begin(st: &mut FeedState, kind: LoadKind) -> Option<Ticket> {
    let limit = st.pager.page_size();
    let ticket = match kind {
        LoadKind::Initial | LoadKind::Refresh => {
            let busy = if kind == LoadKind::Initial {
                &mut st.loading_initial
            } else {
                &mut st.refreshing
            };
            if *busy {
                return None;
            }
            *busy = true;
            st.issued += 1;
            Ticket { limit, offset: 0, seq: st.issued }
        }
        LoadKind::More => {
            if st.loading_initial || st.loading_more || st.refreshing || !st.pager.has_more() {
                return None;
            }
            st.loading_more = true;
            Ticket { limit, offset: st.pager.next_offset(&st.entries), seq: st.landed }
        }
    };
    st.last_error = None;
    Some(ticket)
}
