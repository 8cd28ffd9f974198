use tracing::Instrument;

use crate::error::FeedError;
use crate::model::{EntryKey, EntryKind, FeedEntry, LikeState, SaveState};
use crate::telemetry;
use crate::telemetry::ops::interact::Phase as InteractPhase;

use super::FeedEngine;
use super::state::{FeedState, Interaction};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The entry is not in the feed (e.g. dropped by a refresh).
    Skipped,
    /// A toggle of the same kind on this entry is still awaiting the server.
    InFlight,
    /// Server state has been applied to the entry.
    Reconciled,
}

/// Values an optimistic flip replaced.
#[derive(Copy, Clone, Debug)]
enum Prior {
    Like { liked: bool, count: Option<i64> },
    Save { saved: bool },
}

impl Prior {
    fn flip(interaction: Interaction, entry: &mut FeedEntry) -> Self {
        match interaction {
            Interaction::Like => {
                let prior = Prior::Like { liked: entry.viewer_has_liked, count: entry.like_count };
                entry.viewer_has_liked = !entry.viewer_has_liked;
                entry.like_count = Some(adjust(entry.like_count, entry.viewer_has_liked));
                prior
            }
            Interaction::Save => {
                let prior = Prior::Save { saved: entry.is_favorited };
                entry.is_favorited = !entry.is_favorited;
                prior
            }
        }
    }

    fn restore(self, entry: &mut FeedEntry) {
        match self {
            Prior::Like { liked, count } => {
                entry.viewer_has_liked = liked;
                entry.like_count = count;
            }
            Prior::Save { saved } => entry.is_favorited = saved,
        }
    }
}

enum Server {
    Like(LikeState),
    Save(SaveState),
}

impl Server {
    fn apply(self, entry: &mut FeedEntry) {
        match self {
            // server wins, even over a differing guess
            Server::Like(s) => {
                entry.viewer_has_liked = s.liked_now;
                entry.like_count = Some(s.total_likes);
            }
            Server::Save(s) => entry.is_favorited = s.saved_now,
        }
    }
}

fn adjust(count: Option<i64>, liked: bool) -> i64 {
    let n = count.unwrap_or(0);
    if liked { n + 1 } else { (n - 1).max(0) }
}

/// Holds the `(entry, interaction)` slot while the remote call runs. If the
/// call is dropped before it resolves, the slot is released and the flip is
/// undone.
struct PendingToggle<'a> {
    engine: &'a FeedEngine,
    key: EntryKey,
    interaction: Interaction,
    prior: Prior,
    landed: u64,
    armed: bool,
}

impl PendingToggle<'_> {
    fn settle(mut self, st: &mut FeedState) -> (Prior, u64) {
        self.armed = false;
        st.pending.remove(&(self.key, self.interaction));
        (self.prior, self.landed)
    }
}

impl Drop for PendingToggle<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut st = self.engine.state();
        st.pending.remove(&(self.key, self.interaction));
        rollback(&mut st, self.key, self.prior, self.landed);
        self.engine.commit(&st);
        telemetry::interact().debug_kv("toggle cancelled", [("entry", self.key.to_string())]);
    }
}

// A replacing load that landed meanwhile is newer truth than `prior`.
fn rollback(st: &mut FeedState, key: EntryKey, prior: Prior, landed: u64) {
    if st.landed != landed {
        return;
    }
    if let Some(entry) = st.entry_mut(key) {
        prior.restore(entry);
    }
}

impl FeedEngine {
    /// Flip the viewer's like immediately, then settle on the server's
    /// `(liked_now, total_likes)`. A failed call restores the prior pair.
    pub async fn toggle_like(
        &self,
        key: EntryKey,
        profile_id: i64,
    ) -> Result<ToggleOutcome, FeedError> {
        let root = telemetry::interact().root_span_kv(
            self.session,
            [("action", "like".to_string()), ("entry", key.to_string())],
        );
        self.run_toggle(key, profile_id, Interaction::Like).instrument(root).await
    }

    /// Same shape as [`toggle_like`](Self::toggle_like) for the saved flag.
    pub async fn toggle_save(
        &self,
        key: EntryKey,
        profile_id: i64,
    ) -> Result<ToggleOutcome, FeedError> {
        let root = telemetry::interact().root_span_kv(
            self.session,
            [("action", "save".to_string()), ("entry", key.to_string())],
        );
        self.run_toggle(key, profile_id, Interaction::Save).instrument(root).await
    }

    /// Records one view per announcement per session. The local counter is
    /// cosmetic and failures are only logged.
    pub async fn mark_announcement_viewed(&self, key: EntryKey) {
        if key.kind != EntryKind::Announcement {
            return;
        }
        let log = telemetry::interact();
        {
            let mut st = self.state();
            if st.viewed.contains(&key) {
                return;
            }
            let Some(details) = st.entry_mut(key).and_then(|e| e.announcement_mut()) else {
                return;
            };
            details.view_count = Some(details.view_count.unwrap_or(0) + 1);
            st.viewed.insert(key);
            self.commit(&st);
        }

        let result = self
            .gateway
            .record_announcement_view(key.id)
            .instrument(log.span(&InteractPhase::RecordView))
            .await;
        if let Err(err) = result {
            log.warn_kv(
                "view not recorded",
                [("entry", key.to_string()), ("error", err.to_string())],
            );
        }
    }

    async fn run_toggle(
        &self,
        key: EntryKey,
        profile_id: i64,
        interaction: Interaction,
    ) -> Result<ToggleOutcome, FeedError> {
        let log = telemetry::interact();
        let action = match interaction {
            Interaction::Like => "like",
            Interaction::Save => "save",
        };

        let pending = {
            let mut st = self.state();
            if st.pending.contains(&(key, interaction)) {
                log.debug_kv("toggle in flight", [("entry", key.to_string())]);
                return Ok(ToggleOutcome::InFlight);
            }
            let landed = st.landed;
            let Some(entry) = st.entry_mut(key) else {
                return Ok(ToggleOutcome::Skipped);
            };
            let _s = log.span(&InteractPhase::Optimistic).entered();
            let prior = Prior::flip(interaction, entry);
            st.pending.insert((key, interaction));
            self.commit(&st);
            PendingToggle { engine: self, key, interaction, prior, landed, armed: true }
        };

        let remote = async {
            match interaction {
                Interaction::Like => {
                    self.gateway.toggle_like(key, profile_id).await.map(Server::Like)
                }
                Interaction::Save => {
                    self.gateway.toggle_favorite(key, profile_id).await.map(Server::Save)
                }
            }
        };
        let result = remote.instrument(log.span(&InteractPhase::Remote)).await;

        let mut st = self.state();
        let (prior, landed) = pending.settle(&mut st);
        match result {
            Ok(server) => {
                let _s = log.span(&InteractPhase::Reconcile).entered();
                if let Some(entry) = st.entry_mut(key) {
                    server.apply(entry);
                }
                self.commit(&st);
                Ok(ToggleOutcome::Reconciled)
            }
            Err(err) => {
                let _s = log.span(&InteractPhase::Rollback).entered();
                rollback(&mut st, key, prior, landed);
                st.last_error = Some(err.to_string());
                self.commit(&st);
                log.rolled_back(action, key, &err.to_string());
                Err(err)
            }
        }
    }
}
