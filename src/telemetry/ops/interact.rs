use tracing::Span;
use tracing::{field, info_span};

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Interact;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Optimistic, Remote, Reconcile, Rollback, RecordView }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Optimistic => "optimistic",
        Phase::Remote => "remote",
        Phase::Reconcile => "reconcile",
        Phase::Rollback => "rollback",
        Phase::RecordView => "record_view",
    }}
    fn span(&self) -> Span { match self {
        Phase::Optimistic => info_span!("optimistic"),
        Phase::Remote => info_span!("remote"),
        Phase::Reconcile => info_span!("reconcile"),
        Phase::Rollback => info_span!("rollback"),
        Phase::RecordView => info_span!("record_view"),
    }}
}

impl OpMarker for Interact {
    const NAME: &'static str = "interact";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("interact", session = field::Empty) }
}
