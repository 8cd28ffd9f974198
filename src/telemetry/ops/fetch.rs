use tracing::Span;
use tracing::{field, info_span};

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Fetch;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Request, Apply }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Request => "request",
        Phase::Apply => "apply",
    }}
    fn span(&self) -> Span { match self {
        Phase::Request => info_span!("request"),
        Phase::Apply => info_span!("apply"),
    }}
}

impl OpMarker for Fetch {
    const NAME: &'static str = "fetch";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("fetch", session = field::Empty) }
}
