use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Status;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Load, Report }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Load => "load", Phase::Report => "report" } }
    fn span(&self) -> Span { match self { Phase::Load => info_span!("load"), Phase::Report => info_span!("report") } }
}

impl OpMarker for Status {
    const NAME: &'static str = "status";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("status") }
}
