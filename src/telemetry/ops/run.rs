use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Run;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Tick }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Tick => "tick" } }
    fn span(&self) -> Span { match self { Phase::Tick => info_span!("tick") } }
}

impl OpMarker for Run {
    const NAME: &'static str = "run";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("run") }
}
