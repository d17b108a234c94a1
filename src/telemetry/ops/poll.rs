use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Poll;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Plan, Load, Prune, Backlog, Feed, Fetch, Submit, Persist }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Plan => "plan",
        Phase::Load => "load",
        Phase::Prune => "prune",
        Phase::Backlog => "backlog",
        Phase::Feed => "feed",
        Phase::Fetch => "fetch",
        Phase::Submit => "submit",
        Phase::Persist => "persist",
    }}
    fn span(&self) -> Span { match self {
        Phase::Plan => info_span!("plan"),
        Phase::Load => info_span!("load"),
        Phase::Prune => info_span!("prune"),
        Phase::Backlog => info_span!("backlog"),
        Phase::Feed => info_span!("feed"),
        Phase::Fetch => info_span!("fetch"),
        Phase::Submit => info_span!("submit"),
        Phase::Persist => info_span!("persist"),
    }}
}

impl OpMarker for Poll {
    const NAME: &'static str = "poll";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("poll") }
}
