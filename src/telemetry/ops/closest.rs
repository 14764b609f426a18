use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Closest;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Permission, Locate, Rank }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Permission => "permission",
        Phase::Locate => "locate",
        Phase::Rank => "rank",
    }}
    fn span(&self) -> Span { match self {
        Phase::Permission => info_span!("permission"),
        Phase::Locate => info_span!("locate"),
        Phase::Rank => info_span!("rank"),
    }}
}

impl OpMarker for Closest {
    const NAME: &'static str = "closest";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("closest") }
}
