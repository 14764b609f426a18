use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Details;

#[derive(Copy, Clone, Debug)]
pub enum Phase { OpenMap }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::OpenMap => "open_map" } }
    fn span(&self) -> Span { match self { Phase::OpenMap => info_span!("open_map") } }
}

impl OpMarker for Details {
    const NAME: &'static str = "details";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("details") }
}
