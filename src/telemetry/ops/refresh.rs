use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Refresh;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Fetch, Publish }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Fetch => "fetch", Phase::Publish => "publish" } }
    fn span(&self) -> Span { match self { Phase::Fetch => info_span!("fetch"), Phase::Publish => info_span!("publish") } }
}

impl OpMarker for Refresh {
    const NAME: &'static str = "refresh";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("refresh") }
}
