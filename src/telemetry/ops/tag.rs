use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Tag;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Permission, Capture, Classify }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str {
        match self { Phase::Permission => "permission", Phase::Capture => "capture", Phase::Classify => "classify" }
    }
    fn span(&self) -> Span {
        match self {
            Phase::Permission => info_span!("permission"),
            Phase::Capture => info_span!("capture"),
            Phase::Classify => info_span!("classify"),
        }
    }
}

impl OpMarker for Tag {
    const NAME: &'static str = "tag";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("tag") }
}
