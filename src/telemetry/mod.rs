pub mod config;
pub mod ctx;
pub mod ops;

use ctx::LogCtx;

pub fn refresh() -> LogCtx<ops::refresh::Refresh> { LogCtx::new(config::logs_are_json()) }
pub fn closest() -> LogCtx<ops::closest::Closest> { LogCtx::new(config::logs_are_json()) }
pub fn details() -> LogCtx<ops::details::Details> { LogCtx::new(config::logs_are_json()) }
pub fn tag() -> LogCtx<ops::tag::Tag> { LogCtx::new(config::logs_are_json()) }
