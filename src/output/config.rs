use std::env;

use crate::telemetry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl OutputConfig {
    /// `--json` wins; otherwise COOKBOOK_OUTPUT_FORMAT picks, defaulting to text.
    pub fn from_env() -> Self {
        Self::resolve(telemetry::config::json_mode(), |key| env::var(key).ok())
    }

    fn resolve<F>(json_flag: bool, get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = match get("COOKBOOK_OUTPUT_FORMAT").as_deref() {
            _ if json_flag => OutputFormat::Json,
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Text,
        };
        let pretty = match get("COOKBOOK_OUTPUT_PRETTY").as_deref() {
            Some(v) if v.eq_ignore_ascii_case("1") || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes") => true,
            _ => false,
        };
        OutputConfig { format, pretty }
    }
}
