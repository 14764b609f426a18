use std::time::Duration;

use crate::device::location::Accuracy;

pub const DEFAULT_RECIPES_URL: &str = "http://www.croustipeze.com/ressources/recipesdata.json";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOCATION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOCATION_MAX_AGE_SECS: u64 = 600;
const DEFAULT_VISION_ITERATION: &str = "Iteration1";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub recipes_url: String,
    pub http_timeout: Duration,
    pub location_timeout: Duration,
    /// A cached device fix older than this is ignored and a fresh one requested.
    pub location_max_age: Duration,
    pub location_accuracy: Accuracy,
    pub vision: VisionConfig,
}

#[derive(Clone, Debug, Default)]
pub struct VisionConfig {
    pub endpoint: Option<String>,
    pub prediction_key: Option<String>,
    pub project_id: Option<String>,
    pub iteration: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recipes_url: DEFAULT_RECIPES_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            location_timeout: Duration::from_secs(DEFAULT_LOCATION_TIMEOUT_SECS),
            location_max_age: Duration::from_secs(DEFAULT_LOCATION_MAX_AGE_SECS),
            location_accuracy: Accuracy::Medium,
            vision: VisionConfig {
                iteration: DEFAULT_VISION_ITERATION.to_string(),
                ..VisionConfig::default()
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(url) = get("COOKBOOK_RECIPES_URL") {
            cfg.recipes_url = url;
        }
        if let Some(secs) = parse_secs(get("COOKBOOK_HTTP_TIMEOUT_SECS")) {
            cfg.http_timeout = secs;
        }
        if let Some(secs) = parse_secs(get("COOKBOOK_LOCATION_TIMEOUT_SECS")) {
            cfg.location_timeout = secs;
        }
        if let Some(secs) = parse_secs(get("COOKBOOK_LOCATION_MAX_AGE_SECS")) {
            cfg.location_max_age = secs;
        }
        if let Some(accuracy) = get("COOKBOOK_LOCATION_ACCURACY").as_deref().and_then(Accuracy::parse) {
            cfg.location_accuracy = accuracy;
        }
        cfg.vision.endpoint = get("COOKBOOK_VISION_ENDPOINT");
        cfg.vision.prediction_key = get("COOKBOOK_VISION_KEY");
        cfg.vision.project_id = get("COOKBOOK_VISION_PROJECT");
        if let Some(iteration) = get("COOKBOOK_VISION_ITERATION") {
            cfg.vision.iteration = iteration;
        }
        cfg
    }
}

fn parse_secs(raw: Option<String>) -> Option<Duration> {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).map(Duration::from_secs)
}
