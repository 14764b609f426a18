use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CookbookError;
use crate::geo::Coordinates;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Accuracy { Lowest, Low, Medium, High, Best }

impl Accuracy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "lowest" => Some(Accuracy::Lowest),
            "low" => Some(Accuracy::Low),
            "medium" => Some(Accuracy::Medium),
            "high" => Some(Accuracy::High),
            "best" => Some(Accuracy::Best),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeolocationRequest {
    pub accuracy: Accuracy,
    pub timeout: Duration,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Location {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn last_known_location(&self) -> Result<Option<Location>, CookbookError>;
    /// May suspend for up to `request.timeout`.
    async fn current_location(&self, request: GeolocationRequest) -> Result<Location, CookbookError>;
}

/// Cached fix first, fresh fix otherwise.
#[derive(Clone, Debug)]
pub struct LocationResolver {
    pub max_age: Duration,
    pub timeout: Duration,
    pub accuracy: Accuracy,
}

impl LocationResolver {
    pub fn new(max_age: Duration, timeout: Duration) -> Self {
        Self { max_age, timeout, accuracy: Accuracy::Medium }
    }

    pub fn with_accuracy(mut self, accuracy: Accuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn is_fresh(&self, loc: &Location, now: DateTime<Utc>) -> bool {
        match (now - loc.timestamp).to_std() {
            Ok(age) => age <= self.max_age,
            // timestamp ahead of our clock
            Err(_) => true,
        }
    }

    pub async fn resolve(&self, provider: &dyn LocationProvider) -> Result<Location, CookbookError> {
        if let Some(cached) = provider.last_known_location().await? {
            if self.is_fresh(&cached, Utc::now()) {
                tracing::debug!(age_limit_s = self.max_age.as_secs(), "using cached location");
                return Ok(cached);
            }
            tracing::debug!(timestamp = %cached.timestamp, "cached location is stale");
        }

        let request = GeolocationRequest { accuracy: self.accuracy, timeout: self.timeout };
        match tokio::time::timeout(self.timeout, provider.current_location(request)).await {
            Ok(fix) => fix,
            Err(_) => Err(CookbookError::LocationUnavailable(format!(
                "no fix within {}s",
                self.timeout.as_secs_f64()
            ))),
        }
    }
}

/// Device stand-in for the CLI: a fixed position, or nothing at all.
pub struct FixedLocationProvider {
    position: Option<Coordinates>,
}

impl FixedLocationProvider {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn last_known_location(&self) -> Result<Option<Location>, CookbookError> {
        Ok(None)
    }

    async fn current_location(&self, _request: GeolocationRequest) -> Result<Location, CookbookError> {
        match self.position {
            Some(c) => Ok(Location { latitude: c.latitude, longitude: c.longitude, accuracy_m: None, timestamp: Utc::now() }),
            None => Err(CookbookError::LocationUnavailable("no position configured (use --lat/--lon)".into())),
        }
    }
}

#[cfg(test)]
pub(crate) use mock::MockLocationProvider;
