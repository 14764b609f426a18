use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use crate::error::CookbookError;

use super::model::{self, Recipe};

#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn fetch_recipes(&self) -> Result<Vec<Recipe>, CookbookError>;
}

/// Plain GET against a fixed URL, no auth, no caching.
#[derive(Clone)]
pub struct WebRecipeSource {
    http: HttpClient,
    url: String,
}

impl WebRecipeSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, CookbookError> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(CookbookError::from_reqwest)?;
        Ok(Self { http, url: url.into() })
    }
}

#[async_trait]
impl RecipeSource for WebRecipeSource {
    async fn fetch_recipes(&self) -> Result<Vec<Recipe>, CookbookError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(CookbookError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CookbookError::Http { status });
        }

        let body = response.bytes().await.map_err(CookbookError::from_reqwest)?;
        model::from_json(&body)
    }
}

#[cfg(test)]
pub(crate) use mock::MockRecipeSource;

#[cfg(test)]
mod mock {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use super::*;

    /// Queue-backed source. With `gated`, each fetch parks until `release()`.
    #[derive(Default)]
    pub struct MockRecipeSource {
        responses: Mutex<VecDeque<Result<Vec<Recipe>, CookbookError>>>,
        calls: AtomicUsize,
        gate: Option<Notify>,
        entered: Notify,
    }

    impl MockRecipeSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn gated() -> Self {
            Self { gate: Some(Notify::new()), ..Self::default() }
        }

        pub fn push_response(&self, resp: Result<Vec<Recipe>, CookbookError>) {
            self.responses.lock().unwrap().push_back(resp);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Resolves once a fetch is parked on the gate.
        pub async fn wait_entered(&self) {
            self.entered.notified().await
        }

        pub fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.notify_one();
            }
        }
    }

    #[async_trait]
    impl RecipeSource for MockRecipeSource {
        async fn fetch_recipes(&self) -> Result<Vec<Recipe>, CookbookError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                self.entered.notify_one();
                gate.notified().await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CookbookError::Timeout))
        }
    }
}
