use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::config::VisionConfig;
use crate::error::CookbookError;

use super::{Classifier, Prediction};

const PREDICTION_KEY_HEADER: &str = "Prediction-Key";

/// Image classification against a published Custom Vision iteration.
#[derive(Clone)]
pub struct CustomVisionClassifier {
    http: HttpClient,
    endpoint: String,
    prediction_key: String,
    project_id: String,
    iteration: String,
}

impl CustomVisionClassifier {
    pub fn from_config(cfg: &VisionConfig, timeout: Duration) -> Result<Self, CookbookError> {
        let missing = |name: &str| CookbookError::Config(format!("{name} is not set"));
        let endpoint = cfg.endpoint.clone().ok_or_else(|| missing("COOKBOOK_VISION_ENDPOINT"))?;
        let prediction_key = cfg.prediction_key.clone().ok_or_else(|| missing("COOKBOOK_VISION_KEY"))?;
        let project_id = cfg.project_id.clone().ok_or_else(|| missing("COOKBOOK_VISION_PROJECT"))?;
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(CookbookError::from_reqwest)?;
        Ok(Self { http, endpoint, prediction_key, project_id, iteration: cfg.iteration.clone() })
    }

    fn url(&self) -> String {
        format!(
            "{}/customvision/v3.0/Prediction/{}/classify/iterations/{}/image",
            self.endpoint.trim_end_matches('/'),
            self.project_id,
            self.iteration
        )
    }
}

#[async_trait]
impl Classifier for CustomVisionClassifier {
    async fn classify(&self, image: Bytes) -> Result<Option<Prediction>, CookbookError> {
        let response = self
            .http
            .post(self.url())
            .header(PREDICTION_KEY_HEADER, &self.prediction_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await
            .map_err(CookbookError::from_reqwest)?;

        let status = response.status();
        let body = response.bytes().await.map_err(CookbookError::from_reqwest)?;
        if !status.is_success() {
            let detail = serde_json::from_slice::<ApiError>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(CookbookError::Classifier(detail));
        }

        let parsed: ApiPredictionResult =
            serde_json::from_slice(&body).map_err(|e| CookbookError::Classifier(e.to_string()))?;
        Ok(best_prediction(parsed.predictions))
    }
}

fn best_prediction(predictions: Vec<ApiPrediction>) -> Option<Prediction> {
    predictions
        .into_iter()
        .fold(None::<ApiPrediction>, |best, p| match best {
            Some(b) if b.probability >= p.probability => Some(b),
            _ => Some(p),
        })
        .map(|p| Prediction { tag: p.tag_name, probability: p.probability })
}

#[derive(Debug, Deserialize)]
struct ApiPredictionResult {
    #[serde(default)]
    predictions: Vec<ApiPrediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPrediction {
    tag_name: String,
    probability: f64,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}
