use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::error::CookbookError;

pub mod custom_vision;

pub use custom_vision::CustomVisionClassifier;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prediction {
    pub tag: String,
    /// 0.0..=1.0
    pub probability: f64,
}

/// External image tagging; never implemented locally.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: Bytes) -> Result<Option<Prediction>, CookbookError>;
}

#[cfg(test)]
pub(crate) use mock::MockClassifier;

#[cfg(test)]
mod mock {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MockClassifier {
        pub answer: Option<Prediction>,
        pub fail: bool,
        seen: Mutex<Vec<Bytes>>,
    }

    impl MockClassifier {
        pub fn tagging(tag: &str, probability: f64) -> Self {
            Self { answer: Some(Prediction { tag: tag.into(), probability }), ..Self::default() }
        }

        pub fn seen(&self) -> Vec<Bytes> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Classifier for MockClassifier {
        async fn classify(&self, image: Bytes) -> Result<Option<Prediction>, CookbookError> {
            self.seen.lock().unwrap().push(image);
            if self.fail {
                return Err(CookbookError::Classifier("mock failure".into()));
            }
            Ok(self.answer.clone())
        }
    }
}
