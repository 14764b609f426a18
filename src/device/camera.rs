use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::CookbookError;

#[async_trait]
pub trait Camera: Send + Sync {
    fn is_available(&self) -> bool;
    async fn take_photo(&self) -> Result<Bytes, CookbookError>;
}

/// "Takes" a photo by reading an image file.
pub struct FileCamera {
    pub path: Option<PathBuf>,
}

#[async_trait]
impl Camera for FileCamera {
    fn is_available(&self) -> bool {
        self.path.as_ref().is_some_and(|p| p.is_file())
    }

    async fn take_photo(&self) -> Result<Bytes, CookbookError> {
        let path = self.path.as_ref().ok_or(CookbookError::CameraUnavailable)?;
        let data = tokio::fs::read(path).await.map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "unable to read image");
            CookbookError::CameraUnavailable
        })?;
        Ok(Bytes::from(data))
    }
}

#[cfg(test)]
pub(crate) use mock::MockCamera;
