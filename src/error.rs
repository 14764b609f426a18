use reqwest::StatusCode;

use crate::device::permissions::Permission;

#[derive(Debug)]
pub enum CookbookError {
    Network(reqwest::Error),
    Http { status: StatusCode },
    Timeout,
    Parse(serde_json::Error),
    LocationUnavailable(String),
    PermissionDenied(Vec<Permission>),
    MapsUnavailable(String),
    CameraUnavailable,
    Classifier(String),
    Config(String),
}

impl CookbookError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CookbookError::Timeout
        } else if let Some(status) = err.status() {
            CookbookError::Http { status }
        } else {
            CookbookError::Network(err)
        }
    }

    /// Transport-level failures; the controller never retries on its own,
    /// callers may.
    pub fn is_retryable(&self) -> bool {
        match self {
            CookbookError::Network(_) | CookbookError::Timeout => true,
            CookbookError::Http { status } => status.is_server_error(),
            CookbookError::Parse(_)
            | CookbookError::LocationUnavailable(_)
            | CookbookError::PermissionDenied(_)
            | CookbookError::MapsUnavailable(_)
            | CookbookError::CameraUnavailable
            | CookbookError::Classifier(_)
            | CookbookError::Config(_) => false,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(
            self,
            CookbookError::Network(_) | CookbookError::Http { .. } | CookbookError::Timeout
        )
    }
}

impl std::fmt::Display for CookbookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CookbookError::Network(err) => write!(f, "network error: {err}"),
            CookbookError::Http { status } => write!(f, "unexpected response status {status}"),
            CookbookError::Timeout => write!(f, "request timed out"),
            CookbookError::Parse(err) => write!(f, "invalid recipe data: {err}"),
            CookbookError::LocationUnavailable(reason) => {
                write!(f, "location unavailable: {reason}")
            }
            CookbookError::PermissionDenied(perms) => {
                let names: Vec<&str> = perms.iter().map(|p| p.as_str()).collect();
                write!(f, "permission denied: {}", names.join(", "))
            }
            CookbookError::MapsUnavailable(reason) => write!(f, "unable to open maps: {reason}"),
            CookbookError::CameraUnavailable => write!(f, "no camera detected"),
            CookbookError::Classifier(reason) => write!(f, "classification failed: {reason}"),
            CookbookError::Config(reason) => write!(f, "configuration error: {reason}"),
        }
    }
}

impl std::error::Error for CookbookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CookbookError::Network(err) => Some(err),
            CookbookError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CookbookError {
    fn from(err: serde_json::Error) -> Self {
        CookbookError::Parse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_display_and_retry() {
        let err = CookbookError::Http { status: StatusCode::SERVICE_UNAVAILABLE };
        assert_eq!(format!("{err}"), "unexpected response status 503 Service Unavailable");
        assert!(err.is_retryable());
        assert!(err.is_network());

        let err = CookbookError::Http { status: StatusCode::NOT_FOUND };
        assert!(!err.is_retryable());
    }

    #[test]
    fn permission_denied_lists_permissions() {
        let err = CookbookError::PermissionDenied(vec![Permission::Location, Permission::Camera]);
        assert_eq!(format!("{err}"), "permission denied: location, camera");
        assert!(!err.is_network());
    }

    #[test]
    fn parse_error_keeps_source() {
        let json_err = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let err = CookbookError::from(json_err);
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_retryable());
    }
}
