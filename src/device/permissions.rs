use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CookbookError;

use super::alerts::{accepted, Alert, AlertSurface};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission { Location, Camera }

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Location => "location",
            Permission::Camera => "camera",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PermissionStatus { Granted, Denied }

#[async_trait]
pub trait PermissionAuthority: Send + Sync {
    async fn check_status(&self, permission: Permission) -> Result<PermissionStatus, CookbookError>;
    async fn request(&self, permissions: &[Permission]) -> Result<HashMap<Permission, PermissionStatus>, CookbookError>;
    async fn open_settings(&self) -> Result<(), CookbookError>;
}

pub struct PermissionsManager {
    authority: Arc<dyn PermissionAuthority>,
    alerts: Arc<dyn AlertSurface>,
}

impl PermissionsManager {
    pub fn new(authority: Arc<dyn PermissionAuthority>, alerts: Arc<dyn AlertSurface>) -> Self {
        Self { authority, alerts }
    }

    /// Requests whatever is not granted yet; returns what stays refused.
    pub async fn ask_permissions(&self, permissions: &[Permission]) -> Vec<Permission> {
        match self.try_ask(permissions).await {
            Ok(refused) => refused,
            Err(err) => {
                // nothing was refused yet when the authority itself fails
                tracing::warn!(error = %err, "permission check failed");
                Vec::new()
            }
        }
    }

    async fn try_ask(&self, permissions: &[Permission]) -> Result<Vec<Permission>, CookbookError> {
        let mut needed = Vec::new();
        for &p in permissions {
            let status = self.authority.check_status(p).await?;
            if status != PermissionStatus::Granted {
                needed.push(p);
            }
        }
        if needed.is_empty() {
            return Ok(Vec::new());
        }

        let answers = self.authority.request(&needed).await?;
        // a permission missing from the answer map was not granted
        Ok(needed
            .into_iter()
            .filter(|p| answers.get(p) != Some(&PermissionStatus::Granted))
            .collect())
    }

    /// True when every permission is granted. Otherwise offers to open the
    /// system settings and returns false.
    pub async fn request_permissions(&self, permissions: &[Permission]) -> bool {
        let refused = self.ask_permissions(permissions).await;
        if refused.is_empty() {
            return true;
        }

        tracing::info!(refused = ?refused, "permissions refused");
        let choice = self
            .alerts
            .show_alert(Alert::yes_no(
                "Feature(s) unavailable",
                "Would you like to access the settings and give the required permissions to the app?",
            ))
            .await;
        if accepted(choice) {
            if let Err(e) = self.authority.open_settings().await {
                tracing::warn!(error = %e, "unable to open settings");
            }
        }
        false
    }
}

/// Grants everything except an explicit deny list; the CLI has no OS dialogs.
pub struct StaticPermissions {
    denied: HashSet<Permission>,
}

impl StaticPermissions {
    pub fn new(denied: impl IntoIterator<Item = Permission>) -> Self {
        Self { denied: denied.into_iter().collect() }
    }

    fn status(&self, p: Permission) -> PermissionStatus {
        if self.denied.contains(&p) { PermissionStatus::Denied } else { PermissionStatus::Granted }
    }
}

#[async_trait]
impl PermissionAuthority for StaticPermissions {
    async fn check_status(&self, permission: Permission) -> Result<PermissionStatus, CookbookError> {
        Ok(self.status(permission))
    }

    async fn request(&self, permissions: &[Permission]) -> Result<HashMap<Permission, PermissionStatus>, CookbookError> {
        Ok(permissions.iter().map(|&p| (p, self.status(p))).collect())
    }

    async fn open_settings(&self) -> Result<(), CookbookError> {
        tracing::info!("grant permissions by dropping --deny on the next run");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) use mock::MockPermissions;
