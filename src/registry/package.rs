//! Package and namespace types shared by the uploader, poller and listing

use crate::error::handlers::ValidationErrorHandler;
use crate::error::{RegistryError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `organization/repository`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    pub organization: String,
    pub repository: String,
}

impl RepositoryRef {
    pub fn new(organization: impl Into<String>, repository: impl Into<String>) -> Result<Self> {
        let organization = organization.into();
        let repository = repository.into();
        ValidationErrorHandler::validate_slug("Organization", &organization)?;
        ValidationErrorHandler::validate_slug("Repository", &repository)?;
        Ok(Self {
            organization,
            repository,
        })
    }

    pub fn package(&self, slug: impl Into<String>) -> Result<PackageRef> {
        let slug = slug.into();
        ValidationErrorHandler::validate_slug("Package slug", &slug)?;
        Ok(PackageRef {
            repository: self.clone(),
            slug,
        })
    }
}

impl FromStr for RepositoryRef {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim_matches('/').split('/').collect::<Vec<_>>().as_slice() {
            [org, repo] => RepositoryRef::new(*org, *repo),
            _ => Err(RegistryError::Validation(format!(
                "Expected OWNER/REPO, got '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.repository)
    }
}

/// `organization/repository/slug`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRef {
    pub repository: RepositoryRef,
    pub slug: String,
}

impl FromStr for PackageRef {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim_matches('/').split('/').collect::<Vec<_>>().as_slice() {
            [org, repo, slug] => RepositoryRef::new(*org, *repo)?.package(*slug),
            _ => Err(RegistryError::Validation(format!(
                "Expected OWNER/REPO/PACKAGE, got '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.repository, self.slug)
    }
}

/// Server-side synchronization state of a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Pending,
    Synchronizing,
    Synchronized,
    Failed,
}

impl SyncStatus {
    /// Label used in human-readable status output
    pub fn label(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "Awaiting Synchronisation",
            SyncStatus::Synchronizing => "Synchronising",
            SyncStatus::Synchronized => "Fully Synchronised",
            SyncStatus::Failed => "Sync Failed",
        }
    }

    fn from_flags(completed: bool, failed: bool, progress: u32) -> Self {
        if completed {
            SyncStatus::Synchronized
        } else if failed {
            SyncStatus::Failed
        } else if progress > 0 {
            SyncStatus::Synchronizing
        } else {
            SyncStatus::Pending
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Package record as returned by the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub slug: String,
    pub filename: String,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub is_sync_completed: bool,
    #[serde(default)]
    pub is_sync_failed: bool,
    #[serde(default)]
    pub sync_progress: u32,
    #[serde(default)]
    pub status_str: Option<String>,
}

impl Package {
    pub fn sync_status(&self) -> SyncStatus {
        SyncStatus::from_flags(self.is_sync_completed, self.is_sync_failed, self.sync_progress)
    }
}

/// Response of the package status endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(default)]
    pub is_sync_completed: bool,
    #[serde(default)]
    pub is_sync_failed: bool,
    #[serde(default)]
    pub sync_progress: u32,
    #[serde(default)]
    pub status_str: Option<String>,
    #[serde(default)]
    pub stage_str: Option<String>,
    #[serde(default)]
    pub status_reason: Option<String>,
}

impl StatusReport {
    pub fn sync_status(&self) -> SyncStatus {
        SyncStatus::from_flags(self.is_sync_completed, self.is_sync_failed, self.sync_progress)
    }

    pub fn with_status(status: SyncStatus) -> Self {
        Self {
            is_sync_completed: status == SyncStatus::Synchronized,
            is_sync_failed: status == SyncStatus::Failed,
            sync_progress: match status {
                SyncStatus::Synchronized => 100,
                SyncStatus::Synchronizing => 50,
                _ => 0,
            },
            status_str: Some(status.label().to_string()),
            stage_str: None,
            status_reason: None,
        }
    }
}
