//! Transport API for the package registry
//!
//! The uploader, poller and listing only talk to the registry through
//! [`RegistryTransport`]. [`crate::registry::RegistryClient`] implements it over HTTP.

use crate::error::Result;
use crate::registry::package::{Package, PackageRef, RepositoryRef, StatusReport};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Package registry operations
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    /// Reserve a file upload and learn where to send the bytes
    async fn request_upload(
        &self,
        repository: &RepositoryRef,
        request: &UploadRequest,
    ) -> Result<UploadSession>;

    /// Send the whole file in one request
    async fn upload_file(&self, session: &UploadSession, data: Vec<u8>) -> Result<()>;

    /// Send one chunk of a chunked upload
    async fn upload_chunk(
        &self,
        session: &UploadSession,
        part: ChunkPart,
        data: Vec<u8>,
    ) -> Result<()>;

    /// Finalize a chunked upload once every chunk was acknowledged
    async fn complete_upload(
        &self,
        repository: &RepositoryRef,
        session: &UploadSession,
    ) -> Result<()>;

    /// Discard a chunked upload that will never be completed
    async fn abort_upload(&self, repository: &RepositoryRef, session: &UploadSession)
    -> Result<()>;

    /// Create a raw package from an uploaded file
    async fn create_raw_package(
        &self,
        repository: &RepositoryRef,
        file_identifier: &str,
    ) -> Result<Package>;

    /// Fetch one page of the repository's packages
    async fn list_packages(
        &self,
        repository: &RepositoryRef,
        request: &ListRequest,
    ) -> Result<PackagePage>;

    /// Current synchronization status; a missing package is `RegistryError::NotFound`
    async fn package_status(&self, package: &PackageRef) -> Result<StatusReport>;

    async fn delete_package(&self, package: &PackageRef) -> Result<()>;
}

/// How the file bytes will be transferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadMethod {
    /// Single request carrying the whole file
    Post,
    /// Ordered chunks followed by a completion call
    PutParts,
}

/// File upload reservation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadRequest {
    pub filename: String,
    pub sha256_checksum: String,
    pub size: u64,
    pub method: UploadMethod,
}

/// Registry's answer to an [`UploadRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadSession {
    pub identifier: String,
    pub upload_url: String,
    #[serde(default)]
    pub upload_id: Option<String>,
}

/// Position of a chunk within a chunked upload (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPart {
    pub index: u32,
    pub total: u32,
}

/// Package listing page parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub page: u32,
    pub page_size: u32,
    /// Sort expression forwarded as-is, e.g. `-date`
    pub sort: Option<String>,
}

impl Default for ListRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 100,
            sort: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackagePage {
    pub packages: Vec<Package>,
    /// Total number of pages if the registry reported it
    pub page_total: Option<u32>,
}
