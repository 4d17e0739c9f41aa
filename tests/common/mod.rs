//! In-memory registry with eventually consistent sync and delete

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use pkgpush::registry::{
    ChunkPart, ListRequest, Package, PackagePage, PackageRef, RegistryTransport, RepositoryRef,
    StatusReport, SyncStatus, UploadMethod, UploadRequest, UploadSession,
};
use pkgpush::upload::DigestUtils;
use pkgpush::{ClientConfig, PollConfig, RegistryError, Result};
use std::collections::HashMap;
use std::sync::Mutex;

pub const TEST_CHUNK_SIZE: u64 = 16;

pub fn test_config() -> ClientConfig {
    ClientConfig::new("http://registry.invalid", "test-key")
        .with_chunk_size(TEST_CHUNK_SIZE)
        .with_poll(PollConfig {
            interval_secs: 5,
            max_attempts: 10,
        })
}

pub fn repo() -> RepositoryRef {
    RepositoryRef::new("acme", "widgets").unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RequestUpload(UploadMethod),
    UploadFile,
    UploadChunk(ChunkPart),
    Complete,
    Abort,
    CreatePackage,
    List(u32),
    Status,
    Delete,
}

#[derive(Debug)]
struct PendingUpload {
    repository: RepositoryRef,
    request: UploadRequest,
    data: Vec<u8>,
    parts: Vec<Vec<u8>>,
    total_parts: Option<u32>,
    complete: bool,
}

#[derive(Debug)]
struct StoredPackage {
    repository: RepositoryRef,
    package: Package,
    content: Vec<u8>,
    status_queries: u32,
    /// Remaining status queries that still see the package after deletion
    deleted_lag: Option<u32>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u32,
    uploads: HashMap<String, PendingUpload>,
    packages: Vec<StoredPackage>,
    calls: Vec<Call>,
    status_failures: u32,
}

pub struct FakeRegistry {
    state: Mutex<State>,
    /// Status queries answered as not yet synchronized
    sync_after: u32,
    /// Status queries that still see a deleted package
    delete_lag: u32,
    fail_chunk: Option<u32>,
    fail_upload: bool,
    fail_complete: bool,
    /// Largest page the registry serves, whatever the client asks for
    page_cap: Option<u32>,
    report_page_total: bool,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            sync_after: 2,
            delete_lag: 2,
            fail_chunk: None,
            fail_upload: false,
            fail_complete: false,
            page_cap: None,
            report_page_total: true,
        }
    }

    pub fn with_sync_after(mut self, queries: u32) -> Self {
        self.sync_after = queries;
        self
    }

    pub fn with_delete_lag(mut self, queries: u32) -> Self {
        self.delete_lag = queries;
        self
    }

    pub fn failing_chunk(mut self, index: u32) -> Self {
        self.fail_chunk = Some(index);
        self
    }

    /// Single-request uploads are rejected
    pub fn failing_upload(mut self) -> Self {
        self.fail_upload = true;
        self
    }

    /// Chunked uploads are rejected at finalization
    pub fn failing_complete(mut self) -> Self {
        self.fail_complete = true;
        self
    }

    /// Serve at most `size` packages per page and omit the page total
    pub fn with_capped_pages(mut self, size: u32) -> Self {
        self.page_cap = Some(size);
        self.report_page_total = false;
        self
    }

    /// Next `count` status queries fail with a transport error
    pub fn fail_status_queries(&self, count: u32) {
        self.state.lock().unwrap().status_failures = count;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn chunk_parts(&self) -> Vec<ChunkPart> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::UploadChunk(part) => Some(part),
                _ => None,
            })
            .collect()
    }

    pub fn content_of(&self, slug: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state
            .packages
            .iter()
            .find(|p| p.package.slug == slug)
            .map(|p| p.content.clone())
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl RegistryTransport for FakeRegistry {
    async fn request_upload(
        &self,
        repository: &RepositoryRef,
        request: &UploadRequest,
    ) -> Result<UploadSession> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::RequestUpload(request.method));
        state.next_id += 1;
        let identifier = format!("file{}", state.next_id);
        state.uploads.insert(
            identifier.clone(),
            PendingUpload {
                repository: repository.clone(),
                request: request.clone(),
                data: Vec::new(),
                parts: Vec::new(),
                total_parts: None,
                complete: false,
            },
        );
        Ok(UploadSession {
            upload_url: format!("/uploads/{}/", identifier),
            upload_id: (request.method == UploadMethod::PutParts)
                .then(|| format!("{}-parts", identifier)),
            identifier,
        })
    }

    async fn upload_file(&self, session: &UploadSession, data: Vec<u8>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::UploadFile);
        if self.fail_upload {
            return Err(RegistryError::Http {
                status: 413,
                message: "File too large for file upload".to_string(),
            });
        }
        let upload = state
            .uploads
            .get_mut(&session.identifier)
            .ok_or_else(|| RegistryError::NotFound(session.identifier.clone()))?;
        upload.data = data;
        upload.complete = true;
        Ok(())
    }

    async fn upload_chunk(
        &self,
        session: &UploadSession,
        part: ChunkPart,
        data: Vec<u8>,
    ) -> Result<()> {
        self.record(Call::UploadChunk(part));
        if self.fail_chunk == Some(part.index) {
            return Err(RegistryError::Transport("connection reset by peer".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        let upload = state
            .uploads
            .get_mut(&session.identifier)
            .ok_or_else(|| RegistryError::NotFound(session.identifier.clone()))?;
        if part.index as usize != upload.parts.len() + 1 {
            return Err(RegistryError::Http {
                status: 400,
                message: format!("out of order chunk {}", part.index),
            });
        }
        upload.total_parts = Some(part.total);
        upload.parts.push(data);
        Ok(())
    }

    async fn complete_upload(
        &self,
        _repository: &RepositoryRef,
        session: &UploadSession,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Complete);
        if self.fail_complete {
            return Err(RegistryError::Http {
                status: 500,
                message: "Registry server error during upload completion".to_string(),
            });
        }
        let upload = state
            .uploads
            .get_mut(&session.identifier)
            .ok_or_else(|| RegistryError::NotFound(session.identifier.clone()))?;
        if upload.total_parts != Some(upload.parts.len() as u32) {
            return Err(RegistryError::Http {
                status: 400,
                message: "missing chunks".to_string(),
            });
        }
        upload.data = upload.parts.concat();
        upload.complete = true;
        Ok(())
    }

    async fn abort_upload(
        &self,
        _repository: &RepositoryRef,
        session: &UploadSession,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Abort);
        state.uploads.remove(&session.identifier);
        Ok(())
    }

    async fn create_raw_package(
        &self,
        repository: &RepositoryRef,
        file_identifier: &str,
    ) -> Result<Package> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreatePackage);
        let upload = state
            .uploads
            .remove(file_identifier)
            .ok_or_else(|| RegistryError::NotFound(file_identifier.to_string()))?;
        if !upload.complete || &upload.repository != repository {
            return Err(RegistryError::Http {
                status: 422,
                message: "file upload not complete".to_string(),
            });
        }
        if DigestUtils::compute_sha256(&upload.data) != upload.request.sha256_checksum {
            return Err(RegistryError::Http {
                status: 422,
                message: "checksum mismatch".to_string(),
            });
        }

        state.next_id += 1;
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let package = Package {
            slug: format!("pkg{}", state.next_id),
            filename: upload.request.filename.clone(),
            uploaded_at: Some(base + ChronoDuration::minutes(state.next_id as i64)),
            name: Some(upload.request.filename.clone()),
            version: None,
            format: Some("raw".to_string()),
            size: Some(upload.data.len() as u64),
            is_sync_completed: false,
            is_sync_failed: false,
            sync_progress: 0,
            status_str: Some("Awaiting Synchronisation".to_string()),
        };
        state.packages.push(StoredPackage {
            repository: repository.clone(),
            package: package.clone(),
            content: upload.data,
            status_queries: 0,
            deleted_lag: None,
        });
        Ok(package)
    }

    async fn list_packages(
        &self,
        repository: &RepositoryRef,
        request: &ListRequest,
    ) -> Result<PackagePage> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List(request.page));
        let visible: Vec<Package> = state
            .packages
            .iter()
            .filter(|p| &p.repository == repository && p.deleted_lag.is_none())
            .map(|p| p.package.clone())
            .collect();

        let page_size = match self.page_cap {
            Some(cap) => request.page_size.min(cap),
            None => request.page_size,
        }
        .max(1) as usize;
        let page_total = visible.len().div_ceil(page_size).max(1) as u32;
        let packages = visible
            .into_iter()
            .skip((request.page.saturating_sub(1)) as usize * page_size)
            .take(page_size)
            .collect();
        Ok(PackagePage {
            packages,
            page_total: self.report_page_total.then_some(page_total),
        })
    }

    async fn package_status(&self, package: &PackageRef) -> Result<StatusReport> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Status);
        if state.status_failures > 0 {
            state.status_failures -= 1;
            return Err(RegistryError::Transport("gateway timeout".to_string()));
        }

        let sync_after = self.sync_after;
        let stored = state
            .packages
            .iter_mut()
            .find(|p| p.repository == package.repository && p.package.slug == package.slug)
            .ok_or_else(|| RegistryError::NotFound(package.to_string()))?;

        if let Some(lag) = stored.deleted_lag.as_mut() {
            if *lag == 0 {
                return Err(RegistryError::NotFound(package.to_string()));
            }
            *lag -= 1;
            return Ok(StatusReport::with_status(SyncStatus::Synchronized));
        }

        stored.status_queries += 1;
        if stored.status_queries > sync_after {
            stored.package.is_sync_completed = true;
            stored.package.sync_progress = 100;
            Ok(StatusReport::with_status(SyncStatus::Synchronized))
        } else if stored.status_queries > 1 {
            Ok(StatusReport::with_status(SyncStatus::Synchronizing))
        } else {
            Ok(StatusReport::with_status(SyncStatus::Pending))
        }
    }

    async fn delete_package(&self, package: &PackageRef) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete);
        let lag = self.delete_lag;
        let stored = state
            .packages
            .iter_mut()
            .find(|p| {
                p.repository == package.repository
                    && p.package.slug == package.slug
                    && p.deleted_lag.is_none()
            })
            .ok_or_else(|| RegistryError::NotFound(package.to_string()))?;
        stored.deleted_lag = Some(lag);
        Ok(())
    }
}

/// Write `size` bytes of a repeating pattern to `dir/name`
pub fn write_file(dir: &std::path::Path, name: &str, size: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, data).unwrap();
    path
}
