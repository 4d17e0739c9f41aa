//! Package upload: file transfer followed by raw package creation

use crate::config::ClientConfig;
use crate::error::handlers::ValidationErrorHandler;
use crate::error::{RegistryError, Result};
use crate::logging::Logger;
use crate::registry::{Package, RegistryTransport, RepositoryRef, UploadRequest};
use crate::upload::chunked::ChunkedUploader;
use crate::upload::digest::DigestUtils;
use crate::upload::strategy::Transfer;
use std::path::Path;
use std::time::Instant;

pub struct Uploader<'a> {
    transport: &'a dyn RegistryTransport,
    chunk_size: u64,
    output: Logger,
}

impl<'a> Uploader<'a> {
    pub fn new(transport: &'a dyn RegistryTransport, config: &ClientConfig, output: Logger) -> Self {
        Self {
            transport,
            chunk_size: config.chunk_size,
            output,
        }
    }

    /// Upload `path` and create a raw package for it in `repository`.
    ///
    /// The package is created only after the file transfer fully succeeded, so a
    /// failed upload never shows up in listings. Nothing is retried.
    pub async fn push_raw(&self, repository: &RepositoryRef, path: &Path) -> Result<Package> {
        ValidationErrorHandler::validate_file_path(path)?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                RegistryError::Validation(format!(
                    "File name is not valid UTF-8: {}",
                    path.display()
                ))
            })?
            .to_string();

        let size = tokio::fs::metadata(path).await?.len();
        let transfer = Transfer::plan(size, self.chunk_size);

        self.output.step(&format!(
            "Uploading {} ({}) to {} using {} transfer",
            filename,
            self.output.format_size(size),
            repository,
            transfer.name()
        ));

        let start_time = Instant::now();
        let package = self
            .upload(repository, path, &filename, size, &transfer)
            .await
            .map_err(|e| RegistryError::upload_failed(&filename, e))?;

        let elapsed = start_time.elapsed();
        self.output.success(&format!(
            "Created package {} ({}) in {}",
            package.slug,
            package.filename,
            self.output.format_duration(elapsed)
        ));
        self.output.summary_kv(
            "Upload Summary",
            &[
                ("Package", format!("{}/{}", repository, package.slug)),
                ("Filename", package.filename.clone()),
                ("Size", self.output.format_size(size)),
                ("Transfer", format!("{} ({} part(s))", transfer.name(), transfer.chunk_count())),
                ("Speed", self.output.format_speed(size, elapsed)),
            ],
        );
        Ok(package)
    }

    async fn upload(
        &self,
        repository: &RepositoryRef,
        path: &Path,
        filename: &str,
        size: u64,
        transfer: &Transfer,
    ) -> Result<Package> {
        let checksum = DigestUtils::compute_file_sha256(path).await?;
        self.output.detail(&format!("SHA256: {}", checksum));

        let request = UploadRequest {
            filename: filename.to_string(),
            sha256_checksum: checksum,
            size,
            method: transfer.method(),
        };
        let session = self.transport.request_upload(repository, &request).await?;
        self.output
            .detail(&format!("Upload session {} opened", session.identifier));

        match transfer {
            Transfer::Atomic { .. } => {
                let data = tokio::fs::read(path).await?;
                self.output
                    .progress(&format!("Uploading {}", self.output.format_size(size)));
                self.transport.upload_file(&session, data).await?;
                self.output.progress_done();
            }
            Transfer::Chunked(ranges) => {
                ChunkedUploader::new(self.transport, self.output.clone())
                    .upload(repository, &session, path, ranges)
                    .await?;
            }
        }

        self.transport
            .create_raw_package(repository, &session.identifier)
            .await
    }
}
