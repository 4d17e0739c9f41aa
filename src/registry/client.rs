//! HTTP implementation of [`RegistryTransport`] for the registry's JSON API.

use crate::config::ClientConfig;
use crate::error::handlers::{HttpErrorHandler, NetworkErrorHandler};
use crate::error::{RegistryError, Result};
use crate::registry::package::{Package, PackageRef, RepositoryRef, StatusReport};
use crate::registry::transport::{
    ChunkPart, ListRequest, PackagePage, RegistryTransport, UploadRequest, UploadSession,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use url::Url;

const API_KEY_HEADER: &str = "X-Api-Key";
const PAGE_TOTAL_HEADER: &str = "X-Pagination-PageTotal";

pub struct RegistryClientBuilder {
    address: String,
    api_key: Option<String>,
    timeout: u64,
    user_agent: String,
}

impl RegistryClientBuilder {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            api_key: None,
            timeout: 3600,
            user_agent: format!("pkgpush/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<RegistryClient> {
        // Url::join drops the last path segment unless it ends with '/'
        let mut address = self.address.trim_end_matches('/').to_string();
        address.push('/');
        let base_url = Url::parse(&address)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(self.timeout))
            .connect_timeout(Duration::from_secs(60))
            .user_agent(self.user_agent)
            .build()
            .map_err(|e| RegistryError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(RegistryClient {
            client,
            base_url,
            api_key: self.api_key,
        })
    }
}

pub struct RegistryClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl RegistryClient {
    pub fn builder(address: impl Into<String>) -> RegistryClientBuilder {
        RegistryClientBuilder::new(address)
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::builder(config.api_host.clone())
            .with_api_key(config.api_key.clone())
            .with_timeout(config.timeout)
            .build()
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Resolve an upload URL handed out by the registry; relative URLs are API paths
    fn upload_url(&self, upload_url: &str) -> Result<Url> {
        match Url::parse(upload_url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => self.url(upload_url),
            Err(e) => Err(e.into()),
        }
    }

    /// Attach the API key, but only for requests to the API host itself
    fn authorize(&self, request: RequestBuilder, url: &Url) -> RequestBuilder {
        match &self.api_key {
            Some(key) if url.origin() == self.base_url.origin() => {
                request.header(API_KEY_HEADER, key)
            }
            _ => request,
        }
    }

    async fn send(&self, request: RequestBuilder, operation: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, operation))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());
        Err(HttpErrorHandler::handle_registry_error(
            status,
            &error_text,
            operation,
        ))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<T> {
        let response = self.send(request, operation).await?;
        let body = response
            .text()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, operation))?;
        serde_json::from_str(&body).map_err(|e| {
            RegistryError::Parse(format!("Invalid {} response: {}", operation, e))
        })
    }

    fn files_path(repository: &RepositoryRef) -> String {
        format!(
            "v1/files/{}/{}/",
            repository.organization, repository.repository
        )
    }

    fn packages_path(repository: &RepositoryRef) -> String {
        format!(
            "v1/packages/{}/{}/",
            repository.organization, repository.repository
        )
    }

    fn package_path(package: &PackageRef) -> String {
        format!("{}{}/", Self::packages_path(&package.repository), package.slug)
    }
}

#[async_trait]
impl RegistryTransport for RegistryClient {
    async fn request_upload(
        &self,
        repository: &RepositoryRef,
        request: &UploadRequest,
    ) -> Result<UploadSession> {
        let url = self.url(&Self::files_path(repository))?;
        let builder = self.authorize(self.client.post(url.clone()), &url).json(request);
        self.send_json(builder, "upload request").await
    }

    async fn upload_file(&self, session: &UploadSession, data: Vec<u8>) -> Result<()> {
        let url = self.upload_url(&session.upload_url)?;
        let builder = self
            .authorize(self.client.put(url.clone()), &url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data);
        self.send(builder, "file upload").await?;
        Ok(())
    }

    async fn upload_chunk(
        &self,
        session: &UploadSession,
        part: ChunkPart,
        data: Vec<u8>,
    ) -> Result<()> {
        let url = self.upload_url(&session.upload_url)?;
        let upload_id = session.upload_id.clone().unwrap_or_default();
        let builder = self
            .authorize(self.client.put(url.clone()), &url)
            .query(&[
                ("upload_id", upload_id),
                ("part_number", part.index.to_string()),
                ("total_parts", part.total.to_string()),
            ])
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data);
        self.send(builder, &format!("chunk {}/{} upload", part.index, part.total))
            .await?;
        Ok(())
    }

    async fn complete_upload(
        &self,
        repository: &RepositoryRef,
        session: &UploadSession,
    ) -> Result<()> {
        let url = self.url(&format!(
            "{}{}/complete/",
            Self::files_path(repository),
            session.identifier
        ))?;
        let builder = self
            .authorize(self.client.post(url.clone()), &url)
            .json(&json!({ "upload_id": session.upload_id, "complete": true }));
        self.send(builder, "upload completion").await?;
        Ok(())
    }

    async fn abort_upload(
        &self,
        repository: &RepositoryRef,
        session: &UploadSession,
    ) -> Result<()> {
        let url = self.url(&format!(
            "{}{}/abort/",
            Self::files_path(repository),
            session.identifier
        ))?;
        let builder = self
            .authorize(self.client.post(url.clone()), &url)
            .json(&json!({ "upload_id": session.upload_id }));
        self.send(builder, "upload abort").await?;
        Ok(())
    }

    async fn create_raw_package(
        &self,
        repository: &RepositoryRef,
        file_identifier: &str,
    ) -> Result<Package> {
        let url = self.url(&format!("{}upload/raw/", Self::packages_path(repository)))?;
        let builder = self
            .authorize(self.client.post(url.clone()), &url)
            .json(&json!({ "package_file": file_identifier }));
        self.send_json(builder, "package creation").await
    }

    async fn list_packages(
        &self,
        repository: &RepositoryRef,
        request: &ListRequest,
    ) -> Result<PackagePage> {
        let url = self.url(&Self::packages_path(repository))?;
        let mut query = vec![
            ("page", request.page.to_string()),
            ("page_size", request.page_size.to_string()),
        ];
        if let Some(sort) = &request.sort {
            query.push(("sort", sort.clone()));
        }

        let builder = self.authorize(self.client.get(url.clone()), &url).query(&query);
        let response = self.send(builder, "package listing").await?;
        let page_total = response
            .headers()
            .get(PAGE_TOTAL_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response
            .text()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, "package listing"))?;
        let packages = serde_json::from_str(&body).map_err(|e| {
            RegistryError::Parse(format!("Invalid package listing response: {}", e))
        })?;

        Ok(PackagePage {
            packages,
            page_total,
        })
    }

    async fn package_status(&self, package: &PackageRef) -> Result<StatusReport> {
        let url = self.url(&format!("{}status/", Self::package_path(package)))?;
        let builder = self.authorize(self.client.get(url.clone()), &url);
        self.send_json(builder, "package status").await
    }

    async fn delete_package(&self, package: &PackageRef) -> Result<()> {
        let url = self.url(&Self::package_path(package))?;
        let builder = self.authorize(self.client.delete(url.clone()), &url);
        self.send(builder, "package deletion").await?;
        Ok(())
    }
}
