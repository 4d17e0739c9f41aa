//! Registry module for package registry interactions
//!
//! This module provides the package data model, the [`RegistryTransport`] seam used by
//! the uploader and poller, and the HTTP client implementing it.

pub mod client;
pub mod package;
pub mod transport;

pub use client::{RegistryClient, RegistryClientBuilder};
pub use package::{Package, PackageRef, RepositoryRef, StatusReport, SyncStatus};
pub use transport::{
    ChunkPart, ListRequest, PackagePage, RegistryTransport, UploadMethod, UploadRequest,
    UploadSession,
};
