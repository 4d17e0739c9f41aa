//! Package listing with pagination and deterministic sorting

use crate::error::{RegistryError, Result};
use crate::logging::Logger;
use crate::registry::{ListRequest, Package, RegistryTransport, RepositoryRef};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Safety net against a registry that never reports the last page
const MAX_PAGES: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    /// Lexicographic by filename
    Name,
    /// Chronological by upload time
    Date,
}

/// `name`, `-name`, `date` or `-date`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl FromStr for SortKey {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        let (descending, field) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let field = match field {
            "name" => SortField::Name,
            "date" => SortField::Date,
            _ => {
                return Err(RegistryError::Validation(format!(
                    "Unknown sort field '{}'. Expected name, -name, date or -date",
                    s
                )));
            }
        };
        Ok(SortKey { field, descending })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            SortField::Name => "name",
            SortField::Date => "date",
        };
        if self.descending {
            write!(f, "-{}", field)
        } else {
            f.write_str(field)
        }
    }
}

impl SortKey {
    /// Total order on packages; ties on the field are broken by ascending slug
    pub fn compare(&self, a: &Package, b: &Package) -> Ordering {
        let by_field = match self.field {
            SortField::Name => a.filename.cmp(&b.filename),
            // Packages without a timestamp sort as oldest
            SortField::Date => a.uploaded_at.cmp(&b.uploaded_at),
        };
        let by_field = if self.descending {
            by_field.reverse()
        } else {
            by_field
        };
        by_field.then_with(|| a.slug.cmp(&b.slug))
    }
}

pub fn sort_packages(packages: &mut [Package], key: SortKey) {
    packages.sort_by(|a, b| key.compare(a, b));
}

pub struct PackageLister<'a> {
    transport: &'a dyn RegistryTransport,
    page_size: u32,
    output: Logger,
}

impl<'a> PackageLister<'a> {
    pub fn new(transport: &'a dyn RegistryTransport, output: Logger) -> Self {
        Self {
            transport,
            page_size: ListRequest::default().page_size,
            output,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Every package in `repository`, in server order unless `sort` is given.
    ///
    /// Without a page total from the registry, pages are fetched until one comes
    /// back empty; a short page is not proof of the end since the registry may cap
    /// the page size below the requested one.
    pub async fn list(&self, repository: &RepositoryRef, sort: Option<SortKey>) -> Result<Vec<Package>> {
        let mut packages = Vec::new();
        let mut request = ListRequest {
            page_size: self.page_size,
            sort: sort.map(|key| key.to_string()),
            ..ListRequest::default()
        };

        loop {
            let page = self.transport.list_packages(repository, &request).await?;
            let fetched = page.packages.len() as u32;
            self.output.detail(&format!(
                "Fetched page {} of {} ({} packages)",
                request.page,
                page.page_total
                    .map(|total| total.to_string())
                    .unwrap_or_else(|| "?".to_string()),
                fetched
            ));
            packages.extend(page.packages);

            let last_page = match page.page_total {
                Some(total) => request.page >= total,
                None => fetched == 0,
            };
            if last_page || fetched == 0 || request.page >= MAX_PAGES {
                break;
            }
            request.page += 1;
        }

        if let Some(key) = sort {
            sort_packages(&mut packages, key);
        }
        Ok(packages)
    }
}
