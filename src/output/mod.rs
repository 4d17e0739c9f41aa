//! Rendering of command results for stdout

use crate::error::{RegistryError, Result};
use crate::registry::{Package, PackageRef, StatusReport};
use clap::ValueEnum;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human readable table
    #[default]
    Pretty,
    /// Compact JSON for scripting
    Json,
    /// Indented JSON
    #[value(name = "pretty_json")]
    PrettyJson,
}

impl OutputFormat {
    pub fn is_machine_readable(&self) -> bool {
        !matches!(self, OutputFormat::Pretty)
    }
}

/// Package list as `{"data": [...], "meta": {...}}` or a table
pub fn render_packages(packages: &[Package], format: OutputFormat) -> Result<String> {
    let document = || {
        json!({
            "data": packages,
            "meta": { "count": packages.len() },
        })
    };

    match format {
        OutputFormat::Json => Ok(serde_json::to_string(&document())?),
        OutputFormat::PrettyJson => Ok(serde_json::to_string_pretty(&document())?),
        OutputFormat::Pretty => Ok(render_table(packages)),
    }
}

fn render_table(packages: &[Package]) -> String {
    if packages.is_empty() {
        return "No packages found".to_string();
    }

    let headers = ["Filename", "Slug", "Status", "Uploaded"];
    let rows: Vec<[String; 4]> = packages
        .iter()
        .map(|p| {
            [
                p.filename.clone(),
                p.slug.clone(),
                p.sync_status().label().to_string(),
                p.uploaded_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let header_cells = headers.map(str::to_string);
    let mut lines = vec![format_row(header_cells.as_slice())];
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-|-"),
    );
    lines.extend(rows.iter().map(|row| format_row(row.as_slice())));
    lines.push(String::new());
    lines.push(format!("Results: {} package(s)", packages.len()));
    lines.join("\n")
}

pub fn render_status(package: &PackageRef, report: &StatusReport) -> String {
    let status = report.sync_status();
    let mut lines = vec![
        format!("Package: {}", package),
        format!("Status: {} ({}%)", status.label(), report.sync_progress),
    ];
    if let Some(text) = &report.status_str {
        lines.push(format!("Registry status: {}", text));
    }
    if let Some(stage) = &report.stage_str {
        lines.push(format!("Stage: {}", stage));
    }
    if let Some(reason) = &report.status_reason {
        lines.push(format!("Reason: {}", reason));
    }
    lines.join("\n")
}

/// Failure line for `status`; a missing package renders as `status: 404 - Not Found`
pub fn render_status_error(package: &PackageRef, err: &RegistryError) -> String {
    if err.is_not_found() {
        format!(
            "Failed to get status of package {}! (status: 404 - Not Found)",
            package
        )
    } else {
        format!("Failed to get status of package {}! ({})", package, err)
    }
}
