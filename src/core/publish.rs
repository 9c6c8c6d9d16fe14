//! Publish pipeline
//!
//! Extracts the session's sections, registers the resource in the catalog and
//! uploads each section whose content is new. Re-publishing unchanged content
//! is a no-op; changed content under an existing id is reported as a conflict
//! and left untouched.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::catalog::{Catalog, CatalogError};
use super::extract::{self, ExtractError, Extractor, SectionSpec};
use super::pdf::PdfBackend;
use super::store::{ContentStore, StoreError};
use crate::constants::{MANIFEST_FILE, SECTIONS_DIR};
use crate::state::EditSession;
use crate::utils::{is_plain_file_name, slugify};

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("missing required fields: {0}")]
    MissingFields(String),

    #[error("subject code must be a plain folder name, got {0:?}")]
    InvalidSubject(String),

    #[error(
        "conflicts detected for sections: {}. These sections already exist with different content.",
        .ids.join(", ")
    )]
    Conflicts { ids: Vec<String>, report: PublishReport },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to write manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize manifest: {0}")]
    ManifestJson(#[from] serde_json::Error),
}

/// Everything needed to publish one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub subject_code: String,
    pub resource_title: String,
    pub sections: Vec<SectionSpec>,
}

impl PublishRequest {
    pub fn from_session(session: &EditSession) -> Self {
        Self {
            subject_code: session.subject().to_string(),
            resource_title: session.resource_title().to_string(),
            sections: session
                .timeline()
                .sections()
                .iter()
                .map(SectionSpec::from)
                .collect(),
        }
    }

    /// Check required fields and derive the resource id.
    pub fn resource_id(&self) -> Result<String, PublishError> {
        let mut missing = Vec::new();
        if self.subject_code.trim().is_empty() {
            missing.push("subject code");
        }
        if self.resource_title.trim().is_empty() {
            missing.push("resource title");
        }
        if self.sections.is_empty() {
            missing.push("sections");
        }
        if !missing.is_empty() {
            return Err(PublishError::MissingFields(missing.join(", ")));
        }
        if !is_plain_file_name(&self.subject_code) {
            return Err(PublishError::InvalidSubject(self.subject_code.clone()));
        }

        let resource_id = slugify(&self.resource_title);
        if resource_id.is_empty() {
            return Err(PublishError::MissingFields(
                "resource title has no usable characters".to_string(),
            ));
        }
        Ok(resource_id)
    }
}

/// Per-section outcome of a publish run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub resource_id: String,
    pub uploaded: Vec<String>,
    /// Already published with identical content
    pub skipped: Vec<String>,
    /// Already published with different content
    pub conflicts: Vec<String>,
    pub manifest_path: PathBuf,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest<'a> {
    subject_code: &'a str,
    resource_id: &'a str,
    resource_title: &'a str,
    sections: Vec<ManifestSection>,
}

#[derive(Debug, Serialize)]
struct ManifestSection {
    id: String,
    title: String,
    checksum: String,
    url: String,
}

/// Runs publish requests against one catalog and content store.
pub struct Publisher<B, C, S> {
    backend: B,
    catalog: C,
    store: S,
    output_root: PathBuf,
    upload_delay: Duration,
}

impl<B, C, S> Publisher<B, C, S>
where
    B: PdfBackend + Clone,
    C: Catalog,
    S: ContentStore,
{
    pub fn new(backend: B, catalog: C, store: S, output_root: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            catalog,
            store,
            output_root: output_root.into(),
            upload_delay: Duration::ZERO,
        }
    }

    /// Pause after each upload to stay clear of remote rate limits.
    pub fn with_upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = delay;
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub async fn publish(
        &mut self,
        request: &PublishRequest,
    ) -> Result<PublishReport, PublishError> {
        let resource_id = request.resource_id()?;
        let subject = request.subject_code.as_str();
        let subject_dir = self.output_root.join(subject);
        let resource_dir = subject_dir.join(&resource_id);

        let extractor = Extractor::new(self.backend.clone(), &subject_dir);
        let extracted = extractor.extract_all(&request.sections)?;
        extract::write_sections(&extracted, &resource_dir.join(SECTIONS_DIR))?;
        info!(subject, resource = %resource_id, sections = extracted.len(), "extracted sections");

        self.catalog.upsert_subject(subject)?;
        let resource = self
            .catalog
            .upsert_resource(subject, &resource_id, &request.resource_title)?;

        let mut report = PublishReport {
            resource_id: resource_id.clone(),
            ..Default::default()
        };
        let mut manifest_sections = Vec::new();

        for section in &extracted {
            let section_id = section.spec.id.as_str();
            if let Some(existing) = self.catalog.find_section(subject, &resource_id, section_id) {
                if existing.checksum == section.checksum {
                    info!(section = section_id, "already up to date, skipping");
                    report.skipped.push(section_id.to_string());
                    manifest_sections.push(ManifestSection {
                        id: existing.id,
                        title: existing.title,
                        checksum: existing.checksum,
                        url: existing.url,
                    });
                } else {
                    warn!(section = section_id, "conflict: published with different content");
                    report.conflicts.push(section_id.to_string());
                }
                continue;
            }

            let remote_path = format!(
                "{}/{}/{}",
                resource.github_path,
                SECTIONS_DIR,
                section.spec.file_name()
            );
            let url = self.store.upload(&remote_path, &section.bytes).await?;
            if !self.upload_delay.is_zero() {
                tokio::time::sleep(self.upload_delay).await;
            }

            self.catalog.create_section(
                subject,
                &resource_id,
                section_id,
                &section.spec.title,
                &section.checksum,
                &url,
            )?;
            info!(section = section_id, title = %section.spec.title, "uploaded section");
            report.uploaded.push(section_id.to_string());
            manifest_sections.push(ManifestSection {
                id: section_id.to_string(),
                title: section.spec.title.clone(),
                checksum: section.checksum.clone(),
                url,
            });
        }

        let manifest = Manifest {
            subject_code: subject,
            resource_id: &resource_id,
            resource_title: &request.resource_title,
            sections: manifest_sections,
        };
        let manifest_path = resource_dir.join(MANIFEST_FILE);
        fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?).map_err(|source| {
            PublishError::Manifest {
                path: manifest_path.clone(),
                source,
            }
        })?;
        report.manifest_path = manifest_path;

        if !report.conflicts.is_empty() {
            return Err(PublishError::Conflicts {
                ids: report.conflicts.clone(),
                report,
            });
        }

        info!(
            uploaded = report.uploaded.len(),
            skipped = report.skipped.len(),
            "publish finished"
        );
        Ok(report)
    }
}
