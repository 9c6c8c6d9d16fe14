//! Published-resource catalog.
//!
//! Subjects own resources, resources own sections. Every list is kept sorted
//! by id so the serialized catalog, and its checksum, are deterministic.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::constants::REMOTE_RESOURCES_ROOT;
use crate::utils::sha256_hex;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to access catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("catalog {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize catalog: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("resource {resource_id} not found in subject {subject}")]
    ResourceNotFound { subject: String, resource_id: String },

    #[error("section {section_id} already exists in resource {resource_id}")]
    DuplicateSection {
        resource_id: String,
        section_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub id: String,
    pub title: String,
    pub checksum: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: String,
    pub subject_code: String,
    pub title: String,
    /// Remote folder, `resources/<subject>/<resource_id>`
    pub github_path: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub sections: Vec<SectionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub code: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resources: Vec<ResourceRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub subjects: Vec<SubjectRecord>,
}

/// Storage for subjects, resources and published sections.
pub trait Catalog {
    fn upsert_subject(&mut self, code: &str) -> Result<(), CatalogError>;

    /// Create the resource or update its title.
    fn upsert_resource(
        &mut self,
        subject: &str,
        resource_id: &str,
        title: &str,
    ) -> Result<ResourceRecord, CatalogError>;

    fn find_section(
        &self,
        subject: &str,
        resource_id: &str,
        section_id: &str,
    ) -> Option<SectionRecord>;

    fn create_section(
        &mut self,
        subject: &str,
        resource_id: &str,
        section_id: &str,
        title: &str,
        checksum: &str,
        url: &str,
    ) -> Result<SectionRecord, CatalogError>;
}

/// Remote folder for a resource.
pub fn resource_remote_path(subject: &str, resource_id: &str) -> String {
    format!("{}/{}/{}", REMOTE_RESOURCES_ROOT, subject, resource_id)
}

// =============================================================================
// Checksum view
// =============================================================================

#[derive(Serialize)]
struct SectionView<'a> {
    id: &'a str,
    title: &'a str,
    checksum: &'a str,
}

#[derive(Serialize)]
struct ResourceView<'a> {
    id: &'a str,
    title: &'a str,
    sections: Vec<SectionView<'a>>,
}

#[derive(Serialize)]
struct SubjectView<'a> {
    code: &'a str,
    resources: Vec<ResourceView<'a>>,
}

/// SHA-256 over the catalog's content. Timestamps and urls are excluded, so
/// the value only changes when sections are added, retitled or re-published.
pub fn catalog_checksum(data: &CatalogData) -> Result<String, CatalogError> {
    let view: Vec<SubjectView<'_>> = data
        .subjects
        .iter()
        .map(|subject| SubjectView {
            code: &subject.code,
            resources: subject
                .resources
                .iter()
                .map(|resource| ResourceView {
                    id: &resource.id,
                    title: &resource.title,
                    sections: resource
                        .sections
                        .iter()
                        .map(|section| SectionView {
                            id: &section.id,
                            title: &section.title,
                            checksum: &section.checksum,
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();
    Ok(sha256_hex(serde_json::to_string(&view)?.as_bytes()))
}

// =============================================================================
// JSON file catalog
// =============================================================================

/// Catalog persisted as a pretty-printed JSON file, saved after every change.
#[derive(Debug)]
pub struct JsonCatalog {
    path: PathBuf,
    data: CatalogData,
}

impl JsonCatalog {
    /// Open the catalog at `path`. A missing file is an empty catalog.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        let data = if path.exists() {
            let json = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&json).map_err(|source| CatalogError::Parse {
                path: path.clone(),
                source,
            })?
        } else {
            CatalogData::default()
        };
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &CatalogData {
        &self.data
    }

    pub fn checksum(&self) -> Result<String, CatalogError> {
        catalog_checksum(&self.data)
    }

    fn save(&self) -> Result<(), CatalogError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| CatalogError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, json).map_err(|source| CatalogError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn subject_mut(&mut self, code: &str) -> Option<&mut SubjectRecord> {
        self.data.subjects.iter_mut().find(|s| s.code == code)
    }

    fn resource(&self, subject: &str, resource_id: &str) -> Option<&ResourceRecord> {
        self.data
            .subjects
            .iter()
            .find(|s| s.code == subject)?
            .resources
            .iter()
            .find(|r| r.id == resource_id)
    }
}

impl Catalog for JsonCatalog {
    fn upsert_subject(&mut self, code: &str) -> Result<(), CatalogError> {
        if self.subject_mut(code).is_some() {
            return Ok(());
        }
        let index = self
            .data
            .subjects
            .partition_point(|s| s.code.as_str() < code);
        self.data.subjects.insert(
            index,
            SubjectRecord {
                code: code.to_string(),
                created_at: Utc::now(),
                resources: Vec::new(),
            },
        );
        debug!(subject = code, "created subject");
        self.save()
    }

    fn upsert_resource(
        &mut self,
        subject: &str,
        resource_id: &str,
        title: &str,
    ) -> Result<ResourceRecord, CatalogError> {
        self.upsert_subject(subject)?;
        let Some(record) = self.subject_mut(subject) else {
            return Err(CatalogError::ResourceNotFound {
                subject: subject.to_string(),
                resource_id: resource_id.to_string(),
            });
        };

        let now = Utc::now();
        let resource = match record.resources.iter().position(|r| r.id == resource_id) {
            Some(index) => {
                let resource = &mut record.resources[index];
                resource.title = title.to_string();
                resource.updated_at = now;
                resource.clone()
            }
            None => {
                let resource = ResourceRecord {
                    id: resource_id.to_string(),
                    subject_code: subject.to_string(),
                    title: title.to_string(),
                    github_path: resource_remote_path(subject, resource_id),
                    updated_at: now,
                    sections: Vec::new(),
                };
                let index = record
                    .resources
                    .partition_point(|r| r.id.as_str() < resource_id);
                record.resources.insert(index, resource.clone());
                debug!(subject, resource = resource_id, "created resource");
                resource
            }
        };
        self.save()?;
        Ok(resource)
    }

    fn find_section(
        &self,
        subject: &str,
        resource_id: &str,
        section_id: &str,
    ) -> Option<SectionRecord> {
        self.resource(subject, resource_id)?
            .sections
            .iter()
            .find(|s| s.id == section_id)
            .cloned()
    }

    fn create_section(
        &mut self,
        subject: &str,
        resource_id: &str,
        section_id: &str,
        title: &str,
        checksum: &str,
        url: &str,
    ) -> Result<SectionRecord, CatalogError> {
        let resource = self
            .subject_mut(subject)
            .and_then(|s| s.resources.iter_mut().find(|r| r.id == resource_id))
            .ok_or_else(|| CatalogError::ResourceNotFound {
                subject: subject.to_string(),
                resource_id: resource_id.to_string(),
            })?;

        if resource.sections.iter().any(|s| s.id == section_id) {
            return Err(CatalogError::DuplicateSection {
                resource_id: resource_id.to_string(),
                section_id: section_id.to_string(),
            });
        }

        let section = SectionRecord {
            id: section_id.to_string(),
            title: title.to_string(),
            checksum: checksum.to_string(),
            url: url.to_string(),
            created_at: Utc::now(),
        };
        let index = resource
            .sections
            .partition_point(|s| s.id.as_str() < section_id);
        resource.sections.insert(index, section.clone());
        self.save()?;
        Ok(section)
    }
}
