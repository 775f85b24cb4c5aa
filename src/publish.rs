//! Module metadata generation for a publication: variants, their attributes and files.
//!
//! Consumes the result of artifact resolution (transformed outputs included) as plain file
//! lists; it does not take part in transform scheduling or caching.

use anyhow::{Context, Result};
use log::warn;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::Attributes;
use crate::engine::hashing::digest_file;
use crate::utils::config::METADATA_FORMAT_VERSION;
use crate::utils::tempfiles::write_atomically;

/// One usage (variant) of a component: attributes plus artifact files.
#[derive(Clone, Debug)]
pub struct UsageContext {
    pub name: String,
    pub attributes: Attributes,
    pub artifacts: Vec<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct SoftwareComponent {
    pub name: String,
    pub usages: Vec<UsageContext>,
}

#[derive(Clone, Debug)]
pub struct Publication {
    pub name: String,
    pub component: Option<SoftwareComponent>,
}

impl Publication {
    /// Every artifact file of every usage, de-duplicated, first-seen order.
    pub fn variant_files(&self) -> Vec<PathBuf> {
        let Some(component) = &self.component else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        component
            .usages
            .iter()
            .flat_map(|u| u.artifacts.iter())
            .filter(|f| seen.insert((*f).clone()))
            .cloned()
            .collect()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModuleDocument<'a> {
    format_version: &'static str,
    component: ComponentEntry<'a>,
    created_by: CreatedBy,
    variants: Vec<VariantEntry<'a>>,
}

#[derive(Serialize)]
struct ComponentEntry<'a> {
    name: &'a str,
    publication: &'a str,
}

#[derive(Serialize)]
struct CreatedBy {
    tool: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct VariantEntry<'a> {
    name: &'a str,
    attributes: &'a Attributes,
    files: Vec<FileEntry>,
}

#[derive(Serialize)]
struct FileEntry {
    name: String,
    url: String,
    size: u64,
    blake3: String,
}

fn file_entry(path: &Path) -> Result<FileEntry> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(FileEntry {
        url: name.clone(),
        name,
        size,
        blake3: digest_file(path)?.to_hex().to_string(),
    })
}

/// Writes the module metadata JSON document for one publication.
#[derive(Clone, Copy, Debug, Default)]
pub struct ModuleMetadataWriter;

impl ModuleMetadataWriter {
    /// Render the document. `None` when the publication has no component attached.
    pub fn render(&self, publication: &Publication) -> Result<Option<String>> {
        let Some(component) = &publication.component else {
            return Ok(None);
        };
        let mut variants = Vec::with_capacity(component.usages.len());
        for usage in &component.usages {
            let files = usage
                .artifacts
                .iter()
                .map(|p| file_entry(p))
                .collect::<Result<Vec<_>>>()?;
            variants.push(VariantEntry {
                name: &usage.name,
                attributes: &usage.attributes,
                files,
            });
        }
        let doc = ModuleDocument {
            format_version: METADATA_FORMAT_VERSION,
            component: ComponentEntry {
                name: &component.name,
                publication: &publication.name,
            },
            created_by: CreatedBy {
                tool: env!("CARGO_PKG_NAME"),
                version: env!("CARGO_PKG_VERSION"),
            },
            variants,
        };
        Ok(Some(serde_json::to_string_pretty(&doc)?))
    }

    /// Write the document to `path`. Returns false (and warns) when the publication has no component.
    pub fn write_to(&self, path: &Path, publication: &Publication) -> Result<bool> {
        let Some(doc) = self.render(publication)? else {
            warn!(
                "{} isn't attached to a component; module metadata only supports publications with components",
                publication.name
            );
            return Ok(false);
        };
        write_atomically(path, doc.as_bytes())
            .with_context(|| format!("could not generate metadata file {}", path.display()))?;
        Ok(true)
    }
}
