use chrono::{DateTime, Utc};
use lsb_types::{AssetId, LinksetDescriptor, Vec3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{DocumentError, DocumentResult};
use crate::wire;

/// Value of the `format` field of every backup document.
pub const FORMAT_TAG: &str = "linkset-backup";

/// Newest document version this crate reads and the one it writes.
pub const FORMAT_VERSION: u32 = 1;

/// Descriptive stanza of a backup document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentMetadata {
    /// Program that wrote the document.
    pub generator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    /// Grid the content was exported from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<String>,
    pub linkset_count: usize,
    pub prim_count: usize,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            generator: concat!("lsb/", env!("CARGO_PKG_VERSION")).to_string(),
            name: None,
            exported_at: None,
            grid: None,
            linkset_count: 0,
            prim_count: 0,
        }
    }
}

/// A complete backup: metadata plus every exported linkset, in selection order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackupDocument {
    pub format: String,
    pub version: u32,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(with = "wire::linksets")]
    pub linksets: Vec<LinksetDescriptor>,
}

impl BackupDocument {
    /// A new document over `linksets`, stamped with the current time.
    pub fn new(linksets: Vec<LinksetDescriptor>) -> Self {
        let metadata = DocumentMetadata {
            exported_at: Some(Utc::now()),
            linkset_count: linksets.len(),
            prim_count: linksets.iter().map(LinksetDescriptor::len).sum(),
            ..DocumentMetadata::default()
        };
        Self {
            format: FORMAT_TAG.to_string(),
            version: FORMAT_VERSION,
            metadata,
            linksets,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = Some(name.into());
        self
    }

    pub fn with_grid(mut self, grid: impl Into<String>) -> Self {
        self.metadata.grid = Some(grid.into());
        self
    }

    /// Parse and validate a document.
    pub fn parse(text: &str) -> DocumentResult<Self> {
        let doc: BackupDocument = serde_json::from_str(text)?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn from_slice(bytes: &[u8]) -> DocumentResult<Self> {
        let doc: BackupDocument = serde_json::from_slice(bytes)?;
        doc.validate()?;
        Ok(doc)
    }

    /// Pretty-printed JSON text of the document.
    pub fn to_json_pretty(&self) -> DocumentResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the format header and the structure of every linkset.
    ///
    /// Metadata counts that disagree with the content are logged, not
    /// rejected.
    pub fn validate(&self) -> DocumentResult<()> {
        if self.format != FORMAT_TAG {
            return Err(DocumentError::UnknownFormat {
                expected: FORMAT_TAG.to_string(),
                actual: self.format.clone(),
            });
        }
        if self.version == 0 || self.version > FORMAT_VERSION {
            return Err(DocumentError::UnsupportedVersion(self.version));
        }
        if self.linksets.is_empty() {
            return Err(DocumentError::NoLinksets);
        }
        for (index, linkset) in self.linksets.iter().enumerate() {
            linkset
                .validate()
                .map_err(|source| DocumentError::InvalidLinkset { index, source })?;
        }
        if self.metadata.linkset_count != self.linksets.len()
            || self.metadata.prim_count != self.prim_count()
        {
            warn!(
                declared_linksets = self.metadata.linkset_count,
                declared_prims = self.metadata.prim_count,
                linksets = self.linksets.len(),
                prims = self.prim_count(),
                "document metadata counts disagree with content"
            );
        }
        Ok(())
    }

    pub fn prim_count(&self) -> usize {
        self.linksets.iter().map(LinksetDescriptor::len).sum()
    }

    /// Distinct non-null asset ids referenced anywhere in the document,
    /// first-seen order.
    pub fn referenced_assets(&self) -> Vec<AssetId> {
        let mut seen = std::collections::HashSet::new();
        self.linksets
            .iter()
            .flat_map(LinksetDescriptor::referenced_assets)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Root position of the first linkset; imports place every linkset
    /// relative to it.
    pub fn origin(&self) -> Vec3 {
        self.linksets
            .first()
            .map(|ls| ls.root_position)
            .unwrap_or(Vec3::ZERO)
    }
}
