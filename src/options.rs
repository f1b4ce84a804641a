//! Assembly configuration: which subfeatures to build, whether to group
//! transcripts into genes, and whether identical subfeatures are shared.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Toggles consumed by the assembler. Read-only from the core's
/// perspective; callers decide them once per parse session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssemblyOptions {
    /// Build exon children.
    pub exons: bool,
    /// Build UTR children (coding transcripts only).
    pub utrs: bool,
    /// Build CDS children (coding transcripts only).
    pub cds: bool,
    /// Build start/stop codon children (coding transcripts only).
    pub codons: bool,
    /// Aggregate transcripts into gene features; when off, each row yields
    /// a bare transcript.
    pub group_genes: bool,
    /// Re-use an identical exon/UTR/codon instance across transcripts of
    /// the same gene instead of allocating a duplicate.
    pub share: bool,
    /// Source label stamped on every constructed feature.
    pub source: String,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            exons: true,
            utrs: true,
            cds: true,
            codons: true,
            group_genes: true,
            share: true,
            source: "UCSC".to_string(),
        }
    }
}

impl AssemblyOptions {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read options file: {}", path.display()))?;
        let options: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse options file: {}", path.display()))?;
        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> Result<()> {
        if self.source.is_empty() {
            bail!("source label must not be empty");
        }
        Ok(())
    }
}
