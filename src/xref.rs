//! Cross-reference side tables: alternate names, summaries, statuses,
//! gene-name maps, and biotype sources.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::info;

use crate::error::Error;

/// Which side table a file should be loaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    KgXref,
    RefSeqSummary,
    RefSeqStatus,
    EnsemblToGeneName,
    EnsemblSource,
}

/// One row of the UCSC kgXref table, keyed by the opaque known-gene id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KgXrefEntry {
    pub mrna_id: String,
    pub swissprot_id: String,
    pub swissprot_display_id: String,
    pub gene_symbol: String,
    pub refseq_id: String,
    pub protein_accession: String,
    pub description: String,
}

impl KgXrefEntry {
    /// Public-name fallback precedence when no gene symbol is present:
    /// gene symbol → mRNA id → refSeq id → the raw identifier.
    #[must_use]
    pub fn resolved_name<'a>(&'a self, raw_id: &'a str) -> &'a str {
        [
            self.gene_symbol.as_str(),
            self.mrna_id.as_str(),
            self.refseq_id.as_str(),
        ]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or(raw_id)
    }
}

/// Completeness and free-text note for a RefSeq accession.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryEntry {
    pub completeness: String,
    pub note: String,
}

/// Pure lookup store for all auxiliary tables consulted during
/// normalization and assembly.
#[derive(Debug, Default)]
pub struct CrossReferenceStore {
    kg_xref: HashMap<String, KgXrefEntry>,
    summaries: HashMap<String, SummaryEntry>,
    statuses: HashMap<String, String>,
    gene_names: HashMap<String, String>,
    biotypes: HashMap<String, String>,
}

impl CrossReferenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one side table from a tab-delimited file (gzip auto-detected).
    /// Returns the number of rows loaded. Reloading a kind replaces that
    /// kind's prior contents; other kinds are untouched. A failed load
    /// leaves previously loaded tables of other kinds intact.
    pub fn load(&mut self, kind: TableKind, path: &Path) -> Result<usize, Error> {
        let reader = open_table(path)?;
        let count = self.load_from(kind, reader)?;
        info!(
            table = ?kind,
            path = %path.display(),
            rows = count,
            "loaded cross-reference table"
        );
        Ok(count)
    }

    /// Load one side table from any buffered reader.
    pub fn load_from(&mut self, kind: TableKind, reader: impl BufRead) -> Result<usize, Error> {
        let mut staged_kg: HashMap<String, KgXrefEntry> = HashMap::new();
        let mut staged_pairs: HashMap<String, String> = HashMap::new();
        let mut staged_summaries: HashMap<String, SummaryEntry> = HashMap::new();
        let mut count = 0usize;

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.starts_with('#') || line.is_empty() {
                continue;
            }
            let columns: Vec<&str> = line.split('\t').collect();

            match kind {
                TableKind::KgXref => {
                    require_columns(&columns, 8, line_num)?;
                    staged_kg.insert(
                        columns[0].to_string(),
                        KgXrefEntry {
                            mrna_id: columns[1].to_string(),
                            swissprot_id: columns[2].to_string(),
                            swissprot_display_id: columns[3].to_string(),
                            gene_symbol: columns[4].to_string(),
                            refseq_id: columns[5].to_string(),
                            protein_accession: columns[6].to_string(),
                            description: columns[7].to_string(),
                        },
                    );
                }
                TableKind::RefSeqSummary => {
                    require_columns(&columns, 3, line_num)?;
                    staged_summaries.insert(
                        columns[0].to_string(),
                        SummaryEntry {
                            completeness: columns[1].to_string(),
                            note: columns[2].to_string(),
                        },
                    );
                }
                TableKind::RefSeqStatus | TableKind::EnsemblToGeneName | TableKind::EnsemblSource => {
                    require_columns(&columns, 2, line_num)?;
                    staged_pairs.insert(columns[0].to_string(), columns[1].to_string());
                }
            }
            count += 1;
        }

        // Replace contents only after the whole file parsed cleanly.
        match kind {
            TableKind::KgXref => self.kg_xref = staged_kg,
            TableKind::RefSeqSummary => self.summaries = staged_summaries,
            TableKind::RefSeqStatus => self.statuses = staged_pairs,
            TableKind::EnsemblToGeneName => self.gene_names = staged_pairs,
            TableKind::EnsemblSource => self.biotypes = staged_pairs,
        }
        Ok(count)
    }

    #[must_use]
    pub fn kg_xref(&self, raw_id: &str) -> Option<&KgXrefEntry> {
        self.kg_xref.get(raw_id)
    }

    #[must_use]
    pub fn summary(&self, accession: &str) -> Option<&SummaryEntry> {
        self.summaries.get(accession)
    }

    #[must_use]
    pub fn status(&self, accession: &str) -> Option<&str> {
        self.statuses.get(accession).map(String::as_str)
    }

    #[must_use]
    pub fn gene_name(&self, transcript_name: &str) -> Option<&str> {
        self.gene_names.get(transcript_name).map(String::as_str)
    }

    #[must_use]
    pub fn biotype(&self, transcript_name: &str) -> Option<&str> {
        self.biotypes.get(transcript_name).map(String::as_str)
    }
}

fn require_columns(columns: &[&str], expected: usize, line_num: usize) -> Result<(), Error> {
    if columns.len() < expected {
        return Err(Error::Parse(format!(
            "line {}: expected at least {expected} columns, got {}",
            line_num + 1,
            columns.len()
        )));
    }
    Ok(())
}

/// Open a delimited table file, transparently decompressing gzip input
/// (detected by magic bytes, not file extension).
pub fn open_table(path: &Path) -> Result<Box<dyn BufRead>, Error> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    let n = file.read(&mut magic)?;
    file.seek(SeekFrom::Start(0))?;
    if n == 2 && magic == [0x1f, 0x8b] {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const KG_XREF: &str = "\
uc001aaa.3\tBC032353\t\t\tDDX11L1\tNR_046018\t\thomolog of DDX11\n\
uc010nxq.1\tDQ597235\tP86434\tA8K2U0_HUMAN\tWASH7P\tNR_024540\tDQ597235\tWAS protein family homolog\n";

    #[test]
    fn load_kg_xref() {
        let mut store = CrossReferenceStore::new();
        let count = store
            .load_from(TableKind::KgXref, KG_XREF.as_bytes())
            .unwrap();
        assert_eq!(count, 2);

        let entry = store.kg_xref("uc010nxq.1").unwrap();
        assert_eq!(entry.gene_symbol, "WASH7P");
        assert_eq!(entry.refseq_id, "NR_024540");
        assert_eq!(entry.swissprot_id, "P86434");
        assert_eq!(entry.protein_accession, "DQ597235");
        assert!(store.kg_xref("uc999zzz.9").is_none());
    }

    #[test]
    fn resolved_name_precedence() {
        let mut entry = KgXrefEntry {
            gene_symbol: "WASH7P".to_string(),
            mrna_id: "DQ597235".to_string(),
            refseq_id: "NR_024540".to_string(),
            ..Default::default()
        };
        assert_eq!(entry.resolved_name("uc1"), "WASH7P");
        entry.gene_symbol.clear();
        assert_eq!(entry.resolved_name("uc1"), "DQ597235");
        entry.mrna_id.clear();
        assert_eq!(entry.resolved_name("uc1"), "NR_024540");
        entry.refseq_id.clear();
        assert_eq!(entry.resolved_name("uc1"), "uc1");
    }

    #[test]
    fn load_summary_and_status() {
        let mut store = CrossReferenceStore::new();
        store
            .load_from(
                TableKind::RefSeqSummary,
                "NM_000001\tComplete5End\tan important transcript\n".as_bytes(),
            )
            .unwrap();
        store
            .load_from(TableKind::RefSeqStatus, "NM_000001\tValidated\tmRNA\n".as_bytes())
            .unwrap();

        let summary = store.summary("NM_000001").unwrap();
        assert_eq!(summary.completeness, "Complete5End");
        assert_eq!(summary.note, "an important transcript");
        assert_eq!(store.status("NM_000001"), Some("Validated"));
        assert_eq!(store.status("NM_000002"), None);
    }

    #[test]
    fn reload_replaces_only_that_kind() {
        let mut store = CrossReferenceStore::new();
        store
            .load_from(TableKind::EnsemblToGeneName, "ENST1\tGENE_A\n".as_bytes())
            .unwrap();
        store
            .load_from(TableKind::EnsemblSource, "ENST1\tprotein_coding\n".as_bytes())
            .unwrap();

        // reload gene names with different content
        store
            .load_from(TableKind::EnsemblToGeneName, "ENST2\tGENE_B\n".as_bytes())
            .unwrap();

        assert_eq!(store.gene_name("ENST1"), None);
        assert_eq!(store.gene_name("ENST2"), Some("GENE_B"));
        // the other table is untouched
        assert_eq!(store.biotype("ENST1"), Some("protein_coding"));
    }

    #[test]
    fn failed_load_keeps_previous_contents() {
        let mut store = CrossReferenceStore::new();
        store
            .load_from(TableKind::RefSeqStatus, "NM_000001\tValidated\n".as_bytes())
            .unwrap();

        let result = store.load_from(TableKind::RefSeqStatus, "only_one_column\n".as_bytes());
        assert!(result.is_err());
        assert_eq!(store.status("NM_000001"), Some("Validated"));
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let mut store = CrossReferenceStore::new();
        let count = store
            .load_from(
                TableKind::RefSeqStatus,
                "#mrnaAcc\tstatus\n\nNM_000001\tReviewed\n".as_bytes(),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(store.status("NM_000001"), Some("Reviewed"));
    }

    #[test]
    fn open_table_detects_gzip() {
        use tempfile::NamedTempFile;

        let mut plain = NamedTempFile::new().unwrap();
        plain.write_all(b"ENST1\tGENE_A\n").unwrap();

        let mut gz = NamedTempFile::new().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(b"ENST1\tGENE_A\n").unwrap();
        gz.write_all(&encoder.finish().unwrap()).unwrap();

        for file in [&plain, &gz] {
            let mut store = CrossReferenceStore::new();
            let count = store
                .load(TableKind::EnsemblToGeneName, file.path())
                .unwrap();
            assert_eq!(count, 1);
            assert_eq!(store.gene_name("ENST1"), Some("GENE_A"));
        }
    }
}
