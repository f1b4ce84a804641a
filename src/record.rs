//! Row normalization: dialect detection and dialect-agnostic transcript
//! records.
//!
//! Dialect is selected purely by column count; each dialect is handled by an
//! isolated pure function over the raw fields. All coordinates leave this
//! module 1-based closed (UCSC tables are 0-based half-open on the start
//! side, so starts are incremented by one; ends are used as-is).

use crate::error::Error;
use crate::kind::NcRnaKind;
use crate::strand::Strand;
use crate::xref::CrossReferenceStore;

/// Table dialect, keyed by column count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    GenePredExtBinned,
    GenePredExt,
    KnownGene,
    RefFlat,
    GenePred,
}

impl Dialect {
    /// Column count is the only dialect signal these tables carry.
    pub fn from_column_count(n: usize) -> Result<Self, Error> {
        match n {
            16 => Ok(Self::GenePredExtBinned),
            15 => Ok(Self::GenePredExt),
            12 => Ok(Self::KnownGene),
            11 => Ok(Self::RefFlat),
            10 => Ok(Self::GenePred),
            _ => Err(Error::UnrecognizedColumnCount(n)),
        }
    }
}

/// Normalized, dialect-independent view of one input row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptRecord {
    pub name: String,
    pub name2: String,
    pub gene_name: String,
    pub chrom: String,
    pub strand: Strand,
    pub tx_start: i64,
    pub tx_end: i64,
    pub cds_start: i64,
    pub cds_end: i64,
    pub exon_count: usize,
    pub exon_starts: Vec<i64>,
    pub exon_ends: Vec<i64>,
    pub refseq_id: String,
    pub note: String,
    pub completeness: String,
    pub status: String,
    pub swissprot_id: String,
    pub swissprot_display_id: String,
    pub protein_accession: String,
}

impl TranscriptRecord {
    /// `cds_start - 1 == cds_end` is the sentinel for "no CDS": the raw
    /// half-open CDS span was empty.
    #[must_use]
    pub fn is_coding(&self) -> bool {
        self.cds_start - 1 != self.cds_end
    }

    /// Non-coding subtype, from the gene-level name prefix.
    #[must_use]
    pub fn noncoding_kind(&self) -> NcRnaKind {
        NcRnaKind::from_gene_name(&self.name2)
    }
}

/// Normalize one raw delimited row into a `TranscriptRecord`, consulting the
/// cross-reference store for names and annotations the row itself lacks.
pub fn normalize(
    raw_fields: &[&str],
    xref: &CrossReferenceStore,
) -> Result<TranscriptRecord, Error> {
    match Dialect::from_column_count(raw_fields.len())? {
        // the bin column carries no model information; strip it
        Dialect::GenePredExtBinned => from_gene_pred_ext(&raw_fields[1..], xref),
        Dialect::GenePredExt => from_gene_pred_ext(raw_fields, xref),
        Dialect::KnownGene => from_known_gene(raw_fields, xref),
        Dialect::RefFlat => from_ref_flat(raw_fields, xref),
        Dialect::GenePred => from_gene_pred(raw_fields, xref),
    }
}

/// The eight fields every dialect shares, already validated and converted
/// to internal coordinates.
struct CoreFields {
    strand: Strand,
    tx_start: i64,
    tx_end: i64,
    cds_start: i64,
    cds_end: i64,
    exon_count: usize,
    exon_starts: Vec<i64>,
    exon_ends: Vec<i64>,
}

/// Validate and convert the core fields starting at `fields[offset]` in the
/// order strand, txStart, txEnd, cdsStart, cdsEnd, exonCount, exonStarts,
/// exonEnds. Collects every offending field name before failing.
fn parse_core(fields: &[&str], offset: usize) -> Result<CoreFields, Error> {
    let mut bad: Vec<String> = Vec::new();
    let f = |i: usize| fields[offset + i];

    let strand = Strand::from_symbol(f(0));
    if strand.is_none() {
        bad.push("strand".to_string());
    }
    for (i, name) in [
        (1, "txStart"),
        (2, "txEnd"),
        (3, "cdsStart"),
        (4, "cdsEnd"),
        (5, "exonCount"),
    ] {
        if !is_number(f(i)) {
            bad.push(name.to_string());
        }
    }
    let starts = parse_number_list(f(6));
    if starts.is_none() {
        bad.push("exonStarts".to_string());
    }
    let ends = parse_number_list(f(7));
    if ends.is_none() {
        bad.push("exonEnds".to_string());
    }

    if !bad.is_empty() {
        return Err(Error::InvalidField(bad));
    }

    // unwraps guarded by the collection pass above
    let exon_count: usize = f(5).parse().map_err(|_| {
        Error::InvalidField(vec!["exonCount".to_string()])
    })?;
    let mut exon_starts = starts.unwrap_or_default();
    let exon_ends = ends.unwrap_or_default();

    if exon_starts.len() != exon_count {
        bad.push("exonStarts".to_string());
    }
    if exon_ends.len() != exon_count {
        bad.push("exonEnds".to_string());
    }
    if !bad.is_empty() {
        return Err(Error::InvalidField(bad));
    }

    // half-open → closed: starts shift up by one, ends are already closed
    for s in &mut exon_starts {
        *s += 1;
    }

    Ok(CoreFields {
        strand: strand.unwrap_or(Strand::Unknown),
        tx_start: to_i64(f(1)) + 1,
        tx_end: to_i64(f(2)),
        cds_start: to_i64(f(3)) + 1,
        cds_end: to_i64(f(4)),
        exon_count,
        exon_starts,
        exon_ends,
    })
}

fn record_from_core(name: &str, chrom: &str, core: CoreFields) -> TranscriptRecord {
    TranscriptRecord {
        name: name.to_string(),
        chrom: chrom.to_string(),
        strand: core.strand,
        tx_start: core.tx_start,
        tx_end: core.tx_end,
        cds_start: core.cds_start,
        cds_end: core.cds_end,
        exon_count: core.exon_count,
        exon_starts: core.exon_starts,
        exon_ends: core.exon_ends,
        ..Default::default()
    }
}

/// Extended genePred, 15 columns (16-column rows arrive here with the bin
/// column already stripped): name, chrom, strand, txStart, txEnd, cdsStart,
/// cdsEnd, exonCount, exonStarts, exonEnds, score, name2, cdsStartStat,
/// cdsEndStat, exonFrames.
fn from_gene_pred_ext(
    fields: &[&str],
    xref: &CrossReferenceStore,
) -> Result<TranscriptRecord, Error> {
    let core = parse_core(fields, 2)?;
    let mut rec = record_from_core(fields[0], fields[1], core);

    // an alternate-name table overrides the row's own name2
    let name2 = xref.gene_name(&rec.name).unwrap_or(fields[11]).to_string();
    rec.name2 = name2.clone();
    rec.gene_name = name2;

    apply_refseq_annotations(&mut rec, xref);
    Ok(rec)
}

/// knownGene, 12 columns: name, chrom, strand, txStart, txEnd, cdsStart,
/// cdsEnd, exonCount, exonStarts, exonEnds, proteinID, alignID. Everything
/// human-readable comes from the kgXref side table.
fn from_known_gene(fields: &[&str], xref: &CrossReferenceStore) -> Result<TranscriptRecord, Error> {
    let core = parse_core(fields, 2)?;
    let mut rec = record_from_core(fields[0], fields[1], core);

    match xref.kg_xref(&rec.name) {
        Some(entry) => {
            let public = entry.resolved_name(&rec.name).to_string();
            rec.name2 = public.clone();
            rec.gene_name = public;
            rec.note = entry.description.clone();
            rec.refseq_id = entry.refseq_id.clone();
            rec.swissprot_id = entry.swissprot_id.clone();
            rec.swissprot_display_id = entry.swissprot_display_id.clone();
            rec.protein_accession = entry.protein_accession.clone();

            // double indirection: status and completeness are keyed by the
            // resolved refseq id, not the opaque known-gene id
            if !rec.refseq_id.is_empty() {
                if let Some(summary) = xref.summary(&rec.refseq_id) {
                    rec.completeness = summary.completeness.clone();
                }
                if let Some(status) = xref.status(&rec.refseq_id) {
                    rec.status = status.to_string();
                }
            }
        }
        None => {
            rec.name2 = rec.name.clone();
            rec.gene_name = rec.name.clone();
        }
    }
    Ok(rec)
}

/// refFlat, 11 columns: geneName, name, chrom, strand, txStart, txEnd,
/// cdsStart, cdsEnd, exonCount, exonStarts, exonEnds.
fn from_ref_flat(fields: &[&str], xref: &CrossReferenceStore) -> Result<TranscriptRecord, Error> {
    let core = parse_core(fields, 3)?;
    let mut rec = record_from_core(fields[1], fields[2], core);
    rec.name2 = fields[0].to_string();
    rec.gene_name = fields[0].to_string();
    apply_refseq_annotations(&mut rec, xref);
    Ok(rec)
}

/// Plain genePred, 10 columns. The transcript name doubles as the gene name.
fn from_gene_pred(fields: &[&str], xref: &CrossReferenceStore) -> Result<TranscriptRecord, Error> {
    let core = parse_core(fields, 2)?;
    let mut rec = record_from_core(fields[0], fields[1], core);
    rec.name2 = rec.name.clone();
    rec.gene_name = rec.name.clone();
    apply_refseq_annotations(&mut rec, xref);
    Ok(rec)
}

/// Note/completeness from the summary table, status from the status table,
/// all keyed by transcript name; `refseq_id` only when the name itself is a
/// RefSeq accession.
fn apply_refseq_annotations(rec: &mut TranscriptRecord, xref: &CrossReferenceStore) {
    if let Some(summary) = xref.summary(&rec.name) {
        rec.completeness = summary.completeness.clone();
        rec.note = summary.note.clone();
    }
    if let Some(status) = xref.status(&rec.name) {
        rec.status = status.to_string();
    }
    if is_refseq_accession(&rec.name) {
        rec.refseq_id = rec.name.clone();
    }
}

/// `N[MR]_<digits>`.
fn is_refseq_accession(name: &str) -> bool {
    let rest = match name.strip_prefix("NM_").or_else(|| name.strip_prefix("NR_")) {
        Some(rest) => rest,
        None => return false,
    };
    !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Comma-separated numeric list; UCSC lists end with a trailing comma, so
/// empty segments are skipped.
fn parse_number_list(s: &str) -> Option<Vec<i64>> {
    let mut values = Vec::new();
    for part in s.split(',') {
        if part.is_empty() {
            continue;
        }
        if !is_number(part) {
            return None;
        }
        values.push(to_i64(part));
    }
    Some(values)
}

fn to_i64(s: &str) -> i64 {
    s.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xref::TableKind;

    fn gene_pred_ext_row<'a>() -> Vec<&'a str> {
        vec![
            "NM_000001", "chr1", "+", "999", "2000", "1099", "1900", "2", "999,1500,",
            "1200,2000,", "0", "GENE1", "cmpl", "cmpl", "0,2,",
        ]
    }

    #[test]
    fn dialect_by_column_count() {
        assert_eq!(
            Dialect::from_column_count(16).unwrap(),
            Dialect::GenePredExtBinned
        );
        assert_eq!(Dialect::from_column_count(15).unwrap(), Dialect::GenePredExt);
        assert_eq!(Dialect::from_column_count(12).unwrap(), Dialect::KnownGene);
        assert_eq!(Dialect::from_column_count(11).unwrap(), Dialect::RefFlat);
        assert_eq!(Dialect::from_column_count(10).unwrap(), Dialect::GenePred);
        assert!(matches!(
            Dialect::from_column_count(9),
            Err(Error::UnrecognizedColumnCount(9))
        ));
        assert!(matches!(
            Dialect::from_column_count(13),
            Err(Error::UnrecognizedColumnCount(13))
        ));
    }

    #[test]
    fn gene_pred_ext_coordinates_fixed_up() {
        let xref = CrossReferenceStore::new();
        let rec = normalize(&gene_pred_ext_row(), &xref).unwrap();

        assert_eq!(rec.name, "NM_000001");
        assert_eq!(rec.chrom, "chr1");
        assert_eq!(rec.strand, Strand::Forward);
        // starts shift by one, ends stay
        assert_eq!(rec.tx_start, 1000);
        assert_eq!(rec.tx_end, 2000);
        assert_eq!(rec.cds_start, 1100);
        assert_eq!(rec.cds_end, 1900);
        assert_eq!(rec.exon_count, 2);
        assert_eq!(rec.exon_starts, vec![1000, 1501]);
        assert_eq!(rec.exon_ends, vec![1200, 2000]);
        assert_eq!(rec.name2, "GENE1");
        assert_eq!(rec.gene_name, "GENE1");
        assert_eq!(rec.refseq_id, "NM_000001");
        assert!(rec.is_coding());
    }

    #[test]
    fn binned_row_strips_bin_column() {
        let xref = CrossReferenceStore::new();
        let mut row = vec!["585"];
        row.extend(gene_pred_ext_row());
        let rec = normalize(&row, &xref).unwrap();
        assert_eq!(rec.name, "NM_000001");
        assert_eq!(rec.tx_start, 1000);
    }

    #[test]
    fn invalid_fields_all_reported() {
        let xref = CrossReferenceStore::new();
        let row = vec![
            "NM_000001", "chr1", "*", "abc", "2000", "1099", "1900", "x", "999,1500,",
            "1200,zzz,", "0", "GENE1", "cmpl", "cmpl", "0,2,",
        ];
        match normalize(&row, &xref) {
            Err(Error::InvalidField(names)) => {
                assert_eq!(names, vec!["strand", "txStart", "exonCount", "exonEnds"]);
            }
            other => panic!("expected InvalidField, got {other:?}"),
        }
    }

    #[test]
    fn exon_list_length_mismatch_rejected() {
        let xref = CrossReferenceStore::new();
        let row = vec![
            "NM_000001", "chr1", "+", "999", "2000", "1099", "1900", "3", "999,1500,",
            "1200,2000,", "0", "GENE1", "cmpl", "cmpl", "0,2,",
        ];
        match normalize(&row, &xref) {
            Err(Error::InvalidField(names)) => {
                assert!(names.contains(&"exonStarts".to_string()));
                assert!(names.contains(&"exonEnds".to_string()));
            }
            other => panic!("expected InvalidField, got {other:?}"),
        }
    }

    #[test]
    fn alternate_name_table_overrides_name2() {
        let mut xref = CrossReferenceStore::new();
        xref.load_from(
            TableKind::EnsemblToGeneName,
            "NM_000001\tBETTER_NAME\n".as_bytes(),
        )
        .unwrap();
        let rec = normalize(&gene_pred_ext_row(), &xref).unwrap();
        assert_eq!(rec.name2, "BETTER_NAME");
        assert_eq!(rec.gene_name, "BETTER_NAME");
    }

    #[test]
    fn summary_and_status_applied() {
        let mut xref = CrossReferenceStore::new();
        xref.load_from(
            TableKind::RefSeqSummary,
            "NM_000001\tComplete5End\tsummary text\n".as_bytes(),
        )
        .unwrap();
        xref.load_from(TableKind::RefSeqStatus, "NM_000001\tValidated\n".as_bytes())
            .unwrap();
        let rec = normalize(&gene_pred_ext_row(), &xref).unwrap();
        assert_eq!(rec.completeness, "Complete5End");
        assert_eq!(rec.note, "summary text");
        assert_eq!(rec.status, "Validated");
    }

    #[test]
    fn known_gene_resolution() {
        let mut xref = CrossReferenceStore::new();
        xref.load_from(
            TableKind::KgXref,
            "uc001aaa.3\tBC032353\tP12345\tTEST_HUMAN\tDDX11L1\tNR_046018\tAAH32353\tsome description\n"
                .as_bytes(),
        )
        .unwrap();
        xref.load_from(
            TableKind::RefSeqSummary,
            "NR_046018\tPartial\tindirect note\n".as_bytes(),
        )
        .unwrap();
        xref.load_from(TableKind::RefSeqStatus, "NR_046018\tProvisional\n".as_bytes())
            .unwrap();

        let row = vec![
            "uc001aaa.3", "chr1", "+", "11873", "14409", "11873", "11873", "3",
            "11873,12612,13220,", "12227,12721,14409,", "P12345", "uc001aaa.3",
        ];
        let rec = normalize(&row, &xref).unwrap();
        assert_eq!(rec.name, "uc001aaa.3");
        assert_eq!(rec.name2, "DDX11L1");
        assert_eq!(rec.gene_name, "DDX11L1");
        assert_eq!(rec.note, "some description");
        assert_eq!(rec.refseq_id, "NR_046018");
        assert_eq!(rec.swissprot_id, "P12345");
        assert_eq!(rec.swissprot_display_id, "TEST_HUMAN");
        assert_eq!(rec.protein_accession, "AAH32353");
        // status/completeness via the resolved refseq id
        assert_eq!(rec.completeness, "Partial");
        assert_eq!(rec.status, "Provisional");
        // empty half-open CDS span: non-coding
        assert!(!rec.is_coding());
    }

    #[test]
    fn known_gene_without_xref_falls_back_to_raw_id() {
        let xref = CrossReferenceStore::new();
        let row = vec![
            "uc999zzz.9", "chr2", "-", "100", "500", "100", "100", "1", "100,", "500,",
            "", "uc999zzz.9",
        ];
        let rec = normalize(&row, &xref).unwrap();
        assert_eq!(rec.name2, "uc999zzz.9");
        assert_eq!(rec.gene_name, "uc999zzz.9");
    }

    #[test]
    fn ref_flat_gene_name_column() {
        let xref = CrossReferenceStore::new();
        let row = vec![
            "MYGENE", "NM_000002", "chr3", "-", "5000", "9000", "5100", "8900", "2",
            "5000,7000,", "6000,9000,",
        ];
        let rec = normalize(&row, &xref).unwrap();
        assert_eq!(rec.name, "NM_000002");
        assert_eq!(rec.name2, "MYGENE");
        assert_eq!(rec.gene_name, "MYGENE");
        assert_eq!(rec.refseq_id, "NM_000002");
        assert_eq!(rec.strand, Strand::Reverse);
    }

    #[test]
    fn gene_pred_reuses_name() {
        let xref = CrossReferenceStore::new();
        let row = vec![
            "mir-21", "chr17", "+", "100", "200", "100", "100", "1", "100,", "200,",
        ];
        let rec = normalize(&row, &xref).unwrap();
        assert_eq!(rec.name2, "mir-21");
        assert_eq!(rec.gene_name, "mir-21");
        assert!(!rec.is_coding());
        assert_eq!(rec.noncoding_kind(), crate::kind::NcRnaKind::MiRna);
    }

    #[test]
    fn noncoding_subtype_prefixes() {
        let mut rec = TranscriptRecord {
            cds_start: 101,
            cds_end: 100,
            ..Default::default()
        };
        assert!(!rec.is_coding());
        for (name, kind) in [
            ("mirXYZ", crate::kind::NcRnaKind::MiRna),
            ("snrXYZ", crate::kind::NcRnaKind::SnRna),
            ("snoXYZ", crate::kind::NcRnaKind::SnoRna),
            ("XYZ", crate::kind::NcRnaKind::Other),
        ] {
            rec.name2 = name.to_string();
            assert_eq!(rec.noncoding_kind(), kind, "failed for '{name}'");
        }
    }

    #[test]
    fn refseq_accession_pattern() {
        assert!(is_refseq_accession("NM_000001"));
        assert!(is_refseq_accession("NR_046018"));
        assert!(!is_refseq_accession("NP_000001"));
        assert!(!is_refseq_accession("NM_000001.2"));
        assert!(!is_refseq_accession("NM_"));
        assert!(!is_refseq_accession("ENST00000456328"));
    }
}
