//! Feature assembly: turns normalized transcript records into a
//! gene → transcript → exon/CDS/UTR/codon feature tree.
//!
//! All session state (the arena, the gene index, the two identifier
//! registries) is held in one `AssemblySession` value threaded through every
//! call. Assembly is strictly sequential: one record is fully materialized
//! before the next is processed.

use std::collections::HashMap;

use tracing::warn;

use crate::feature::{Feature, FeatureArena, FeatureId};
use crate::interval::GenomicInterval;
use crate::kind::FeatureKind;
use crate::options::AssemblyOptions;
use crate::record::TranscriptRecord;
use crate::registry::IdentifierRegistry;
use crate::xref::CrossReferenceStore;

/// Per-session assembly state. Created once per parse session, mutated on
/// every record, discarded with the session.
#[derive(Debug, Default)]
pub struct AssemblySession {
    pub arena: FeatureArena,
    /// Gene name → candidate genes sharing that name. Distinct genes can
    /// share a textual name on different chromosomes or strands, so this is
    /// keyed by name, not id.
    gene_index: HashMap<String, Vec<FeatureId>>,
    gene_ids: IdentifierRegistry,
    transcript_ids: IdentifierRegistry,
}

impl AssemblySession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build (or extend) the gene owning `record`'s transcript and attach a
    /// freshly built transcript to it. Returns the gene's id.
    pub fn build_gene(
        &mut self,
        record: &TranscriptRecord,
        xref: &CrossReferenceStore,
        options: &AssemblyOptions,
    ) -> FeatureId {
        // A candidate gene owns this transcript only when chromosome,
        // strand, and span all agree. First match wins; genes are kept
        // disjoint per locus.
        let existing = self.gene_index.get(&record.gene_name).and_then(|cands| {
            cands.iter().copied().find(|&id| {
                self.arena.get(id).interval.same_locus(
                    &record.chrom,
                    record.strand,
                    record.tx_start,
                    record.tx_end,
                )
            })
        });

        let gene_id = match existing {
            Some(id) => {
                // genes only ever grow
                self.arena
                    .get_mut(id)
                    .interval
                    .extend(record.tx_start, record.tx_end);
                id
            }
            None => {
                let mut gene = Feature::new(
                    FeatureKind::Gene,
                    GenomicInterval::new(
                        &record.chrom,
                        record.tx_start,
                        record.tx_end,
                        record.strand,
                    ),
                    &options.source,
                );
                gene.primary_id = self.gene_ids.uniquify(&record.name2);
                gene.display_name = record.name2.clone();
                if record.name2 != record.gene_name {
                    gene.attributes.add("Alias", record.gene_name.clone());
                }
                let id = self.arena.alloc(gene);
                self.gene_index
                    .entry(record.gene_name.clone())
                    .or_default()
                    .push(id);
                id
            }
        };

        let tx_id = self.build_transcript(record, Some(gene_id), xref, options);
        let gene_primary = self.arena.get(gene_id).primary_id.clone();
        self.arena
            .get_mut(tx_id)
            .attributes
            .add("Parent", gene_primary);
        self.arena.get_mut(gene_id).children.push(tx_id);
        merge_record_attributes(self.arena.get_mut(gene_id), record);
        gene_id
    }

    /// Build one transcript feature with its toggled children. When
    /// `owning_gene` is `None` the transcript is a bare top-level feature
    /// (no gene grouping) and no sharing can apply.
    pub fn build_transcript(
        &mut self,
        record: &TranscriptRecord,
        owning_gene: Option<FeatureId>,
        xref: &CrossReferenceStore,
        options: &AssemblyOptions,
    ) -> FeatureId {
        let (kind, kind_label, biotype) = transcript_kind(record, xref);
        let mut tx = Feature::new(
            kind,
            GenomicInterval::new(&record.chrom, record.tx_start, record.tx_end, record.strand),
            &options.source,
        );
        tx.kind_label = kind_label;
        tx.primary_id = self.transcript_ids.uniquify(&record.name);
        tx.display_name = record.name.clone();
        if record.gene_name != record.name2 {
            tx.attributes.add("Alias", record.gene_name.clone());
        }
        if let Some(bt) = biotype {
            tx.attributes.add("biotype", bt);
        }
        merge_record_attributes(&mut tx, record);
        tx.attributes.add("completeness", record.completeness.clone());
        tx.attributes.add("status", record.status.clone());
        let tx_id = self.arena.alloc(tx);

        if options.exons {
            self.build_exons(record, tx_id, owning_gene, options);
        }
        if record.is_coding() {
            if options.utrs {
                self.build_utrs(record, tx_id, owning_gene, options);
            }
            if options.codons {
                self.build_codons(record, tx_id, owning_gene, options);
            }
            if options.cds {
                self.build_cds_segments(record, tx_id, options);
            }
        }
        tx_id
    }

    fn build_exons(
        &mut self,
        record: &TranscriptRecord,
        tx_id: FeatureId,
        owning_gene: Option<FeatureId>,
        options: &AssemblyOptions,
    ) {
        for i in 0..record.exon_count {
            let number = display_number(record, i);
            self.attach_subfeature(
                tx_id,
                owning_gene,
                options,
                FeatureKind::Exon,
                record.exon_starts[i],
                record.exon_ends[i],
                record,
                &format!(".exon{number}"),
            );
        }
    }

    /// Partition each exon against the CDS span into untranslated regions.
    /// Which physical UTR a flank represents depends on strand: the flank
    /// upstream of the CDS in genomic coordinates is 5' on the forward
    /// strand and 3' on the reverse strand.
    fn build_utrs(
        &mut self,
        record: &TranscriptRecord,
        tx_id: FeatureId,
        owning_gene: Option<FeatureId>,
        options: &AssemblyOptions,
    ) {
        let (cs, ce) = (record.cds_start, record.cds_end);
        let (left_kind, right_kind) = if record.strand.is_reverse() {
            (FeatureKind::ThreePrimeUtr, FeatureKind::FivePrimeUtr)
        } else {
            (FeatureKind::FivePrimeUtr, FeatureKind::ThreePrimeUtr)
        };

        for i in 0..record.exon_count {
            let number = display_number(record, i);
            let (es, ee) = (record.exon_starts[i], record.exon_ends[i]);

            if es <= ee && es < cs && ee > ce {
                // exon contains the whole CDS: one UTR on each flank
                self.attach_subfeature(
                    tx_id,
                    owning_gene,
                    options,
                    left_kind,
                    es,
                    cs - 1,
                    record,
                    &format!(".utr{number}"),
                );
                self.attach_subfeature(
                    tx_id,
                    owning_gene,
                    options,
                    right_kind,
                    ce + 1,
                    ee,
                    record,
                    &format!(".utr{number}a"),
                );
            } else if es <= ee && ee < cs {
                // exon entirely upstream of the CDS
                self.attach_subfeature(
                    tx_id,
                    owning_gene,
                    options,
                    left_kind,
                    es,
                    ee,
                    record,
                    &format!(".utr{number}"),
                );
            } else if es <= ee && es < cs {
                // exon straddles the CDS start only
                self.attach_subfeature(
                    tx_id,
                    owning_gene,
                    options,
                    left_kind,
                    es,
                    cs - 1,
                    record,
                    &format!(".utr{number}"),
                );
            } else if es <= ee && es >= cs && ee <= ce {
                // CDS-only exon, no UTR
            } else if es <= ee && es <= ce && ee > ce {
                // exon straddles the CDS end only
                self.attach_subfeature(
                    tx_id,
                    owning_gene,
                    options,
                    right_kind,
                    ce + 1,
                    ee,
                    record,
                    &format!(".utr{number}"),
                );
            } else if es <= ee && es > ce {
                // exon entirely downstream of the CDS
                self.attach_subfeature(
                    tx_id,
                    owning_gene,
                    options,
                    right_kind,
                    es,
                    ee,
                    record,
                    &format!(".utr{number}"),
                );
            } else {
                // data error, not a program error: skip this exon only
                warn!(
                    exon_start = es,
                    exon_end = ee,
                    cds_start = cs,
                    cds_end = ce,
                    "exon geometry matches no UTR case, skipping"
                );
            }
        }
    }

    /// Emit one CDS segment per CDS-overlapping exon, walking exons in
    /// 5'→3' order so the reading-frame phase can be propagated. CDS
    /// features are never shared and never merged across adjacent exons.
    fn build_cds_segments(
        &mut self,
        record: &TranscriptRecord,
        tx_id: FeatureId,
        options: &AssemblyOptions,
    ) {
        let (cs, ce) = (record.cds_start, record.cds_end);
        let mut phase: u8 = 0;

        for i in 0..record.exon_count {
            // the strand-flipped index walks exons 5'→3' on either strand
            let j = display_number(record, i);
            let (es, ee) = (record.exon_starts[j], record.exon_ends[j]);
            if ee < cs || es > ce {
                continue;
            }
            let (seg_start, seg_end) = (es.max(cs), ee.min(ce));
            if seg_start > seg_end {
                warn!(
                    exon_start = es,
                    exon_end = ee,
                    cds_start = cs,
                    cds_end = ce,
                    "exon geometry matches no CDS case, skipping"
                );
                continue;
            }

            let tx_primary = self.arena.get(tx_id).primary_id.clone();
            let tx_display = self.arena.get(tx_id).display_name.clone();
            let mut cds = Feature::new(
                FeatureKind::Cds,
                GenomicInterval::new(&record.chrom, seg_start, seg_end, record.strand),
                &options.source,
            );
            // the label keeps the untransformed loop index even though
            // content order is 5'→3'
            cds.primary_id = format!("{tx_primary}.cds{i}");
            cds.display_name = format!("{tx_display}.cds{i}");
            cds.phase = Some(phase);
            let id = self.arena.alloc(cds);
            self.arena.get_mut(tx_id).children.push(id);

            // the update applies to the next segment, not this one
            let len = seg_end - seg_start + 1;
            phase = ((i64::from(phase) + (3 - len % 3)) % 3) as u8;
        }
    }

    /// Two 3-bp codon features flanking the CDS. On the reverse strand the
    /// roles swap: the stop codon sits at the low end.
    fn build_codons(
        &mut self,
        record: &TranscriptRecord,
        tx_id: FeatureId,
        owning_gene: Option<FeatureId>,
        options: &AssemblyOptions,
    ) {
        let (cs, ce) = (record.cds_start, record.cds_end);
        let (low_kind, high_kind) = if record.strand.is_reverse() {
            (FeatureKind::StopCodon, FeatureKind::StartCodon)
        } else {
            (FeatureKind::StartCodon, FeatureKind::StopCodon)
        };
        self.attach_subfeature(
            tx_id,
            owning_gene,
            options,
            low_kind,
            cs,
            cs + 2,
            record,
            codon_suffix(low_kind),
        );
        self.attach_subfeature(
            tx_id,
            owning_gene,
            options,
            high_kind,
            ce - 2,
            ce,
            record,
            codon_suffix(high_kind),
        );
    }

    /// Attach a subfeature to `tx_id`, re-using an identical instance from a
    /// sibling transcript when sharing is on. Identity is kind + (start,
    /// end); re-use attaches the same arena slot, so later attribute
    /// mutations are visible to every owner.
    #[allow(clippy::too_many_arguments)]
    fn attach_subfeature(
        &mut self,
        tx_id: FeatureId,
        owning_gene: Option<FeatureId>,
        options: &AssemblyOptions,
        kind: FeatureKind,
        start: i64,
        end: i64,
        record: &TranscriptRecord,
        suffix: &str,
    ) -> FeatureId {
        let shared = if options.share {
            owning_gene.and_then(|gene| self.find_shared(gene, kind, start, end))
        } else {
            None
        };

        let id = match shared {
            Some(id) => id,
            None => {
                let tx_primary = self.arena.get(tx_id).primary_id.clone();
                let tx_display = self.arena.get(tx_id).display_name.clone();
                let mut feature = Feature::new(
                    kind,
                    GenomicInterval::new(&record.chrom, start, end, record.strand),
                    &options.source,
                );
                feature.primary_id = format!("{tx_primary}{suffix}");
                feature.display_name = format!("{tx_display}{suffix}");
                self.arena.alloc(feature)
            }
        };
        self.arena.get_mut(tx_id).children.push(id);
        id
    }

    /// Search the transcripts already attached to `gene` for a subfeature of
    /// identical kind and coordinates.
    fn find_shared(
        &self,
        gene: FeatureId,
        kind: FeatureKind,
        start: i64,
        end: i64,
    ) -> Option<FeatureId> {
        for &tx in &self.arena.get(gene).children {
            for &child in &self.arena.get(tx).children {
                let c = self.arena.get(child);
                if c.kind == kind && c.interval.start == start && c.interval.end == end {
                    return Some(child);
                }
            }
        }
        None
    }

    /// Tally of features per structural kind label, for reporting.
    #[must_use]
    pub fn kind_counts(&self) -> HashMap<&'static str, usize> {
        let mut counts: HashMap<&'static str, usize> = HashMap::new();
        for (_, feature) in self.arena.iter() {
            *counts.entry(feature.kind.label()).or_default() += 1;
        }
        counts
    }
}

/// Display numbering is always 5'→3': the forward strand counts up from the
/// first exon pair, the reverse strand counts down.
fn display_number(record: &TranscriptRecord, i: usize) -> usize {
    if record.strand.is_reverse() {
        record.exon_count - 1 - i
    } else {
        i
    }
}

fn codon_suffix(kind: FeatureKind) -> &'static str {
    match kind {
        FeatureKind::StartCodon => ".start_codon",
        _ => ".stop_codon",
    }
}

/// Structural kind for a transcript, refined by the biotype side table.
/// Returns (kind, verbatim kind label, biotype attribute value).
fn transcript_kind(
    record: &TranscriptRecord,
    xref: &CrossReferenceStore,
) -> (FeatureKind, Option<String>, Option<String>) {
    let base = if record.is_coding() {
        FeatureKind::MessengerRna
    } else {
        FeatureKind::NonCodingRna(record.noncoding_kind())
    };

    let biotype = match xref.biotype(&record.name) {
        Some(bt) if !bt.is_empty() => bt,
        _ => return (base, None, None),
    };

    let lower = biotype.to_ascii_lowercase();
    if is_protein_coding_label(&lower) {
        (FeatureKind::MessengerRna, None, Some(biotype.to_string()))
    } else if lower.contains("rna") || lower.contains("transcript") {
        // a recognizable RNA class: use the source's own label verbatim
        (base, Some(biotype.to_string()), None)
    } else {
        (FeatureKind::Transcript, None, Some(biotype.to_string()))
    }
}

/// Matches "protein" and "coding" joined by exactly one separator character,
/// e.g. `protein_coding` or `protein coding`.
fn is_protein_coding_label(lower: &str) -> bool {
    const HEAD: &[u8] = b"protein";
    const TAIL: &[u8] = b"coding";
    let bytes = lower.as_bytes();
    let need = HEAD.len() + 1 + TAIL.len();
    if bytes.len() < need {
        return false;
    }
    (0..=bytes.len() - need).any(|i| {
        &bytes[i..i + HEAD.len()] == HEAD
            && &bytes[i + HEAD.len() + 1..i + need] == TAIL
    })
}

/// Append annotation tags from the record onto a gene or transcript, each
/// only when non-empty and not already present with the exact same value.
fn merge_record_attributes(feature: &mut Feature, record: &TranscriptRecord) {
    if !record.note.is_empty() {
        feature.attributes.add_unique("Note", &record.note);
    }
    if !record.refseq_id.is_empty() {
        feature
            .attributes
            .add_unique("Dbxref", &format!("RefSeq:{}", record.refseq_id));
    }
    if !record.swissprot_id.is_empty() {
        feature
            .attributes
            .add_unique("Dbxref", &format!("Swiss-Prot:{}", record.swissprot_id));
    }
    if !record.swissprot_display_id.is_empty() {
        feature
            .attributes
            .add_unique("swiss-prot_display_id", &record.swissprot_display_id);
    }
    if !record.protein_accession.is_empty() {
        feature
            .attributes
            .add_unique("Dbxref", &format!("RefSeq:{}", record.protein_accession));
    }
}
