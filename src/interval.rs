//! Genomic intervals in 1-based closed coordinates.

use crate::strand::Strand;

/// A genomic interval, 1-based and closed on both ends (`start <= end`).
///
/// Source dialects that use 0-based half-open coordinates are converted at
/// ingestion by incrementing the start; everything downstream of the
/// normalizer works in this one convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomicInterval {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
}

impl GenomicInterval {
    #[must_use]
    pub fn new(chrom: &str, start: i64, end: i64, strand: Strand) -> Self {
        Self {
            chrom: chrom.to_string(),
            start,
            end,
            strand,
        }
    }

    /// Closed-interval overlap test against `[start, end]`.
    #[must_use]
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        !(self.start > end || self.end < start)
    }

    /// Grow this interval to the union with `[start, end]`. Used by gene
    /// aggregation, where gene spans only ever grow.
    pub fn extend(&mut self, start: i64, end: i64) {
        self.start = self.start.min(start);
        self.end = self.end.max(end);
    }

    /// Whether a transcript at `[start, end]` on `chrom`/`strand` belongs to
    /// the same locus: same chromosome, same strand, overlapping span. Genes
    /// sharing a textual name on different chromosomes or strands, or far
    /// apart on one chromosome, must not be merged.
    #[must_use]
    pub fn same_locus(&self, chrom: &str, strand: Strand, start: i64, end: i64) -> bool {
        self.chrom == chrom && self.strand == strand && self.overlaps(start, end)
    }

    #[must_use]
    pub fn len(&self) -> i64 {
        self.end - self.start + 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(start: i64, end: i64) -> GenomicInterval {
        GenomicInterval::new("chr1", start, end, Strand::Forward)
    }

    #[test]
    fn overlap() {
        let a = iv(100, 200);
        assert!(a.overlaps(150, 250));
        assert!(a.overlaps(200, 300)); // abutting at the closed end
        assert!(a.overlaps(50, 100));
        assert!(!a.overlaps(201, 300));
        assert!(!a.overlaps(1, 99));
    }

    #[test]
    fn extend_is_union() {
        let mut a = iv(100, 200);
        a.extend(150, 300);
        assert_eq!((a.start, a.end), (100, 300));
        a.extend(50, 60);
        assert_eq!((a.start, a.end), (50, 300));
        // a contained interval changes nothing
        a.extend(100, 200);
        assert_eq!((a.start, a.end), (50, 300));
    }

    #[test]
    fn same_locus_requires_all_three() {
        let a = iv(100, 200);
        assert!(a.same_locus("chr1", Strand::Forward, 150, 250));
        assert!(!a.same_locus("chr2", Strand::Forward, 150, 250));
        assert!(!a.same_locus("chr1", Strand::Reverse, 150, 250));
        assert!(!a.same_locus("chr1", Strand::Forward, 300, 400));
    }

    #[test]
    fn closed_length() {
        assert_eq!(iv(100, 100).len(), 1);
        assert_eq!(iv(1000, 1200).len(), 201);
    }
}
