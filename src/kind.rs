//! Structural feature kinds for the output tree.
//!
//! Kinds are a closed enum so the assembler can match on structure; the raw
//! biotype text a source supplies is carried separately (as the feature's
//! kind label and a biotype attribute), preserving free-text fidelity.

use std::fmt;

/// Subtype of a non-coding transcript, inferred from the gene-level name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NcRnaKind {
    MiRna,
    SnRna,
    SnoRna,
    Other,
}

impl NcRnaKind {
    /// Case-insensitive prefix classification: `mir*` → miRNA, `snr*` →
    /// snRNA, `sno*` → snoRNA, anything else → generic ncRNA.
    #[must_use]
    pub fn from_gene_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.starts_with("mir") {
            Self::MiRna
        } else if lower.starts_with("snr") {
            Self::SnRna
        } else if lower.starts_with("sno") {
            Self::SnoRna
        } else {
            Self::Other
        }
    }
}

/// Structural kind of a feature node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Gene,
    MessengerRna,
    NonCodingRna(NcRnaKind),
    /// Generic transcript, used when a biotype table supplies a finer label
    /// that is neither protein-coding nor a recognized RNA class.
    Transcript,
    Exon,
    Cds,
    FivePrimeUtr,
    ThreePrimeUtr,
    StartCodon,
    StopCodon,
}

impl FeatureKind {
    /// GFF3-style type label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Gene => "gene",
            Self::MessengerRna => "mRNA",
            Self::NonCodingRna(NcRnaKind::MiRna) => "miRNA",
            Self::NonCodingRna(NcRnaKind::SnRna) => "snRNA",
            Self::NonCodingRna(NcRnaKind::SnoRna) => "snoRNA",
            Self::NonCodingRna(NcRnaKind::Other) => "ncRNA",
            Self::Transcript => "transcript",
            Self::Exon => "exon",
            Self::Cds => "CDS",
            Self::FivePrimeUtr => "five_prime_UTR",
            Self::ThreePrimeUtr => "three_prime_UTR",
            Self::StartCodon => "start_codon",
            Self::StopCodon => "stop_codon",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
