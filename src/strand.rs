//! Strand orientation for genomic features.

use std::fmt;

/// Strand orientation of a genomic feature.
///
/// Gene tables use `.` for features with no meaningful orientation, so
/// `Unknown` is a first-class value rather than a parse failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
    #[default]
    Unknown,
}

impl Strand {
    /// Parse the strand column of a gene table. Only `+`, `-`, and `.` are
    /// valid; anything else is rejected so the normalizer can report the
    /// field as invalid.
    #[must_use]
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "+" => Some(Self::Forward),
            "-" => Some(Self::Reverse),
            "." => Some(Self::Unknown),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_reverse(self) -> bool {
        self == Self::Reverse
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "+"),
            Self::Reverse => write!(f, "-"),
            Self::Unknown => write!(f, "."),
        }
    }
}
