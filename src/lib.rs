//! Genefold assembles UCSC genePred-family gene tables into a structured
//! gene → transcript → exon/CDS/UTR/codon feature tree.

pub mod assembler;
pub mod cli;
pub mod error;
pub mod feature;
pub mod interval;
pub mod kind;
pub mod options;
pub mod record;
pub mod registry;
pub mod strand;
pub mod xref;

pub use error::Error;
