use std::io::BufRead;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use genefold::assembler::AssemblySession;
use genefold::cli;
use genefold::options::AssemblyOptions;
use genefold::record;
use genefold::xref::{self, CrossReferenceStore, TableKind};

#[derive(Parser)]
#[command(
    name = "assemble",
    about = "Assemble a UCSC genePred-family table into a gene feature tree"
)]
struct Cli {
    /// Gene table to assemble (genePred, refFlat, knownGene, or extended
    /// genePred; gzip auto-detected)
    table: PathBuf,

    /// UCSC kgXref table (knownGene name resolution)
    #[arg(long = "kg-xref")]
    kg_xref: Option<PathBuf>,

    /// RefSeq summary table (completeness and notes)
    #[arg(long = "refseq-summary")]
    refseq_summary: Option<PathBuf>,

    /// RefSeq status table
    #[arg(long = "refseq-status")]
    refseq_status: Option<PathBuf>,

    /// Ensembl transcript-to-gene-name table
    #[arg(long = "ensembl-genes")]
    ensembl_genes: Option<PathBuf>,

    /// Ensembl transcript source (biotype) table
    #[arg(long = "ensembl-source")]
    ensembl_source: Option<PathBuf>,

    /// JSON options file overriding the default assembly toggles
    #[arg(short = 'O', long = "options")]
    options: Option<PathBuf>,
}

fn main() -> Result<()> {
    let start = Instant::now();
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    cli::banner("Assemble");

    // ── Configuration ────────────────────────────────────
    cli::section("Configuration");

    let options = match args.options {
        Some(ref path) => AssemblyOptions::from_file(path)?,
        None => AssemblyOptions::default(),
    };

    cli::kv("Table", &args.table.display().to_string());
    cli::kv("Source", &options.source);
    cli::kv("Genes", if options.group_genes { "grouped" } else { "bare transcripts" });
    cli::kv("Sharing", if options.share { "on" } else { "off" });

    eprintln!();

    // ── Cross-references ─────────────────────────────────
    let side_tables = [
        (TableKind::KgXref, "kgXref", &args.kg_xref),
        (TableKind::RefSeqSummary, "RefSeq summary", &args.refseq_summary),
        (TableKind::RefSeqStatus, "RefSeq status", &args.refseq_status),
        (TableKind::EnsemblToGeneName, "Ensembl genes", &args.ensembl_genes),
        (TableKind::EnsemblSource, "Ensembl source", &args.ensembl_source),
    ];

    let mut store = CrossReferenceStore::new();
    if side_tables.iter().any(|(_, _, path)| path.is_some()) {
        cli::section("Cross-references");
        for (kind, label, path) in &side_tables {
            if let Some(path) = path {
                let rows = store
                    .load(*kind, path)
                    .with_context(|| format!("failed to load {label}: {}", path.display()))?;
                cli::kv(label, &format!("{rows} rows"));
            }
        }
        eprintln!();
    }

    // ── Assembly ─────────────────────────────────────────
    cli::section("Assembly");

    let reader = xref::open_table(&args.table)
        .with_context(|| format!("failed to open table: {}", args.table.display()))?;

    let mut session = AssemblySession::new();
    let mut rows = 0usize;
    let mut skipped = 0usize;

    for line_result in reader.lines() {
        let line = line_result?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        match record::normalize(&fields, &store) {
            Ok(rec) => {
                if options.group_genes {
                    session.build_gene(&rec, &store, &options);
                } else {
                    session.build_transcript(&rec, None, &store, &options);
                }
                rows += 1;
            }
            Err(e) => {
                cli::warning(&format!("row {}: {e}", rows + skipped + 1));
                skipped += 1;
            }
        }
    }

    cli::kv("Rows", &rows.to_string());
    if skipped > 0 {
        cli::kv("Skipped", &skipped.to_string());
    }

    let counts = session.kind_counts();
    for label in [
        "gene",
        "mRNA",
        "miRNA",
        "snRNA",
        "snoRNA",
        "ncRNA",
        "transcript",
        "exon",
        "five_prime_UTR",
        "three_prime_UTR",
        "start_codon",
        "stop_codon",
        "CDS",
    ] {
        if let Some(n) = counts.get(label) {
            cli::kv(label, &n.to_string());
        }
    }
    cli::success("assembly complete");

    // ── Summary ──────────────────────────────────────────
    cli::print_summary(start, session.arena.len());
    Ok(())
}
