//! Shared console output helpers for genefold binaries.

use std::time::{Duration, Instant};

use colored::Colorize;

pub fn banner(subtitle: &str) {
    eprintln!();
    eprintln!("{} {}", "genefold".bold().cyan(), subtitle.dimmed());
    eprintln!();
}

pub fn section(title: &str) {
    let bar = "─".repeat(50);
    eprintln!("{} {}", title.bold().blue(), bar.dimmed());
}

pub fn kv(key: &str, value: &str) {
    eprintln!("  {:<20} {}", key.dimmed(), value);
}

pub fn success(msg: &str) {
    eprintln!("  {} {}", "✓".green().bold(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("  {} {}", "⚠".yellow(), msg.yellow());
}

pub fn print_summary(start: Instant, features: usize) {
    eprintln!();
    eprintln!(
        "{}  {}\n{}  {}\n{}  {}",
        "Features".dimmed(),
        features.to_string().bold(),
        "Time".dimmed(),
        format_elapsed(start.elapsed()).bold(),
        "Peak memory".dimmed(),
        peak_memory_bytes()
            .map(format_bytes)
            .unwrap_or_else(|| "N/A".to_string())
            .bold(),
    );
    eprintln!();
}

/// Formats a duration as HH:MM:SS.d (tenths of a second).
#[must_use]
pub fn format_elapsed(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let tenths = d.subsec_millis() / 100;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{tenths}")
}

/// Returns peak resident set size in bytes, or None if unavailable.
#[must_use]
pub fn peak_memory_bytes() -> Option<u64> {
    #[cfg(any(target_os = "macos", target_os = "linux"))]
    {
        use std::mem::MaybeUninit;
        let mut usage = MaybeUninit::<libc::rusage>::uninit();
        // SAFETY: `getrusage` with `RUSAGE_SELF` and a valid pointer to an
        // uninitialized `rusage` struct is well-defined. The pointer is valid
        // because `MaybeUninit` guarantees proper alignment and size.
        let ret = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
        if ret == 0 {
            // SAFETY: `getrusage` returned 0 (success), which guarantees the
            // `rusage` struct has been fully initialized.
            let usage = unsafe { usage.assume_init() };
            let bytes = if cfg!(target_os = "macos") {
                // macOS: ru_maxrss is in bytes
                usage.ru_maxrss as u64
            } else {
                // Linux: ru_maxrss is in kilobytes
                usage.ru_maxrss as u64 * 1024
            };
            return Some(bytes);
        }
    }
    None
}

/// Formats a byte count as a human-readable string (B, KB, MB, GB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * 1024 * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
