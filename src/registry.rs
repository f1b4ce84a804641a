//! Unique-identifier assignment for genes and transcripts.

use std::collections::HashMap;

/// Process-scoped counters guaranteeing globally unique feature identifiers
/// within one parse session.
///
/// Bases are compared case-insensitively, but the returned identifier keeps
/// the caller's original casing. Gene and transcript identifiers live in
/// separate registry instances so the two namespaces never collide with each
/// other.
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    counters: HashMap<String, u32>,
}

impl IdentifierRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// First call for a base returns it unchanged; every subsequent call
    /// returns `"{base}.{n}"` with n counting up from 1.
    pub fn uniquify(&mut self, base: &str) -> String {
        let key = base.to_ascii_lowercase();
        match self.counters.get_mut(&key) {
            None => {
                self.counters.insert(key, 0);
                base.to_string()
            }
            Some(count) => {
                *count += 1;
                format!("{base}.{count}")
            }
        }
    }
}
