//! Feature tree nodes and the arena that owns them.
//!
//! Subfeatures can be shared between transcripts of one gene, so nodes are
//! owned by a `FeatureArena` and referenced by `FeatureId`. A shared exon is
//! the same arena slot held by several parents; attribute mutations made
//! through one parent are visible to all of them.

use crate::interval::GenomicInterval;
use crate::kind::FeatureKind;

/// Index of a feature in a `FeatureArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureId(usize);

/// Ordered multimap of string attributes. Repeated keys are permitted
/// (e.g. multiple `Dbxref` entries); insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    /// Append a key/value pair unconditionally.
    pub fn add(&mut self, key: &str, value: impl Into<String>) {
        self.0.push((key.to_string(), value.into()));
    }

    /// Append a key/value pair unless that exact pair is already present.
    /// Returns whether the pair was added. This is what keeps shared
    /// subfeatures from accumulating duplicate tags when several transcripts
    /// of one gene merge the same annotations onto them.
    pub fn add_unique(&mut self, key: &str, value: &str) -> bool {
        if self.values_of(key).any(|v| v == value) {
            return false;
        }
        self.add(key, value);
        true
    }

    /// First value recorded under `key`, if any.
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        self.values_of(key).next()
    }

    /// All values recorded under `key`, in insertion order.
    pub fn values_of<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a str> + 'a {
        let key = key.to_owned();
        self.0
            .iter()
            .filter(move |(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All pairs, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A node in the output feature tree.
///
/// Children are held by id in construction order, which is not necessarily
/// coordinate order. No back-reference to the parent is stored; the parent
/// relationship exists only as a `Parent` attribute carrying the parent's
/// primary id, which is all that serialization needs.
#[derive(Debug, Clone)]
pub struct Feature {
    pub interval: GenomicInterval,
    pub kind: FeatureKind,
    /// Source-supplied type label overriding `kind.label()` for display,
    /// e.g. a biotype string used verbatim.
    pub kind_label: Option<String>,
    pub source: String,
    pub display_name: String,
    /// Globally unique within a parse session.
    pub primary_id: String,
    /// Reading-frame phase, set only on CDS segments.
    pub phase: Option<u8>,
    pub attributes: Attributes,
    pub children: Vec<FeatureId>,
}

impl Feature {
    #[must_use]
    pub fn new(kind: FeatureKind, interval: GenomicInterval, source: &str) -> Self {
        Self {
            interval,
            kind,
            kind_label: None,
            source: source.to_string(),
            display_name: String::new(),
            primary_id: String::new(),
            phase: None,
            attributes: Attributes::default(),
            children: Vec::new(),
        }
    }

    /// Type label for output: the source-supplied label when present,
    /// otherwise the structural kind's label.
    #[must_use]
    pub fn type_label(&self) -> &str {
        self.kind_label.as_deref().unwrap_or(self.kind.label())
    }
}

/// Owns every feature created during a parse session.
#[derive(Debug, Default)]
pub struct FeatureArena {
    nodes: Vec<Feature>,
}

impl FeatureArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, feature: Feature) -> FeatureId {
        let id = FeatureId(self.nodes.len());
        self.nodes.push(feature);
        id
    }

    #[must_use]
    pub fn get(&self, id: FeatureId) -> &Feature {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: FeatureId) -> &mut Feature {
        &mut self.nodes[id.0]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All features with their ids, in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, &Feature)> {
        self.nodes.iter().enumerate().map(|(i, f)| (FeatureId(i), f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strand::Strand;

    fn make_feature(kind: FeatureKind) -> Feature {
        Feature::new(
            kind,
            GenomicInterval::new("chr1", 100, 200, Strand::Forward),
            "test",
        )
    }

    #[test]
    fn attributes_preserve_order_and_repeats() {
        let mut attrs = Attributes::default();
        attrs.add("Dbxref", "RefSeq:NM_000001");
        attrs.add("Note", "a note");
        attrs.add("Dbxref", "Swiss-Prot:P12345");
        assert_eq!(
            attrs.values_of("Dbxref").collect::<Vec<_>>(),
            ["RefSeq:NM_000001", "Swiss-Prot:P12345"]
        );
        assert_eq!(attrs.first("Note"), Some("a note"));
        assert_eq!(attrs.len(), 3);
    }

    #[test]
    fn add_unique_skips_exact_duplicates() {
        let mut attrs = Attributes::default();
        assert!(attrs.add_unique("Dbxref", "RefSeq:NM_000001"));
        assert!(!attrs.add_unique("Dbxref", "RefSeq:NM_000001"));
        // same key, different value is fine
        assert!(attrs.add_unique("Dbxref", "RefSeq:NP_000001"));
        assert_eq!(attrs.values_of("Dbxref").count(), 2);
    }

    #[test]
    fn arena_identity() {
        let mut arena = FeatureArena::new();
        let a = arena.alloc(make_feature(FeatureKind::Gene));
        let b = arena.alloc(make_feature(FeatureKind::Exon));
        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);

        // mutation through one handle is visible through the same id
        arena.get_mut(b).attributes.add("Note", "shared");
        assert_eq!(arena.get(b).attributes.first("Note"), Some("shared"));
    }

    #[test]
    fn type_label_override() {
        let mut f = make_feature(FeatureKind::Transcript);
        assert_eq!(f.type_label(), "transcript");
        f.kind_label = Some("misc_RNA".to_string());
        assert_eq!(f.type_label(), "misc_RNA");
    }
}
