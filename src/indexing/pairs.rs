//! Deduplicated candidate record pairs

use ahash::{AHashMap, AHashSet};

/// Candidate pairs keyed by the smaller identifier
///
/// Every unordered pair is stored once as `id1 -> {id2}` with `id1 < id2`
/// in lexicographic order; self-pairs are never stored.
#[derive(Debug, Clone, Default)]
pub struct CandidatePairs {
    pairs: AHashMap<String, AHashSet<String>>,
    len: usize,
}

impl CandidatePairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one pair in canonical order; returns true if it was new
    pub fn insert(&mut self, a: &str, b: &str) -> bool {
        let (id1, id2) = match a.cmp(b) {
            std::cmp::Ordering::Less => (a, b),
            std::cmp::Ordering::Greater => (b, a),
            std::cmp::Ordering::Equal => return false,
        };
        let inserted = self
            .pairs
            .entry(id1.to_string())
            .or_default()
            .insert(id2.to_string());
        if inserted {
            self.len += 1;
        }
        inserted
    }

    /// Add every pair of identifiers within a block
    pub fn add_block<S: AsRef<str>>(&mut self, ids: &[S]) {
        let mut sorted: Vec<&str> = ids.iter().map(AsRef::as_ref).collect();
        sorted.sort_unstable();
        sorted.dedup();

        for (i, id1) in sorted.iter().enumerate() {
            for id2 in &sorted[i + 1..] {
                if self
                    .pairs
                    .entry((*id1).to_string())
                    .or_default()
                    .insert((*id2).to_string())
                {
                    self.len += 1;
                }
            }
        }
    }

    pub fn contains(&self, a: &str, b: &str) -> bool {
        let (id1, id2) = if a <= b { (a, b) } else { (b, a) };
        self.pairs.get(id1).is_some_and(|set| set.contains(id2))
    }

    /// Number of distinct pairs
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Count the pairs by walking every partner set
    pub fn count(&self) -> usize {
        self.pairs.values().map(|set| set.len()).sum()
    }

    /// Partners of `id` that sort after it
    pub fn partners(&self, id: &str) -> Option<&AHashSet<String>> {
        self.pairs.get(id)
    }

    /// Iterate pairs as `(id1, id2)` with `id1 < id2`
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.pairs
            .iter()
            .flat_map(|(id1, set)| set.iter().map(move |id2| (id1.as_str(), id2.as_str())))
    }

    /// Pairs in sorted order, for deterministic output
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort_unstable();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_block_canonical() {
        let mut pairs = CandidatePairs::new();
        pairs.add_block(&["c", "a", "b"]);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs.sorted(), vec![("a", "b"), ("a", "c"), ("b", "c")]);
        assert!(pairs.contains("c", "a"));
        assert!(!pairs.contains("a", "a"));
    }

    #[test]
    fn test_dedup_across_blocks() {
        let mut pairs = CandidatePairs::new();
        pairs.add_block(&["1", "2"]);
        pairs.add_block(&["2", "1", "3"]);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs.count(), 3);
        assert!(!pairs.insert("3", "1"));
        assert!(!pairs.insert("3", "3"));
        assert!(pairs.insert("4", "1"));
        assert_eq!(pairs.len(), 4);
    }

    #[test]
    fn test_lexicographic_order() {
        let mut pairs = CandidatePairs::new();
        pairs.add_block(&["10", "9"]);
        // "10" < "9" as strings
        assert_eq!(pairs.sorted(), vec![("10", "9")]);
        assert!(pairs.partners("10").is_some());
        assert!(pairs.partners("9").is_none());
    }

    #[test]
    fn test_single_and_empty_blocks() {
        let mut pairs = CandidatePairs::new();
        pairs.add_block(&["1"]);
        pairs.add_block::<&str>(&[]);
        pairs.add_block(&["1", "1"]);
        assert!(pairs.is_empty());
        assert_eq!(pairs.iter().count(), 0);
    }
}
