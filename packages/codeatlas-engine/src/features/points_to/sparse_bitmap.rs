//! Sparse bitmap
//!
//! Points-to sets are sparse over a large location space; a BTreeMap of
//! 64-bit words keeps memory proportional to the populated ranges while
//! preserving ordered iteration (deterministic output).

use std::collections::BTreeMap;

const WORD_BITS: u32 = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseBitmap {
    words: BTreeMap<u32, u64>,
    len: usize,
}

impl SparseBitmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a bit; true when newly set
    pub fn insert(&mut self, value: u32) -> bool {
        let word_index = value / WORD_BITS;
        let bit = 1u64 << (value % WORD_BITS);
        let word = self.words.entry(word_index).or_insert(0);
        if *word & bit != 0 {
            return false;
        }
        *word |= bit;
        self.len += 1;
        true
    }

    pub fn contains(&self, value: u32) -> bool {
        let word_index = value / WORD_BITS;
        let bit = 1u64 << (value % WORD_BITS);
        self.words.get(&word_index).is_some_and(|w| w & bit != 0)
    }

    /// Union another bitmap in; true when any bit was added
    pub fn union_with(&mut self, other: &SparseBitmap) -> bool {
        let mut changed = false;
        for (&index, &their_word) in &other.words {
            let word = self.words.entry(index).or_insert(0);
            let added = their_word & !*word;
            if added != 0 {
                *word |= their_word;
                self.len += added.count_ones() as usize;
                changed = true;
            }
        }
        changed
    }

    pub fn intersects(&self, other: &SparseBitmap) -> bool {
        // iterate the smaller map
        let (small, large) = if self.words.len() <= other.words.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .words
            .iter()
            .any(|(index, word)| large.words.get(index).is_some_and(|w| w & word != 0))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Ordered iteration over set bits
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.words.iter().flat_map(|(&index, &word)| {
            (0..WORD_BITS).filter_map(move |bit| {
                if word & (1u64 << bit) != 0 {
                    Some(index * WORD_BITS + bit)
                } else {
                    None
                }
            })
        })
    }
}

impl FromIterator<u32> for SparseBitmap {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        let mut bitmap = Self::new();
        for value in iter {
            bitmap.insert(value);
        }
        bitmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn insert_and_contains_across_words() {
        let mut bitmap = SparseBitmap::new();
        assert!(bitmap.insert(3));
        assert!(bitmap.insert(64));
        assert!(bitmap.insert(100_000));
        assert!(!bitmap.insert(3));
        assert!(bitmap.contains(64));
        assert!(!bitmap.contains(65));
        assert_eq!(bitmap.len(), 3);
    }

    #[test]
    fn union_counts_only_new_bits() {
        let mut a: SparseBitmap = [1, 2, 3].into_iter().collect();
        let b: SparseBitmap = [3, 4, 70].into_iter().collect();
        assert!(a.union_with(&b));
        assert_eq!(a.len(), 5);
        assert!(!a.union_with(&b));
    }

    #[test]
    fn iteration_is_ordered() {
        let bitmap: SparseBitmap = [500, 2, 65, 1].into_iter().collect();
        let values: Vec<u32> = bitmap.iter().collect();
        assert_eq!(values, vec![1, 2, 65, 500]);
    }

    #[test]
    fn intersection_check() {
        let a: SparseBitmap = [1, 128].into_iter().collect();
        let b: SparseBitmap = [128].into_iter().collect();
        let c: SparseBitmap = [2, 129].into_iter().collect();
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    proptest! {
        #[test]
        fn behaves_like_a_set(values in proptest::collection::vec(0u32..100_000, 0..200)) {
            let bitmap: SparseBitmap = values.iter().copied().collect();
            let reference: std::collections::BTreeSet<u32> = values.iter().copied().collect();
            prop_assert_eq!(bitmap.len(), reference.len());
            let iterated: Vec<u32> = bitmap.iter().collect();
            let expected: Vec<u32> = reference.iter().copied().collect();
            prop_assert_eq!(iterated, expected);
        }

        #[test]
        fn union_is_commutative(
            left in proptest::collection::vec(0u32..10_000, 0..100),
            right in proptest::collection::vec(0u32..10_000, 0..100),
        ) {
            let a: SparseBitmap = left.iter().copied().collect();
            let b: SparseBitmap = right.iter().copied().collect();
            let mut ab = a.clone();
            ab.union_with(&b);
            let mut ba = b.clone();
            ba.union_with(&a);
            prop_assert_eq!(ab, ba);
        }
    }
}
