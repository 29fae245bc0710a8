use std::sync::Arc;

/// Internal document identifier assigned by the corpus
pub type DocId = u32;

/// An immutable, sorted set of document ids.
///
/// Cloning is cheap: the ids live behind an `Arc`, so a set can be handed
/// to many concurrent tasks without copying.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocSet {
    ids: Arc<[DocId]>,
}

impl DocSet {
    /// Empty set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every id in `0..len`
    pub fn range(len: u32) -> Self {
        Self {
            ids: (0..len).collect::<Vec<_>>().into(),
        }
    }

    /// Build from ids in any order, duplicates allowed
    pub fn from_unsorted(mut ids: Vec<DocId>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Self { ids: ids.into() }
    }

    /// Build from ids already sorted ascending without duplicates
    pub(crate) fn from_sorted(ids: Vec<DocId>) -> Self {
        debug_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        Self { ids: ids.into() }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: DocId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = DocId> + '_ {
        self.ids.iter().copied()
    }

    pub fn as_slice(&self) -> &[DocId] {
        &self.ids
    }

    /// Sorted merge intersection
    pub fn intersect(&self, other: &DocSet) -> DocSet {
        let (a, b) = (self.as_slice(), other.as_slice());
        let mut out = Vec::with_capacity(a.len().min(b.len()));
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        DocSet::from_sorted(out)
    }

    /// Size of the intersection without materializing it
    pub fn intersection_len(&self, other: &DocSet) -> usize {
        let (a, b) = (self.as_slice(), other.as_slice());
        let (mut i, mut j, mut n) = (0, 0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    n += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        n
    }
}

impl FromIterator<DocId> for DocSet {
    fn from_iter<I: IntoIterator<Item = DocId>>(iter: I) -> Self {
        DocSet::from_unsorted(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_unsorted_dedups() {
        let set = DocSet::from_unsorted(vec![5, 1, 3, 1, 5]);
        assert_eq!(set.as_slice(), &[1, 3, 5]);
        assert!(set.contains(3));
        assert!(!set.contains(2));
    }

    #[test]
    fn test_intersect() {
        let a: DocSet = [1, 2, 3, 7, 9].into_iter().collect();
        let b: DocSet = [2, 3, 4, 9].into_iter().collect();
        let both = a.intersect(&b);
        assert_eq!(both.as_slice(), &[2, 3, 9]);
        assert_eq!(a.intersection_len(&b), 3);
    }

    #[test]
    fn test_range_and_empty() {
        assert_eq!(DocSet::range(3).as_slice(), &[0, 1, 2]);
        assert!(DocSet::empty().is_empty());
        assert!(DocSet::range(4).intersect(&DocSet::empty()).is_empty());
    }
}
