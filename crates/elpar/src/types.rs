//! Utility types.

use std::hash::Hash;

type BuildHasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

pub type Map<K, V> = indexmap::IndexMap<K, V, BuildHasher>;
pub type Set<T> = indexmap::IndexSet<T, BuildHasher>;

/// An insertion-ordered table keyed by a pair of keys.
///
/// Used for the predictive parsing table (`(nonterminal, terminal)`) and the
/// automaton transitions (`(state, symbol)`).
#[derive(Debug, Clone)]
pub struct Matrix<K1, K2, V> {
    inner: Map<(K1, K2), V>,
}

impl<K1, K2, V> Default for Matrix<K1, K2, V> {
    fn default() -> Self {
        Self {
            inner: Map::default(),
        }
    }
}

impl<K1, K2, V> Matrix<K1, K2, V>
where
    K1: Copy + Eq + Hash,
    K2: Copy + Eq + Hash,
{
    pub fn get(&self, k1: K1, k2: K2) -> Option<&V> {
        self.inner.get(&(k1, k2))
    }

    /// Insert a value unless the slot is already occupied.
    ///
    /// On collision the stored value is kept and returned as the error.
    pub fn try_insert(&mut self, k1: K1, k2: K2, value: V) -> Result<(), &V> {
        use indexmap::map::Entry;
        match self.inner.entry((k1, k2)) {
            Entry::Occupied(entry) => Err(entry.into_mut()),
            Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(())
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (K1, K2, &V)> + '_ {
        self.inner.iter().map(|(&(k1, k2), v)| (k1, k2, v))
    }

    /// Iterate over the entries whose first key equals `k1`.
    pub fn row(&self, k1: K1) -> impl Iterator<Item = (K2, &V)> + '_ {
        self.inner
            .iter()
            .filter(move |((r, _), _)| *r == k1)
            .map(|(&(_, k2), v)| (k2, v))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K1, K2, V> PartialEq for Matrix<K1, K2, V>
where
    K1: Eq + Hash,
    K2: Eq + Hash,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_entry() {
        let mut m = Matrix::default();
        assert!(m.try_insert(1, 'a', "first").is_ok());
        assert!(matches!(m.try_insert(1, 'a', "second"), Err(&"first")));
        assert!(m.try_insert(1, 'b', "other").is_ok());
        assert_eq!(m.get(1, 'a'), Some(&"first"));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn row_in_insertion_order() {
        let mut m = Matrix::default();
        m.try_insert(0, 2, "x").unwrap();
        m.try_insert(1, 0, "y").unwrap();
        m.try_insert(0, 1, "z").unwrap();
        let row: Vec<_> = m.row(0).collect();
        assert_eq!(row, [(2, &"x"), (1, &"z")]);
    }
}
