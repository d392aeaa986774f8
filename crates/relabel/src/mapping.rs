use core::hash::Hash;

use indexmap::IndexMap;
use fxhash::FxBuildHasher;

/// An old-label-to-new-label mapping, insertion-ordered so that "any order"
/// choices elsewhere in relabeling (e.g. which node to rewrite first in the
/// disjoint-label fast path) are at least deterministic and reproducible.
pub struct Mapping<N> {
    pairs: IndexMap<N, N, FxBuildHasher>,
}

impl<N> Mapping<N>
where
    N: Clone + Eq + Hash,
{
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (N, N)>) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    /// Builds a mapping by applying `f` to every node currently in `nodes`.
    #[must_use]
    pub fn from_fn(nodes: impl IntoIterator<Item = N>, mut f: impl FnMut(&N) -> N) -> Self {
        let pairs = nodes.into_iter().map(|n| {
            let new = f(&n);
            (n, new)
        });
        Self::from_pairs(pairs)
    }

    #[must_use]
    pub fn get(&self, old: &N) -> Option<&N> {
        self.pairs.get(old)
    }

    #[must_use]
    pub fn contains_key(&self, old: &N) -> bool {
        self.pairs.contains_key(old)
    }

    pub fn keys(&self) -> impl Iterator<Item = &N> {
        self.pairs.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&N, &N)> {
        self.pairs.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<N> FromIterator<(N, N)> for Mapping<N>
where
    N: Clone + Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = (N, N)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}
