use indexmap::IndexMap;

/// Identity of a pair interaction, i.e. the unordered set of the ids of the
/// two atoms involved. `PairKey::new(3, 1)` and `PairKey::new(1, 3)` are the
/// same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    /// smallest of the two atom ids
    first: usize,
    /// largest of the two atom ids
    second: usize,
}

impl PairKey {
    /// Create the key for the pair between atoms `i` and `j`
    pub fn new(i: usize, j: usize) -> PairKey {
        if i <= j {
            PairKey { first: i, second: j }
        } else {
            PairKey { first: j, second: i }
        }
    }

    /// Get the smallest atom id in this pair
    pub fn first(&self) -> usize {
        self.first
    }

    /// Get the largest atom id in this pair
    pub fn second(&self) -> usize {
        self.second
    }

    /// Does this pair involve the given `atom`?
    pub fn contains(&self, atom: usize) -> bool {
        self.first == atom || self.second == atom
    }
}

impl From<(usize, usize)> for PairKey {
    fn from((i, j): (usize, usize)) -> PairKey {
        PairKey::new(i, j)
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

/// Interaction between two atoms at a single timestep.
///
/// Pairs are created once per timestep and never modified afterwards: the
/// trend compared to the previous timestep is computed before the pair is
/// stored in a [`Pairlist`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pair {
    /// id of the first atom, in the order found in the dump
    pub first: usize,
    /// id of the second atom, in the order found in the dump
    pub second: usize,
    /// signed scalar force between the two atoms. Positive values are
    /// repulsive.
    pub force: f64,
    /// Did the force increase since the previous timestep? This is `false`
    /// for pairs that did not exist at the previous timestep.
    pub increasing: bool,
}

impl Pair {
    /// Create a new pair between atoms `first` and `second`, with the given
    /// `force` and no increasing trend.
    pub fn new(first: usize, second: usize, force: f64) -> Pair {
        Pair {
            first: first,
            second: second,
            force: force,
            increasing: false,
        }
    }

    /// Get the identity of this pair
    pub fn key(&self) -> PairKey {
        PairKey::new(self.first, self.second)
    }

    /// Check if `self` and `other` are the same interaction, i.e. if they
    /// involve the same two atoms, in any order.
    pub fn same_atoms(&self, other: &Pair) -> bool {
        self.key() == other.key()
    }

    /// Check if `self` and `other` have at least one atom in common. This is
    /// `true` for two pairs with the same atoms.
    pub fn shares_atom(&self, other: &Pair) -> bool {
        let key = self.key();
        key.contains(other.first) || key.contains(other.second)
    }
}

impl std::fmt::Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f, "({}, {}) force = {}, {}",
            self.first, self.second, self.force,
            if self.increasing { "increasing" } else { "not increasing" }
        )
    }
}

/// All the pairs present at a single timestep, in the order they appear in
/// the dump. Each pair identity appears at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct Pairlist {
    timestep: u64,
    pairs: IndexMap<PairKey, Pair>,
}

impl Pairlist {
    /// Create a new empty pair list for the given `timestep`
    pub fn new(timestep: u64) -> Pairlist {
        Pairlist {
            timestep: timestep,
            pairs: IndexMap::new(),
        }
    }

    /// Get the timestep of this pair list
    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    /// Add a `pair` at the end of this list. If a pair with the same atoms is
    /// already in the list, the list is not modified and this function returns
    /// `false`.
    pub fn add(&mut self, pair: Pair) -> bool {
        match self.pairs.entry(pair.key()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(pair);
                true
            }
        }
    }

    /// Find the pair with the same atoms as `pair` in this list
    pub fn find(&self, pair: &Pair) -> Option<&Pair> {
        self.get(pair.key())
    }

    /// Get the pair with the given identity in this list
    pub fn get(&self, key: PairKey) -> Option<&Pair> {
        self.pairs.get(&key)
    }

    /// Get the pair at the given `position` in this list
    pub fn get_index(&self, position: usize) -> Option<&Pair> {
        self.pairs.get_index(position).map(|(_, pair)| pair)
    }

    /// Get the position of the pair with the given identity in this list
    pub fn position(&self, key: PairKey) -> Option<usize> {
        self.pairs.get_index_of(&key)
    }

    /// Number of pairs in this list
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Is this list empty?
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate over the pairs in this list, in insertion order
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Pair> + '_ {
        self.pairs.values()
    }
}

impl<'a> IntoIterator for &'a Pairlist {
    type Item = &'a Pair;
    type IntoIter = indexmap::map::Values<'a, PairKey, Pair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.values()
    }
}

impl std::fmt::Display for Pairlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, pair) in self.iter().enumerate() {
            writeln!(f, "{}: {}", i, pair)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity() {
        let pair = Pair::new(3, 7, 1.5);
        assert!(pair.same_atoms(&Pair::new(7, 3, -2.0)));
        assert!(pair.same_atoms(&Pair::new(3, 7, 0.0)));
        assert!(!pair.same_atoms(&Pair::new(3, 8, 1.5)));

        assert_eq!(PairKey::new(7, 3), PairKey::new(3, 7));
        assert_eq!(PairKey::from((7, 3)).first(), 3);
        assert_eq!(PairKey::from((7, 3)).second(), 7);
        assert_eq!(pair.key().to_string(), "(3, 7)");
    }

    #[test]
    fn shared_atoms() {
        let pair = Pair::new(1, 2, 0.0);
        assert!(pair.shares_atom(&Pair::new(2, 3, 0.0)));
        assert!(pair.shares_atom(&Pair::new(3, 1, 0.0)));
        assert!(pair.shares_atom(&Pair::new(2, 1, 0.0)));
        assert!(!pair.shares_atom(&Pair::new(4, 5, 0.0)));
    }

    #[test]
    fn lookup() {
        let mut pairlist = Pairlist::new(20);
        assert!(pairlist.is_empty());
        assert_eq!(pairlist.timestep(), 20);

        assert!(pairlist.add(Pair::new(1, 2, 0.5)));
        assert!(pairlist.add(Pair::new(2, 3, 1.5)));
        // the first pair with a given identity wins
        assert!(!pairlist.add(Pair::new(2, 1, 8.0)));
        assert_eq!(pairlist.len(), 2);

        let found = pairlist.find(&Pair::new(2, 1, 0.0)).unwrap();
        assert_eq!(found.force, 0.5);
        assert_eq!(pairlist.position(PairKey::new(3, 2)), Some(1));
        assert_eq!(pairlist.get_index(1).unwrap().force, 1.5);
        assert!(pairlist.get_index(2).is_none());

        assert!(pairlist.get(PairKey::new(1, 3)).is_none());
        assert!(pairlist.position(PairKey::new(1, 3)).is_none());

        let forces = pairlist.iter().map(|p| p.force).collect::<Vec<_>>();
        assert_eq!(forces, [0.5, 1.5]);
    }

    #[test]
    fn display() {
        let mut pair = Pair::new(4, 2, 0.25);
        pair.increasing = true;
        assert_eq!(pair.to_string(), "(4, 2) force = 0.25, increasing");

        let mut pairlist = Pairlist::new(0);
        pairlist.add(pair);
        pairlist.add(Pair::new(1, 2, -1.0));
        assert_eq!(
            pairlist.to_string(),
            "0: (4, 2) force = 0.25, increasing\n1: (1, 2) force = -1, not increasing\n"
        );
    }
}
