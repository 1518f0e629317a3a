use crate::Error;
use crate::pairs::{Pair, Pairlist};

/// A collision between two atoms, i.e. a local maximum of a repulsive pair
/// force over time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    /// The colliding pair, as found at `timestep`. Its force already
    /// decreased from the maximum.
    pub pair: Pair,
    /// Timestep at which the collision was detected, i.e. the first timestep
    /// after the force maximum
    pub timestep: u64,
    /// Timestep at which the force maximum was sampled
    pub peak_timestep: u64,
    /// Value of the force at the maximum
    pub peak_force: f64,
    /// Number of atoms taking part in the collision: the two atoms of the
    /// pair, plus one for each other pair sharing an atom with this one at
    /// `timestep`.
    pub order: usize,
}

impl std::fmt::Display for Collision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f, "pair ({}, {}), timestep {}, force {}, order {}",
            self.pair.first, self.pair.second, self.timestep, self.peak_force, self.order
        )
    }
}

/// Which pairs are scanned when computing the order of a collision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderScope {
    /// Use all the pairs of the timestep where the collision was detected
    #[default]
    Complete,
    /// Only use the pairs found before the colliding pair in the dump file
    /// for the same timestep
    Partial,
}

/// Result of comparing a pair with its state at the previous timestep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// The pair, with an up to date `increasing` flag
    pub pair: Pair,
    /// If the force reached a repulsive maximum at the previous timestep,
    /// this contains the pair at the maximum
    pub peak: Option<Pair>,
}

/// Update the trend of `pair` from its state at the previous timestep.
///
/// The returned pair is increasing if its force is strictly larger than the
/// `previous` force. The returned boolean is `true` if the force stopped
/// increasing while staying repulsive, i.e. if `previous` was a local
/// maximum.
pub fn update_trend(pair: Pair, previous: &Pair) -> (Pair, bool) {
    let increasing = pair.force > previous.force;
    let peaked = !increasing && previous.increasing && pair.force > 0.0;

    let pair = Pair {
        increasing: increasing,
        ..pair
    };
    return (pair, peaked);
}

/// Compare a new `pair` with the `previous` pair list.
///
/// Pairs absent from the previous pair list are returned unchanged, since
/// there is no trend to establish yet. Comparing against a missing previous
/// pair list is an error.
pub fn detect(previous: Option<&Pairlist>, pair: Pair) -> Result<Detection, Error> {
    let previous = previous.ok_or(Error::MissingPreviousSnapshot)?;

    let detection = match previous.find(&pair) {
        Some(previous) => {
            let (pair, peaked) = update_trend(pair, previous);
            Detection {
                pair: pair,
                peak: if peaked { Some(*previous) } else { None },
            }
        }
        None => Detection { pair: pair, peak: None },
    };

    return Ok(detection);
}

/// Compute the order of a collision of `pair`, given the other pairs present
/// at the same time.
///
/// The order starts at 2 (the two atoms in `pair`) and is incremented for
/// each pair in `concurrent` sharing an atom with `pair`. Entries with the
/// same atoms as `pair` are not counted.
pub fn collision_order<'a>(pair: &Pair, concurrent: impl IntoIterator<Item = &'a Pair>) -> usize {
    let mut order = 2;
    for other in concurrent {
        if !other.same_atoms(pair) && pair.shares_atom(other) {
            order += 1;
        }
    }
    return order;
}

/// Detects collisions between two consecutive pair lists
#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionDetector {
    scope: OrderScope,
}

impl CollisionDetector {
    /// Create a new detector computing collision orders with the given `scope`
    pub fn new(scope: OrderScope) -> CollisionDetector {
        CollisionDetector { scope }
    }

    /// Get the scope used to compute collision orders
    pub fn scope(&self) -> OrderScope {
        self.scope
    }

    /// Compare all the pairs in `current` against `previous`.
    ///
    /// This returns the pairs of `current` with updated trends, in the same
    /// order, and the collisions detected at this timestep. `previous` is
    /// never modified.
    pub fn advance(&self, previous: &Pairlist, current: &Pairlist) -> Result<(Pairlist, Vec<Collision>), Error> {
        let mut updated = Pairlist::new(current.timestep());
        let mut peaks = Vec::new();
        for &pair in current {
            let detection = detect(Some(previous), pair)?;
            if let Some(peak) = detection.peak {
                peaks.push((updated.len(), peak));
            }

            let added = updated.add(detection.pair);
            debug_assert!(added, "duplicated pair {} in pair list", pair.key());
        }

        let mut collisions = Vec::with_capacity(peaks.len());
        for (position, peak) in peaks {
            let pair = *updated.get_index(position).expect("position should be valid");
            let order = match self.scope {
                OrderScope::Complete => collision_order(&pair, &updated),
                OrderScope::Partial => collision_order(&pair, updated.iter().take(position)),
            };

            collisions.push(Collision {
                pair: pair,
                timestep: updated.timestep(),
                peak_timestep: previous.timestep(),
                peak_force: peak.force,
                order: order,
            });
        }

        return Ok((updated, collisions));
    }
}
