use ndarray::{Array1, Array2};

use crate::pairs::{PairKey, Pairlist};

/// Force between two atoms as a function of time
#[derive(Debug, Clone, PartialEq)]
pub struct ForceSeries {
    /// Timesteps, one per pair list in the trajectory
    pub timesteps: Vec<u64>,
    /// Force at each timestep. This is 0 for timesteps where the pair is not
    /// interacting.
    pub forces: Array1<f64>,
}

impl ForceSeries {
    /// Number of points in this series
    pub fn len(&self) -> usize {
        self.timesteps.len()
    }

    /// Is this series empty?
    pub fn is_empty(&self) -> bool {
        self.timesteps.is_empty()
    }

    /// Iterate over `(timestep, force)` points in this series
    pub fn iter(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.timesteps.iter().copied().zip(self.forces.iter().copied())
    }
}

/// Extract the force of the pair with the given `key` over all `pairlists`.
///
/// Timesteps where the pair is absent get a force of 0: the atoms are not
/// interacting.
pub fn extract_series(pairlists: &[Pairlist], key: PairKey) -> ForceSeries {
    let mut timesteps = Vec::with_capacity(pairlists.len());
    let mut forces = Array1::zeros(pairlists.len());
    for (i, pairlist) in pairlists.iter().enumerate() {
        timesteps.push(pairlist.timestep());
        if let Some(pair) = pairlist.get(key) {
            forces[i] = pair.force;
        }
    }

    return ForceSeries { timesteps, forces };
}

/// Extract the forces of multiple pairs at once. The returned array contains
/// one row per pair list and one column per entry in `keys`, and is filled
/// with zeros like [`extract_series`].
pub fn force_matrix(pairlists: &[Pairlist], keys: &[PairKey]) -> Array2<f64> {
    let mut forces = Array2::zeros((pairlists.len(), keys.len()));
    for (mut row, pairlist) in forces.rows_mut().into_iter().zip(pairlists) {
        for (value, &key) in row.iter_mut().zip(keys) {
            if let Some(pair) = pairlist.get(key) {
                *value = pair.force;
            }
        }
    }
    return forces;
}
