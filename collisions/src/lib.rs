#![warn(clippy::all, clippy::pedantic)]

// disable some style lints
#![allow(clippy::needless_return, clippy::must_use_candidate, clippy::comparison_chain)]
#![allow(clippy::redundant_field_names, clippy::redundant_closure_for_method_calls)]
#![allow(clippy::option_if_let_else, clippy::range_plus_one)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc, clippy::module_name_repetitions)]

#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap, clippy::cast_lossless, clippy::cast_sign_loss)]

// Tests lints
#![cfg_attr(test, allow(clippy::float_cmp))]

//! Detection of collisions between atoms in molecular dynamics trajectories.
//!
//! Pair interactions are read from LAMMPS `dump local` files, and tracked
//! from one timestep to the next. A collision is a local maximum of a
//! repulsive pair force; each collision records the pair, the time and value
//! of the maximum, and the number of atoms involved.

mod errors;
pub use self::errors::Error;

pub mod dump;

pub mod pairs;
pub use self::pairs::{Pair, PairKey, Pairlist};

pub mod detection;
pub use self::detection::{Collision, CollisionDetector, OrderScope};

pub mod series;
pub use self::series::ForceSeries;

mod neighbours;
pub use self::neighbours::{NeighbourList, TrackerOptions, ForceColumn};
