use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;

use log::{debug, info, warn};
use ndarray::Array2;

use crate::Error;
use crate::dump::{self, Columns, DumpReader, Frame, FrameKind, Row};
use crate::pairs::{Pair, PairKey, Pairlist};
use crate::detection::{Collision, CollisionDetector, OrderScope};
use crate::series::{self, ForceSeries};

/// Column containing the pair force in the entries of a dump
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum ForceColumn {
    /// 0-based index of the column in each entry line
    Index(usize),
    /// Name of the column in the `ITEM: ENTRIES` header
    Name(String),
}

fn default_atom_columns() -> [usize; 2] {
    [1, 2]
}

/// Options controlling how pairs are read from a dump and how collisions
/// are characterized.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TrackerOptions {
    /// Column containing the pair force, either as an index or as a name.
    /// This column must come after both atom columns.
    pub force: ForceColumn,
    /// 0-based indexes of the columns containing the ids of the two atoms
    /// in the pair. LAMMPS `dump local` writes an `index` column first, so
    /// this defaults to `[1, 2]`.
    #[serde(default = "default_atom_columns")]
    pub atom_columns: [usize; 2],
    /// Which pairs to scan when computing the order of a collision
    #[serde(default)]
    pub order_scope: OrderScope,
}

impl TrackerOptions {
    /// Create options using the column at `force_index` for the force and
    /// default values for everything else
    pub fn new(force_index: usize) -> TrackerOptions {
        TrackerOptions {
            force: ForceColumn::Index(force_index),
            atom_columns: default_atom_columns(),
            order_scope: OrderScope::default(),
        }
    }

    /// Decode options from a JSON string
    pub fn from_json(json: &str) -> Result<TrackerOptions, Error> {
        return Ok(serde_json::from_str(json)?);
    }

    /// Resolve the columns to use with the given dump layout
    fn resolve(&self, columns: &Columns) -> Result<Layout, Error> {
        if columns.kind != FrameKind::Entries {
            return Err(Error::InvalidParameter(format!(
                "pair collisions can only be detected from 'ITEM: {}' dumps, got 'ITEM: {}'",
                FrameKind::Entries, columns.kind
            )));
        }

        let [first, second] = self.atom_columns;
        if first == second {
            return Err(Error::InvalidParameter(format!(
                "the two atom columns must be different, got {} twice", first
            )));
        }

        let force = match &self.force {
            ForceColumn::Index(index) => *index,
            ForceColumn::Name(name) => columns.position(name).ok_or_else(|| Error::InvalidParameter(format!(
                "there is no column named '{}' in this dump, available columns are [{}]",
                name, columns.names.join(", ")
            )))?,
        };

        if force <= usize::max(first, second) {
            return Err(Error::InvalidParameter(format!(
                "the force column ({}) must come after the atom columns ({} and {})",
                force, first, second
            )));
        }

        return Ok(Layout { first, second, force });
    }
}

/// Resolved position of the columns in entry lines
#[derive(Debug, Clone, Copy)]
struct Layout {
    first: usize,
    second: usize,
    force: usize,
}

impl Layout {
    fn parse(&self, row: &Row, timestep: u64) -> Result<Pair, Error> {
        let tokens = row.tokens().collect::<Vec<_>>();
        let get = |index: usize, what: &str| {
            tokens.get(index).copied().ok_or_else(|| Error::Parse {
                line: row.line,
                timestep: Some(timestep),
                message: format!(
                    "missing {} in column {}, this line only has {} columns",
                    what, index, tokens.len()
                ),
            })
        };

        let first = dump::parse_value(get(self.first, "atom id")?, row.line, Some(timestep), "atom id")?;
        let second = dump::parse_value(get(self.second, "atom id")?, row.line, Some(timestep), "atom id")?;
        let force = dump::parse_value(get(self.force, "force")?, row.line, Some(timestep), "force")?;

        return Ok(Pair::new(first, second, force));
    }
}

/// Neighbour list tracking pair interactions over a full trajectory, and the
/// collisions detected along the way.
///
/// The trajectory is read in a single pass. For each timestep, the trend of
/// every pair is computed against the previous timestep, and a collision is
/// recorded whenever a repulsive pair force reaches a local maximum. Once
/// constructed, a `NeighbourList` is never modified.
#[derive(Debug, Clone)]
pub struct NeighbourList {
    options: TrackerOptions,
    columns: Option<Columns>,
    timesteps: Vec<u64>,
    pairlists: Vec<Pairlist>,
    collisions: Vec<Collision>,
}

impl NeighbourList {
    /// Read a full trajectory from `reader`, in LAMMPS `dump local` format
    pub fn read<R: BufRead>(reader: R, options: TrackerOptions) -> Result<NeighbourList, Error> {
        NeighbourList::from_frames(DumpReader::new(reader), options)
    }

    /// Read a full trajectory from the dump file at `path`. Files with a
    /// `.gz` extension are decompressed on the fly.
    pub fn open(path: impl AsRef<Path>, options: TrackerOptions) -> Result<NeighbourList, Error> {
        NeighbourList::from_frames(dump::open(path)?, options)
    }

    /// Read a full trajectory from an existing dump reader. The reader must
    /// not have produced any frame yet.
    pub fn from_frames<R: BufRead>(mut frames: DumpReader<R>, options: TrackerOptions) -> Result<NeighbourList, Error> {
        time_graph::spanned!("NeighbourList::read", {
            let detector = CollisionDetector::new(options.order_scope);
            let mut neighbours = NeighbourList {
                options: options,
                columns: None,
                timesteps: Vec::new(),
                pairlists: Vec::new(),
                collisions: Vec::new(),
            };

            let mut layout = None;
            while let Some(frame) = frames.next() {
                let frame = frame?;
                let layout = match layout {
                    Some(layout) => layout,
                    None => {
                        let columns = frames.columns().expect("columns should be known after the first frame");
                        let resolved = neighbours.options.resolve(columns)?;
                        neighbours.columns = Some(columns.clone());
                        layout = Some(resolved);
                        resolved
                    }
                };

                neighbours.push_frame(&frame, &layout, &detector)?;
            }

            if neighbours.timesteps.is_empty() {
                warn!("no timestep found in this trajectory");
            }

            info!(
                "read {} timesteps, found {} collisions",
                neighbours.timesteps.len(), neighbours.collisions.len()
            );

            Ok(neighbours)
        })
    }

    fn push_frame(&mut self, frame: &Frame, layout: &Layout, detector: &CollisionDetector) -> Result<(), Error> {
        if frame.is_empty() {
            warn!("no pair found at timestep {}", frame.timestep);
        }

        let mut current = Pairlist::new(frame.timestep);
        for row in &frame.rows {
            let pair = layout.parse(row, frame.timestep)?;
            if !current.add(pair) {
                return Err(Error::Parse {
                    line: row.line,
                    timestep: Some(frame.timestep),
                    message: format!("pair {} appears more than once in this timestep", pair.key()),
                });
            }
        }

        let (current, collisions) = match self.pairlists.last() {
            Some(previous) => detector.advance(previous, &current)?,
            None => (current, Vec::new()),
        };

        self.timesteps.push(frame.timestep);
        self.pairlists.push(current);
        for collision in collisions {
            self.record(collision);
        }

        Ok(())
    }

    fn record(&mut self, collision: Collision) {
        debug!("collision: {}", collision);
        self.collisions.push(collision);
    }

    /// Get the options used to read this trajectory
    pub fn options(&self) -> &TrackerOptions {
        &self.options
    }

    /// Get the columns of the dump this trajectory was read from, or `None`
    /// if the dump did not contain any timestep
    pub fn columns(&self) -> Option<&Columns> {
        self.columns.as_ref()
    }

    /// Get the list of timesteps in this trajectory, in file order
    pub fn timesteps(&self) -> &[u64] {
        &self.timesteps
    }

    /// Get the pair lists for all timesteps, in file order
    pub fn pairlists(&self) -> &[Pairlist] {
        &self.pairlists
    }

    /// Get the pair list at the given position in the trajectory
    pub fn pairlist(&self, index: usize) -> Option<&Pairlist> {
        self.pairlists.get(index)
    }

    /// Number of timesteps in this trajectory
    pub fn len(&self) -> usize {
        self.timesteps.len()
    }

    /// Is this trajectory empty?
    pub fn is_empty(&self) -> bool {
        self.timesteps.is_empty()
    }

    /// Get all the collisions in this trajectory, in the order they were
    /// detected
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    /// Get the collisions involving the pair with the given `key`
    pub fn collisions_of(&self, key: PairKey) -> impl Iterator<Item = &Collision> + '_ {
        self.collisions.iter().filter(move |collision| collision.pair.key() == key)
    }

    /// Get the number of collisions for each collision order
    pub fn order_distribution(&self) -> BTreeMap<usize, usize> {
        let mut distribution = BTreeMap::new();
        for collision in &self.collisions {
            *distribution.entry(collision.order).or_insert(0) += 1;
        }
        return distribution;
    }

    /// Get the force of the pair with the given `key` at every timestep. The
    /// force is 0 at timesteps where this pair is absent.
    pub fn extract_series(&self, key: PairKey) -> ForceSeries {
        series::extract_series(&self.pairlists, key)
    }

    /// Get the forces of multiple pairs at every timestep, as an array with
    /// one row per timestep and one column per pair.
    pub fn force_matrix(&self, keys: &[PairKey]) -> Array2<f64> {
        series::force_matrix(&self.pairlists, keys)
    }
}
