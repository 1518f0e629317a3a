/// The two flavors of data section found in LAMMPS dump files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Per-atom records (`ITEM: ATOMS ...`), one id followed by numeric fields
    Atoms,
    /// Per-pair records (`ITEM: ENTRIES ...`) written by `dump local`
    Entries,
}

impl FrameKind {
    /// Name of this kind of section, as written after `ITEM:`
    pub fn keyword(&self) -> &'static str {
        match self {
            FrameKind::Atoms => "ATOMS",
            FrameKind::Entries => "ENTRIES",
        }
    }
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// Column layout of the data sections, taken from the first data section
/// header of a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    /// Flavor of the data section
    pub kind: FrameKind,
    /// Names of the columns, in the order they appear on each data line
    pub names: Vec<String>,
}

impl Columns {
    /// Get the 0-based index of the column with the given name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// Simulation box from an `ITEM: BOX BOUNDS` section. This is kept for
/// consumers of the frames, nothing in this crate uses it to compute
/// distances.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxBounds {
    /// Boundary flags following `BOX BOUNDS` (`pp pp pp`, `xy xz yz pp pp
    /// pp`, ...)
    pub flags: Vec<String>,
    /// `[lo, hi]` along x, y and z
    pub bounds: [[f64; 2]; 3],
    /// `xy`, `xz` and `yz` tilt factors for triclinic boxes
    pub tilt: Option<[f64; 3]>,
}

/// A single data line in a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based line number in the stream
    pub line: usize,
    /// Content of the line, without line terminator
    pub text: String,
}

impl Row {
    /// Split this row into whitespace separated tokens
    pub fn tokens(&self) -> std::str::SplitWhitespace<'_> {
        self.text.split_whitespace()
    }
}

/// One block of a dump file: everything between two `ITEM: TIMESTEP`
/// sections.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Simulation step number
    pub timestep: u64,
    /// Simulation time, if the dump contains an `ITEM: TIME` section
    pub time: Option<f64>,
    /// Unit style, if the dump contains an `ITEM: UNITS` section. This is
    /// never interpreted.
    pub units: Option<String>,
    /// Simulation box, if the dump contains an `ITEM: BOX BOUNDS` section
    pub box_bounds: Option<BoxBounds>,
    /// Flavor of the data section
    pub kind: FrameKind,
    /// Data lines, in file order
    pub rows: Vec<Row>,
}

impl Frame {
    /// Number of data lines in this frame
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Does this frame contain any data line?
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
