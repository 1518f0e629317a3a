//! Reading of LAMMPS text dump files.
//!
//! A dump is a sequence of blocks, each one starting with `ITEM: TIMESTEP`
//! and ending with a data section (`ITEM: ENTRIES ...` for `dump local`, or
//! `ITEM: ATOMS ...` for per-atom dumps) containing the number of lines
//! declared in the preceding `ITEM: NUMBER OF ...` section.

mod frame;
pub use self::frame::{Frame, FrameKind, Columns, BoxBounds, Row};

mod reader;
pub use self::reader::{DumpReader, open};
pub(crate) use self::reader::parse_value;
