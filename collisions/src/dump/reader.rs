use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;

use crate::Error;
use super::{BoxBounds, Columns, Frame, FrameKind, Row};

/// Sections that can appear after `ITEM:` in a dump file
#[derive(Debug)]
enum Section {
    Timestep,
    Time,
    Units,
    NumberOf(FrameKind),
    BoxBounds(Vec<String>),
    Data(Columns),
}

fn is_item(text: &str) -> bool {
    text.trim_start().starts_with("ITEM:")
}

/// Parse a section header. Returns `Ok(None)` if `text` is not an `ITEM:`
/// line at all.
fn parse_section(text: &str, line: usize) -> Result<Option<Section>, Error> {
    let mut tokens = text.split_whitespace();
    if tokens.next() != Some("ITEM:") {
        return Ok(None);
    }

    let malformed = |message: String| Error::MalformedHeader { line, message };

    let section = match tokens.next() {
        Some("TIMESTEP") => Section::Timestep,
        Some("TIME") => Section::Time,
        Some("UNITS") => Section::Units,
        Some("NUMBER") => match (tokens.next(), tokens.next()) {
            (Some("OF"), Some("ENTRIES")) => Section::NumberOf(FrameKind::Entries),
            (Some("OF"), Some("ATOMS")) => Section::NumberOf(FrameKind::Atoms),
            _ => return Err(malformed(format!(
                "expected 'ITEM: NUMBER OF ENTRIES' or 'ITEM: NUMBER OF ATOMS', got '{}'", text.trim()
            ))),
        },
        Some("BOX") => {
            if tokens.next() != Some("BOUNDS") {
                return Err(malformed(format!("expected 'ITEM: BOX BOUNDS', got '{}'", text.trim())));
            }
            Section::BoxBounds(tokens.map(String::from).collect())
        },
        Some("ENTRIES") => Section::Data(Columns {
            kind: FrameKind::Entries,
            names: tokens.map(String::from).collect(),
        }),
        Some("ATOMS") => Section::Data(Columns {
            kind: FrameKind::Atoms,
            names: tokens.map(String::from).collect(),
        }),
        Some(other) => return Err(malformed(format!("unknown section 'ITEM: {}'", other))),
        None => return Err(malformed("missing section name after 'ITEM:'".into())),
    };

    return Ok(Some(section));
}

/// Parse a single numeric `value`, producing an `Error::Parse` pointing to
/// the given `line` and `timestep` on failure. `what` describes the value in
/// the error message.
pub(crate) fn parse_value<T>(value: &str, line: usize, timestep: Option<u64>, what: &str) -> Result<T, Error>
    where T: std::str::FromStr, T::Err: std::fmt::Display
{
    let value = value.trim();
    value.parse().map_err(|e| Error::Parse {
        line: line,
        timestep: timestep,
        message: format!("invalid {} '{}': {}", what, value, e),
    })
}

/// Streaming reader for LAMMPS text dumps, producing one [`Frame`] per block
/// of the file.
///
/// Only the block currently being read is kept in memory. The column layout
/// is fixed by the first data section header; any later header with a
/// different flavor or different columns is rejected. After the first error,
/// the iterator is exhausted.
pub struct DumpReader<R> {
    lines: std::io::Lines<R>,
    /// number of lines consumed so far
    line: usize,
    columns: Option<Columns>,
    /// timestep, flavor and declared size of the last block read
    previous: Option<(u64, FrameKind, usize)>,
    done: bool,
}

impl<R: BufRead> DumpReader<R> {
    /// Create a new reader consuming lines from `reader`
    pub fn new(reader: R) -> DumpReader<R> {
        DumpReader {
            lines: reader.lines(),
            line: 0,
            columns: None,
            previous: None,
            done: false,
        }
    }

    /// Get the column layout of the data sections, if at least one data
    /// section header has been read
    pub fn columns(&self) -> Option<&Columns> {
        self.columns.as_ref()
    }

    /// Get the number of lines consumed so far
    pub fn line(&self) -> usize {
        self.line
    }

    fn next_line(&mut self) -> Result<Option<String>, Error> {
        match self.lines.next() {
            Some(text) => {
                self.line += 1;
                let mut text = text?;
                if text.ends_with('\r') {
                    text.pop();
                }
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    /// Read the line following a single-valued section header
    fn read_value(&mut self, section: &str, timestep: Option<u64>) -> Result<(usize, String), Error> {
        match self.next_line()? {
            Some(text) if is_item(&text) => Err(Error::MalformedHeader {
                line: self.line,
                message: format!("expected a value after 'ITEM: {}', got '{}'", section, text.trim()),
            }),
            Some(text) => Ok((self.line, text)),
            None => Err(Error::TruncatedBlock {
                line: self.line,
                timestep: timestep,
                expected: 1,
                found: 0,
            }),
        }
    }

    fn read_box_bounds(&mut self, flags: Vec<String>, timestep: Option<u64>) -> Result<BoxBounds, Error> {
        let mut bounds = [[0.0; 2]; 3];
        let mut tilt = [0.0; 3];
        let mut n_tilt = 0;
        let mut line = self.line;
        for axis in 0..3 {
            let (value_line, text) = self.read_value("BOX BOUNDS", timestep)?;
            line = value_line;

            let values = text.split_whitespace()
                .map(|v| parse_value::<f64>(v, line, timestep, "box bound"))
                .collect::<Result<Vec<_>, _>>()?;

            match values.len() {
                2 => {},
                3 => {
                    tilt[axis] = values[2];
                    n_tilt += 1;
                },
                n => return Err(Error::Parse {
                    line: line,
                    timestep: timestep,
                    message: format!("expected 2 or 3 values in box bounds, got {}", n),
                }),
            }
            bounds[axis] = [values[0], values[1]];
        }

        let tilt = match n_tilt {
            0 => None,
            3 => Some(tilt),
            _ => return Err(Error::Parse {
                line: line,
                timestep: timestep,
                message: "tilt factors must be given for all three axes or none".into(),
            }),
        };

        return Ok(BoxBounds { flags, bounds, tilt });
    }

    fn check_layout(&mut self, columns: Columns, line: usize) -> Result<(), Error> {
        if let Some(existing) = &self.columns {
            if *existing != columns {
                return Err(Error::MalformedHeader {
                    line: line,
                    message: format!(
                        "data section changed from 'ITEM: {} {}' to 'ITEM: {} {}'",
                        existing.kind, existing.names.join(" "),
                        columns.kind, columns.names.join(" "),
                    ),
                });
            }
            return Ok(());
        }

        self.columns = Some(columns);
        return Ok(());
    }

    fn read_rows(&mut self, count: usize, timestep: u64) -> Result<Vec<Row>, Error> {
        // the declared count is untrusted, don't pre-allocate too much
        let mut rows = Vec::with_capacity(usize::min(count, 4096));
        while rows.len() < count {
            match self.next_line()? {
                Some(text) if text.trim().is_empty() => continue,
                Some(text) if !is_item(&text) => rows.push(Row { line: self.line, text: text }),
                _ => return Err(Error::TruncatedBlock {
                    line: self.line,
                    timestep: Some(timestep),
                    expected: count,
                    found: rows.len(),
                }),
            }
        }
        return Ok(rows);
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
        let mut started = false;
        let mut timestep = None;
        let mut time = None;
        let mut units = None;
        let mut box_bounds = None;
        let mut declared = None;

        loop {
            let text = match self.next_line()? {
                Some(text) => text,
                None if !started => return Ok(None),
                None => return Err(Error::TruncatedBlock {
                    line: self.line,
                    timestep: timestep,
                    expected: declared.map_or(0, |(_, count)| count),
                    found: 0,
                }),
            };

            if text.trim().is_empty() {
                continue;
            }

            let header_line = self.line;
            let malformed = |message: String| Error::MalformedHeader { line: header_line, message };

            let section = match parse_section(&text, header_line)? {
                Some(section) => section,
                None => {
                    if let (false, Some((timestep, kind, count))) = (started, self.previous) {
                        return Err(Error::Parse {
                            line: header_line,
                            timestep: Some(timestep),
                            message: format!(
                                "more data lines than the {} declared in 'ITEM: NUMBER OF {}'",
                                count, kind
                            ),
                        });
                    }
                    return Err(malformed(format!("expected an 'ITEM:' section, got '{}'", text.trim())));
                }
            };
            started = true;

            match section {
                Section::Timestep => {
                    if let Some(timestep) = timestep {
                        return Err(malformed(format!(
                            "new 'ITEM: TIMESTEP' before the data section of timestep {}", timestep
                        )));
                    }
                    let (line, value) = self.read_value("TIMESTEP", None)?;
                    timestep = Some(parse_value(&value, line, None, "timestep")?);
                }
                Section::Time => {
                    let (line, value) = self.read_value("TIME", timestep)?;
                    time = Some(parse_value(&value, line, timestep, "time")?);
                }
                Section::Units => {
                    let (_, value) = self.read_value("UNITS", timestep)?;
                    units = Some(value.trim().to_owned());
                }
                Section::NumberOf(kind) => {
                    let (line, value) = self.read_value("NUMBER OF", timestep)?;
                    let what = format!("number of {}", kind.keyword().to_lowercase());
                    declared = Some((kind, parse_value::<usize>(&value, line, timestep, &what)?));
                }
                Section::BoxBounds(flags) => {
                    box_bounds = Some(self.read_box_bounds(flags, timestep)?);
                }
                Section::Data(columns) => {
                    let kind = columns.kind;
                    let timestep = match timestep {
                        Some(timestep) => timestep,
                        None => return Err(malformed(format!(
                            "'ITEM: {}' section before any 'ITEM: TIMESTEP'", kind
                        ))),
                    };

                    let count = match declared {
                        Some((declared_kind, count)) if declared_kind == kind => count,
                        Some((declared_kind, _)) => return Err(malformed(format!(
                            "'ITEM: NUMBER OF {}' followed by an 'ITEM: {}' section", declared_kind, kind
                        ))),
                        None => return Err(malformed(format!(
                            "'ITEM: {}' section without a preceding 'ITEM: NUMBER OF {}'", kind, kind
                        ))),
                    };

                    self.check_layout(columns, header_line)?;
                    let rows = self.read_rows(count, timestep)?;

                    debug!("read {} {} at timestep {}", rows.len(), kind.keyword().to_lowercase(), timestep);
                    self.previous = Some((timestep, kind, count));

                    return Ok(Some(Frame {
                        timestep: timestep,
                        time: time,
                        units: units,
                        box_bounds: box_bounds,
                        kind: kind,
                        rows: rows,
                    }));
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for DumpReader<R> {
    type Item = Result<Frame, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}

/// Open the dump file at the given `path` for reading. Files with a `.gz`
/// extension are decompressed on the fly.
pub fn open(path: impl AsRef<Path>) -> Result<DumpReader<Box<dyn BufRead>>, Error> {
    let path = path.as_ref();
    let file = File::open(path)?;

    let reader: Box<dyn BufRead> = if path.extension().map_or(false, |ext| ext == "gz") {
        Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    return Ok(DumpReader::new(reader));
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn read_all(content: &str) -> Result<Vec<Frame>, Error> {
        DumpReader::new(content.as_bytes()).collect()
    }

    const ENTRIES: &str = "\
ITEM: TIMESTEP
0
ITEM: NUMBER OF ENTRIES
2
ITEM: BOX BOUNDS pp pp pp
0.0 10.0
0.0 10.0
-5.0 5.0
ITEM: ENTRIES index c_pair[1] c_pair[2] c_force
1 1 2 0.5
2 2 3 -0.25
ITEM: TIMESTEP
100
ITEM: NUMBER OF ENTRIES
1
ITEM: BOX BOUNDS pp pp pp
0.0 10.0
0.0 10.0
-5.0 5.0
ITEM: ENTRIES index c_pair[1] c_pair[2] c_force
1 2 1 0.75
";

    #[test]
    fn entries() {
        let mut reader = DumpReader::new(ENTRIES.as_bytes());
        assert!(reader.columns().is_none());

        let frame = reader.next().unwrap().unwrap();
        assert_eq!(frame.timestep, 0);
        assert_eq!(frame.kind, FrameKind::Entries);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.rows[0].line, 10);
        assert_eq!(frame.rows[1].tokens().collect::<Vec<_>>(), ["2", "2", "3", "-0.25"]);

        let box_bounds = frame.box_bounds.unwrap();
        assert_eq!(box_bounds.flags, ["pp", "pp", "pp"]);
        assert_relative_eq!(box_bounds.bounds[2][0], -5.0);
        assert!(box_bounds.tilt.is_none());

        let columns = reader.columns().unwrap();
        assert_eq!(columns.names, ["index", "c_pair[1]", "c_pair[2]", "c_force"]);
        assert_eq!(columns.position("c_force"), Some(3));

        let frame = reader.next().unwrap().unwrap();
        assert_eq!(frame.timestep, 100);
        assert_eq!(frame.rows[0].text, "1 2 1 0.75");

        assert!(reader.next().is_none());
        assert_eq!(reader.line(), 21);
    }

    #[test]
    fn atoms_with_time_and_units() {
        let content = "\
ITEM: UNITS
lj
ITEM: TIME
0.005
ITEM: TIMESTEP
1
ITEM: NUMBER OF ATOMS
2
ITEM: BOX BOUNDS xy xz yz pp pp pp
0.0 10.0 0.5
0.0 10.0 0.0
0.0 10.0 0.0
ITEM: ATOMS id type x y z
1 1 0.0 0.0 0.0
2 1 1.0 1.0 1.0
";
        let frames = read_all(content).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::Atoms);
        assert_eq!(frames[0].units.as_deref(), Some("lj"));
        assert_relative_eq!(frames[0].time.unwrap(), 0.005);
        assert_eq!(frames[0].box_bounds.as_ref().unwrap().tilt, Some([0.5, 0.0, 0.0]));
    }

    #[test]
    fn empty_frames_and_blank_lines() {
        let content = "\r\nITEM: TIMESTEP\r\n5\r\nITEM: NUMBER OF ENTRIES\r\n0\r\nITEM: ENTRIES a b c\r\n\n";
        let frames = read_all(content).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].timestep, 5);
        assert!(frames[0].is_empty());

        assert!(read_all("").unwrap().is_empty());
    }

    #[test]
    fn truncated_by_next_section() {
        let content = "\
ITEM: TIMESTEP
0
ITEM: NUMBER OF ENTRIES
3
ITEM: ENTRIES index a b f
1 1 2 0.5
2 2 3 0.5
ITEM: TIMESTEP
1
";
        match read_all(content) {
            Err(Error::TruncatedBlock { line, timestep, expected, found }) => {
                assert_eq!(line, 8);
                assert_eq!(timestep, Some(0));
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("expected a truncated block error, got {:?}", other),
        }
    }

    #[test]
    fn truncated_by_end_of_stream() {
        let content = "ITEM: TIMESTEP\n0\nITEM: NUMBER OF ENTRIES\n2\nITEM: ENTRIES a b f\n1 2 0.5\n";
        assert!(matches!(
            read_all(content),
            Err(Error::TruncatedBlock { expected: 2, found: 1, .. })
        ));

        let content = "ITEM: TIMESTEP\n0\nITEM: NUMBER OF ENTRIES\n2\n";
        assert!(matches!(read_all(content), Err(Error::TruncatedBlock { .. })));

        let content = "ITEM: TIMESTEP\n";
        assert!(matches!(read_all(content), Err(Error::TruncatedBlock { .. })));
    }

    #[test]
    fn too_many_data_lines() {
        let content = "\
ITEM: TIMESTEP
0
ITEM: NUMBER OF ENTRIES
1
ITEM: ENTRIES index a b f
1 1 2 0.5
2 2 3 1.0
ITEM: TIMESTEP
1
";
        let mut reader = DumpReader::new(content.as_bytes());
        assert!(reader.next().unwrap().is_ok());
        match reader.next().unwrap() {
            Err(Error::Parse { line, timestep, message }) => {
                assert_eq!(line, 7);
                assert_eq!(timestep, Some(0));
                assert_eq!(message, "more data lines than the 1 declared in 'ITEM: NUMBER OF ENTRIES'");
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
        assert!(reader.next().is_none());
    }

    #[test]
    fn blank_lines_in_data() {
        let content = "\
ITEM: TIMESTEP
0
ITEM: NUMBER OF ENTRIES
2
ITEM: ENTRIES index a b f
1 1 2 0.5

2 2 3 1.0

ITEM: TIMESTEP
1
ITEM: NUMBER OF ENTRIES
0
ITEM: ENTRIES index a b f
";
        let frames = read_all(content).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].len(), 2);
        assert_eq!(frames[0].rows[1].line, 8);
        assert_eq!(frames[0].rows[1].text, "2 2 3 1.0");
    }

    #[test]
    fn malformed_headers() {
        let error = read_all("ITEM: TIMESTEP\n0\nITEM: FOO\n").unwrap_err();
        assert_eq!(error.to_string(), "malformed header at line 3: unknown section 'ITEM: FOO'");

        let error = read_all("ITEM:\n").unwrap_err();
        assert!(matches!(error, Error::MalformedHeader { line: 1, .. }));

        let error = read_all("ITEM: NUMBER OF BONDS\n3\n").unwrap_err();
        assert!(matches!(error, Error::MalformedHeader { line: 1, .. }));

        let error = read_all("1 2 3\n").unwrap_err();
        assert!(matches!(error, Error::MalformedHeader { line: 1, .. }));

        let error = read_all("ITEM: TIMESTEP\nITEM: NUMBER OF ENTRIES\n").unwrap_err();
        assert!(matches!(error, Error::MalformedHeader { line: 2, .. }));

        // data without count
        let error = read_all("ITEM: TIMESTEP\n0\nITEM: ENTRIES a b\n").unwrap_err();
        assert!(matches!(error, Error::MalformedHeader { line: 3, .. }));

        // count and data flavors do not match
        let error = read_all("ITEM: TIMESTEP\n0\nITEM: NUMBER OF ATOMS\n0\nITEM: ENTRIES a b\n").unwrap_err();
        assert!(matches!(error, Error::MalformedHeader { line: 5, .. }));

        // data before timestep
        let error = read_all("ITEM: NUMBER OF ENTRIES\n0\nITEM: ENTRIES a b\n").unwrap_err();
        assert!(matches!(error, Error::MalformedHeader { line: 3, .. }));
    }

    #[test]
    fn layout_is_fixed_by_first_header() {
        let content = "\
ITEM: TIMESTEP
0
ITEM: NUMBER OF ENTRIES
0
ITEM: ENTRIES index a b f
ITEM: TIMESTEP
1
ITEM: NUMBER OF ENTRIES
0
ITEM: ENTRIES index a b g
";
        let mut reader = DumpReader::new(content.as_bytes());
        assert!(reader.next().unwrap().is_ok());
        let error = reader.next().unwrap().unwrap_err();
        assert!(matches!(error, Error::MalformedHeader { line: 10, .. }));

        // the reader is exhausted after an error
        assert!(reader.next().is_none());
    }

    #[test]
    fn parse_errors() {
        let error = read_all("ITEM: TIMESTEP\nten\n").unwrap_err();
        match error {
            Error::Parse { line, timestep, .. } => {
                assert_eq!(line, 2);
                assert_eq!(timestep, None);
            }
            other => panic!("expected a parse error, got {:?}", other),
        }

        let error = read_all("ITEM: TIMESTEP\n10\nITEM: NUMBER OF ENTRIES\n-1\n").unwrap_err();
        assert!(matches!(error, Error::Parse { line: 4, timestep: Some(10), .. }));

        let content = "ITEM: TIMESTEP\n0\nITEM: NUMBER OF ENTRIES\n0\nITEM: BOX BOUNDS pp pp pp\n0 1\n0 1 2\n0 1\nITEM: ENTRIES a\n";
        let error = read_all(content).unwrap_err();
        assert!(matches!(error, Error::Parse { line: 8, .. }));
    }
}
