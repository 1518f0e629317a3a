#![allow(dead_code)]

use std::path::PathBuf;

use collisions::{NeighbourList, TrackerOptions};

/// Get the path to a file in the `tests/data` directory
pub fn path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("data");
    path.push(name);
    return path;
}

/// Read the file `name` from the `tests/data` directory, using the force in
/// column 4 (after `index`, the two atoms and the distance).
pub fn load_neighbours(name: &str) -> NeighbourList {
    NeighbourList::open(path(name), TrackerOptions::new(4)).expect("failed to read dump")
}

/// Create the content of a `dump local` file with one block per entry in
/// `frames`. Each pair is written as `index first second force`, so the
/// force is in column 3.
pub fn write_dump(frames: &[(u64, &[(usize, usize, f64)])]) -> String {
    let mut content = String::new();
    for (timestep, pairs) in frames {
        content += &format!("ITEM: TIMESTEP\n{}\n", timestep);
        content += &format!("ITEM: NUMBER OF ENTRIES\n{}\n", pairs.len());
        content += "ITEM: BOX BOUNDS pp pp pp\n0 10\n0 10\n0 10\n";
        content += "ITEM: ENTRIES index c_pair[1] c_pair[2] c_force\n";
        for (i, (first, second, force)) in pairs.iter().enumerate() {
            content += &format!("{} {} {} {}\n", i + 1, first, second, force);
        }
    }
    return content;
}

/// Read a trajectory containing a single pair between atoms 1 and 2, with
/// the given force at successive timesteps
pub fn single_pair(forces: &[f64]) -> NeighbourList {
    let pairs = forces.iter().map(|&f| [(1, 2, f)]).collect::<Vec<_>>();
    let frames = pairs.iter()
        .enumerate()
        .map(|(i, pair)| (i as u64 + 1, &pair[..]))
        .collect::<Vec<_>>();

    let content = write_dump(&frames);
    NeighbourList::read(content.as_bytes(), TrackerOptions::new(3)).expect("failed to read dump")
}
