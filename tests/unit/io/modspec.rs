//! Tests for the legacy binary ModSpec grid reader and writer

#[cfg(test)]
mod tests {
    use crate::fixtures::{RecordingProgress, four_by_five};
    use gridmask::GridError;
    use gridmask::io::configuration::{MODSPEC_DATA_TAG, MODSPEC_HEADER_END, MODSPEC_MARKER};
    use gridmask::io::modspec::{
        has_modspec_marker, read_modspec_grid, read_modspec_grid_file, read_modspec_header,
        write_modspec_grid, write_modspec_grid_file,
    };
    use gridmask::io::progress::NullProgress;
    use gridmask::io::units::{DistanceUnit, UnitPreferences};
    use gridmask::spatial::geometry::{GridGeometry, Point};
    use gridmask::spatial::grid::Grid3d;
    use ndarray::Array2;
    use std::fs;
    use tempfile::TempDir;

    const ENTRIES: &str = "\
#VERSION = 1.0
#XORG = 10
#NX = 2
#YORG = 20
#NY = 3
#DX = 5
#DY = 2
#ANGLE = 0
#ZNON = -999.25
#UNITS = (meters)
";

    // Header with the data placed right after the closing line
    fn handmade(entries: &str, words: [i32; 6], samples: &[f32]) -> Vec<u8> {
        let text = |address: usize| {
            format!("{MODSPEC_MARKER}\n{entries}#ADDRESS = (0, {address:05})\n{MODSPEC_HEADER_END}\n")
        };
        let address = text(0).len();
        let mut bytes = text(address).into_bytes();
        bytes.extend(words.iter().flat_map(|w| w.to_le_bytes()));
        bytes.extend(samples.iter().flat_map(|s| s.to_le_bytes()));
        bytes
    }

    fn sample_bytes() -> Vec<u8> {
        handmade(ENTRIES, [6, 0, 0, 0, 0, 6], &[1.0, 2.0, 3.0, 4.0, 5.0, -999.25])
    }

    fn read(bytes: &[u8]) -> gridmask::Result<Grid3d> {
        let mut reader = bytes;
        read_modspec_grid(
            &mut reader,
            "sample",
            DistanceUnit::Undefined,
            UnitPreferences::default(),
            &NullProgress,
        )
    }

    fn rotated() -> Grid3d {
        let geometry = GridGeometry::from_origin(Point::new(1000.0, 2000.0), 25.0, 12.5, 6, 4, 30.0)
            .expect("Failed to create geometry");
        let mut grid = Grid3d::new("rotated", geometry);
        grid.set_values(Array2::from_shape_fn((6, 4), |(r, c)| (r * 4 + c) as f32 * 1.5))
            .expect("Failed to set values");
        grid.set_value(2, 3, grid.null_value()).expect("In range");
        grid
    }

    // Tests header entries are read by key in any order and samples row-major from row 0
    // Verified by reading the samples from the top row down
    #[test]
    fn test_read_handmade() {
        let bytes = sample_bytes();
        let mut reader = bytes.as_slice();
        let header = read_modspec_header(&mut reader).expect("Valid header");
        assert_eq!((header.num_rows, header.num_cols), (3, 2));
        assert_eq!(header.cell_count(), 6);
        assert_eq!(reader.len(), 6 * 4);
        assert_eq!(header.file_bytes(), bytes.len() as u64 + 1);

        let grid = read(&bytes).expect("Valid grid");
        assert_eq!(grid.geometry().dimensions(), (3, 2));
        assert!((grid.value(0, 1).expect("In range") - 2.0).abs() < f32::EPSILON);
        assert!((grid.value(1, 0).expect("In range") - 3.0).abs() < f32::EPSILON);
        assert!(grid.is_null_at(2, 1));
        assert_eq!(grid.null_value().to_bits(), (-999.25_f32).to_bits());

        let corner = grid.geometry().to_world(2.0, 1.0);
        assert!((corner.x - 15.0).abs() < 1e-9);
        assert!((corner.y - 24.0).abs() < 1e-9);
    }

    // Tests the writer pads fixed entries and points ADDRESS at the data header
    // Verified by counting the ADDRESS line before padding it
    #[test]
    fn test_write_layout() {
        let grid = four_by_five();
        let mut bytes = Vec::new();
        let written = write_modspec_grid(
            &grid,
            &mut bytes,
            DistanceUnit::Undefined,
            UnitPreferences::default(),
        )
        .expect("Write failed");
        assert_eq!(written, bytes.len() as u64);
        assert_eq!(bytes.last(), Some(&b'\n'));

        let mut reader = bytes.as_slice();
        let header = read_modspec_header(&mut reader).expect("Valid header");
        let address = usize::try_from(header.data_address).expect("Small address");
        assert_eq!(bytes.len(), address + 24 + 20 * 4 + 1);

        let text = String::from_utf8_lossy(bytes.get(..address).expect("Header text"));
        assert!(text.starts_with(MODSPEC_MARKER));
        assert!(text.ends_with(&format!("{MODSPEC_DATA_TAG}\n")));
        let fixed: Vec<&str> = text
            .lines()
            .skip_while(|line| *line != "#<HDR_MODSPEC_GRID>")
            .skip(1)
            .take_while(|line| *line != MODSPEC_HEADER_END)
            .collect();
        assert_eq!(fixed.len(), 30);
        assert!(fixed.iter().all(|line| line.len() == 70), "{fixed:?}");
        assert!(fixed.iter().any(|line| line.starts_with("#NX         = 5")));
        assert!(fixed.iter().any(|line| line.starts_with("#NY         = 4")));

        let words: Vec<i32> = bytes
            .get(address..address + 24)
            .expect("Data header")
            .chunks_exact(4)
            .map(|chunk| i32::from_le_bytes(chunk.try_into().expect("Four bytes")))
            .collect();
        let address = address as i32;
        assert_eq!(words, vec![20, 0, address + 24 + 80 + 1, 0, address + 20, 20]);
    }

    // Tests a written grid reads back with its geometry, values and nulls
    // Verified by writing the spacing of the wrong axis into DX
    #[test]
    fn test_round_trip_keeps_geometry() {
        let grid = rotated();
        let mut bytes = Vec::new();
        write_modspec_grid(&grid, &mut bytes, DistanceUnit::Undefined, UnitPreferences::default())
            .expect("Write failed");

        let loaded = read(&bytes).expect("Valid grid");
        assert!(loaded.geometry().matches(grid.geometry()));
        assert_eq!(loaded.values(), grid.values());
        assert_eq!(loaded.null_count(), 1);
    }

    // Tests coordinates are written in the file unit and converted back on read
    // Verified by skipping the conversion on write
    #[test]
    fn test_feet_round_trip() {
        let grid = rotated();
        let metric = UnitPreferences::new(DistanceUnit::Meters);
        let mut bytes = Vec::new();
        write_modspec_grid(&grid, &mut bytes, DistanceUnit::Feet, metric).expect("Write failed");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("#UNITS      = (feet)"));

        let mut reader = bytes.as_slice();
        let header = read_modspec_header(&mut reader).expect("Valid header");
        assert!((header.origin.x - 1000.0 / 0.3048).abs() < 1e-6);
        assert!((header.col_spacing - 25.0 / 0.3048).abs() < 1e-6);

        let mut stream = bytes.as_slice();
        let loaded = read_modspec_grid(&mut stream, "m", DistanceUnit::Feet, metric, &NullProgress)
            .expect("Valid grid");
        assert!(loaded.geometry().matches(grid.geometry()));
    }

    // Tests header problems map to corrupt header, parse and geometry errors
    // Verified by defaulting missing entries to zero
    #[test]
    fn test_header_errors() {
        let samples = [0.0; 6];
        let words = [6, 0, 0, 0, 0, 6];

        let no_marker = handmade(ENTRIES, words, &samples);
        let no_marker = no_marker.get(1..).expect("Non-empty");
        assert!(matches!(read(no_marker), Err(GridError::CorruptHeader { .. })));

        let missing = handmade(&ENTRIES.replace("#NX = 2\n", ""), words, &samples);
        assert!(matches!(read(&missing), Err(GridError::CorruptHeader { .. })));

        let bad_value = handmade(&ENTRIES.replace("#DX = 5", "#DX = five"), words, &samples);
        assert!(matches!(read(&bad_value), Err(GridError::Parse { line: 7, .. })));

        let zero = handmade(&ENTRIES.replace("#NX = 2", "#NX = 0"), words, &samples);
        assert!(matches!(read(&zero), Err(GridError::InvalidGeometry { .. })));

        let huge = ENTRIES
            .replace("#NX = 2", "#NX = 4294967296")
            .replace("#NY = 3", "#NY = 4294967296");
        let huge = handmade(&huge, words, &samples);
        assert!(matches!(read(&huge), Err(GridError::InvalidGeometry { .. })));

        let unterminated = format!("{MODSPEC_MARKER}\n{ENTRIES}");
        assert!(matches!(
            read(unterminated.as_bytes()),
            Err(GridError::CorruptHeader { .. })
        ));

        let inside = format!("{MODSPEC_MARKER}\n{ENTRIES}#ADDRESS = (0, 12)\n{MODSPEC_HEADER_END}\n");
        assert!(matches!(read(inside.as_bytes()), Err(GridError::CorruptHeader { .. })));
    }

    // Tests short streams and files report truncation instead of reading on
    // Verified by sizing the sample buffer from NX * NY up front
    #[test]
    fn test_truncated_samples() {
        let short = handmade(ENTRIES, [6, 0, 0, 0, 0, 6], &[1.0, 2.0, 3.0]);
        assert!(matches!(
            read(&short),
            Err(GridError::TruncatedData {
                expected_bytes: 24,
                available_bytes: 12
            })
        ));

        let huge = ENTRIES.replace("#NX = 2", "#NX = 65535").replace("#NY = 3", "#NY = 32767");
        let huge = handmade(&huge, [0; 6], &[1.0, 2.0]);
        assert!(matches!(read(&huge), Err(GridError::TruncatedData { .. })));

        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("huge.cps");
        fs::write(&path, &huge).expect("Failed to write grid");
        let progress = RecordingProgress::default();
        let result =
            read_modspec_grid_file(&path, DistanceUnit::Undefined, UnitPreferences::default(), &progress);
        assert!(matches!(
            result,
            Err(GridError::TruncatedData {
                available_bytes: 8,
                ..
            })
        ));
        assert_eq!(progress.worked(), 0);
    }

    // Tests file round trip, naming and per-row progress
    // Verified by reporting progress once for the whole block
    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("lease.cps");
        let grid = rotated();
        let written =
            write_modspec_grid_file(&grid, &path, DistanceUnit::Undefined, UnitPreferences::default())
                .expect("Write failed");
        assert_eq!(fs::metadata(&path).expect("Written").len(), written);

        let progress = RecordingProgress::default();
        let loaded =
            read_modspec_grid_file(&path, DistanceUnit::Undefined, UnitPreferences::default(), &progress)
                .expect("Read failed");
        assert_eq!(loaded.name(), "lease");
        assert_eq!(loaded.values(), grid.values());
        assert_eq!(progress.worked(), 6);

        let mut file = fs::File::open(&path).expect("Open written grid");
        assert!(has_modspec_marker(&mut file).expect("Readable"));
        assert!(!has_modspec_marker(&mut "0 0 [origin]\n".as_bytes()).expect("Readable"));
        assert!(!has_modspec_marker(&mut "#<CPS".as_bytes()).expect("Readable"));
    }

    // Tests a cancelled read stops between rows
    // Verified by checking cancellation only before the first row
    #[test]
    fn test_cancelled_read() {
        let mut bytes = Vec::new();
        write_modspec_grid(&rotated(), &mut bytes, DistanceUnit::Undefined, UnitPreferences::default())
            .expect("Write failed");
        let progress = RecordingProgress::cancel_after(2);
        let mut reader = bytes.as_slice();
        let result = read_modspec_grid(
            &mut reader,
            "cancelled",
            DistanceUnit::Undefined,
            UnitPreferences::default(),
            &progress,
        );
        assert!(matches!(
            result,
            Err(GridError::Cancelled {
                rows_processed: 2,
                total_rows: 6
            })
        ));
    }
}
