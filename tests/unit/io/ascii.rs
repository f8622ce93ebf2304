//! Tests for reading and writing ASCII ModSpec grids

#[cfg(test)]
mod tests {
    use crate::fixtures::ten_by_ten;
    use gridmask::GridError;
    use gridmask::io::ascii::{
        read_ascii_grid, read_ascii_grid_file, write_ascii_grid, write_ascii_grid_file,
    };
    use gridmask::io::units::{DistanceUnit, UnitPreferences};
    use tempfile::TempDir;

    const SAMPLE: &str = "\
10 20 [origin]
5 2 [spacing]
2 3 [columns and rows]
0 -999.25 [angle and null]
 3 2 1
 6 5 -999.25
";

    fn read(text: &str) -> gridmask::Result<gridmask::Grid3d> {
        read_ascii_grid(
            text.as_bytes(),
            "sample",
            DistanceUnit::Undefined,
            UnitPreferences::default(),
        )
    }

    // Tests columns are read from the top row down
    // Verified by filling each column from row 0 upwards
    #[test]
    fn test_read_sample() {
        let grid = read(SAMPLE).expect("Valid grid");
        assert_eq!(grid.geometry().dimensions(), (3, 2));
        assert!((grid.value(0, 0).expect("In range") - 1.0).abs() < f32::EPSILON);
        assert!((grid.value(2, 0).expect("In range") - 3.0).abs() < f32::EPSILON);
        assert!((grid.value(1, 1).expect("In range") - 5.0).abs() < f32::EPSILON);
        assert!(grid.is_null_at(0, 1));

        let corner = grid.geometry().to_world(2.0, 1.0);
        assert!((corner.x - 15.0).abs() < 1e-9);
        assert!((corner.y - 24.0).abs() < 1e-9);
    }

    // Tests one long line may carry a whole column
    // Verified by requiring exactly eight values per line
    #[test]
    fn test_read_long_lines() {
        let text = "0 0\n1 1\n1 10\n0 -1\n 10 9 8 7 6 5 4 3 2 1\n";
        let grid = read(text).expect("Valid grid");
        assert!((grid.value(0, 0).expect("In range") - 1.0).abs() < f32::EPSILON);
        assert!((grid.value(9, 0).expect("In range") - 10.0).abs() < f32::EPSILON);
    }

    // Tests parse failures name the offending line
    // Verified by counting lines from zero
    #[test]
    fn test_parse_error_lines() {
        let bad_header = SAMPLE.replacen("5 2", "five 2", 1);
        assert!(matches!(read(&bad_header), Err(GridError::Parse { line: 2, .. })));

        let bad_value = SAMPLE.replacen(" 6 5", " 6 x", 1);
        assert!(matches!(read(&bad_value), Err(GridError::Parse { line: 6, .. })));

        let short: String = SAMPLE.lines().take(5).map(|l| format!("{l}\n")).collect();
        assert!(matches!(read(&short), Err(GridError::Parse { line: 6, .. })));

        assert!(matches!(read("1 2\n"), Err(GridError::Parse { line: 2, .. })));
    }

    // Tests zero spacing is rejected as invalid geometry
    // Verified by substituting unit spacing on read
    #[test]
    fn test_zero_spacing_rejected() {
        let text = SAMPLE.replacen("5 2", "0 2", 1);
        assert!(matches!(read(&text), Err(GridError::InvalidGeometry { .. })));
    }

    // Tests dimensions whose cell count cannot be stored fail on the header line
    // Verified by allocating the grid before checking the cell count
    #[test]
    fn test_oversized_dimensions_rejected() {
        let overflow = SAMPLE.replacen("2 3 [", "4294967296 4294967296 [", 1);
        assert!(matches!(read(&overflow), Err(GridError::Parse { line: 3, .. })));

        let huge = SAMPLE.replacen("2 3 [", "100000 100000 [", 1);
        assert!(matches!(read(&huge), Err(GridError::Parse { line: 7, .. })));
    }

    // Tests written grids wrap at eight values and read back unchanged
    // Verified by wrapping at ten values per line
    #[test]
    fn test_write_round_trip() {
        let grid = ten_by_ten();
        let mut text = Vec::new();
        write_ascii_grid(&grid, &mut text, DistanceUnit::Undefined, UnitPreferences::default())
            .expect("Write failed");
        let text = String::from_utf8(text).expect("Valid UTF-8");

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4 + 10 * 2);
        assert!(lines.get(2).is_some_and(|l| l.starts_with("10 10")));
        assert_eq!(lines.get(4).map(|l| l.split_whitespace().count()), Some(8));
        assert_eq!(lines.get(5).map(|l| l.split_whitespace().count()), Some(2));
        assert_eq!(lines.get(4).and_then(|l| l.split_whitespace().next()), Some("364"));

        let loaded = read(&text).expect("Valid grid");
        assert_eq!(loaded.values(), grid.values());
        assert!(loaded.geometry().matches(grid.geometry()));
    }

    // Tests file coordinates in feet are converted to meters
    // Verified by dividing by the foot length instead of multiplying
    #[test]
    fn test_feet_to_meters() {
        let text = "100 0\n10 10\n2 2\n0 -999.25\n 1 2\n 3 4\n";
        let metric = read_ascii_grid(
            text.as_bytes(),
            "feet",
            DistanceUnit::Feet,
            UnitPreferences::new(DistanceUnit::Meters),
        )
        .expect("Valid grid");
        let [origin, ..] = *metric.geometry().corner_points();
        assert!((origin.x - 30.48).abs() < 1e-9);
        assert!((metric.geometry().col_spacing() - 3.048).abs() < 1e-9);

        let native = read_ascii_grid(
            text.as_bytes(),
            "feet",
            DistanceUnit::Feet,
            UnitPreferences::default(),
        )
        .expect("Valid grid");
        let [origin, ..] = *native.geometry().corner_points();
        assert!((origin.x - 100.0).abs() < 1e-9);
    }

    // Tests file helpers name the grid after the file stem
    // Verified by naming grids after the full file name
    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("surface.asc");
        let grid = read(SAMPLE).expect("Valid grid");
        write_ascii_grid_file(&grid, &path, DistanceUnit::Undefined, UnitPreferences::default())
            .expect("Write failed");

        let loaded = read_ascii_grid_file(&path, DistanceUnit::Undefined, UnitPreferences::default())
            .expect("Read failed");
        assert_eq!(loaded.name(), "surface");
        assert_eq!(loaded.values(), grid.values());
        assert_eq!(loaded.null_count(), 1);

        let missing = dir.path().join("missing.asc");
        assert!(matches!(
            read_ascii_grid_file(&missing, DistanceUnit::Undefined, UnitPreferences::default()),
            Err(GridError::FileSystem { .. })
        ));
    }
}
