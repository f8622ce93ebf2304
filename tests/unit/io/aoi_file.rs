//! Tests for area-of-interest text parsing

#[cfg(test)]
mod tests {
    use gridmask::GridError;
    use gridmask::io::aoi_file::{parse_aoi, read_aoi_file};
    use gridmask::spatial::aoi::PolygonKind;
    use std::fs;
    use tempfile::TempDir;

    const OUTLINE: &str = "\
# lease outline
inclusion
0 0
10 0   # south-east corner
10 10
0,10
exclude
4 4
6, 4
5 6
";

    // Tests keywords, comments and both vertex separators
    // Verified by treating commas as part of the number
    #[test]
    fn test_parse_outline() {
        let aoi = parse_aoi(OUTLINE).expect("Valid outline");
        let polygons = aoi.polygons();
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons.first().map(|p| p.kind()), Some(PolygonKind::Inclusion));
        assert_eq!(polygons.get(1).map(|p| p.kind()), Some(PolygonKind::Exclusion));
        assert_eq!(polygons.first().map(|p| p.vertices().len()), Some(4));

        assert!(aoi.contains(1.0, 1.0));
        assert!(!aoi.contains(5.0, 5.0));
    }

    // Tests empty and comment-only text yields an empty area
    // Verified by rejecting text without polygons
    #[test]
    fn test_parse_empty() {
        assert!(parse_aoi("").expect("Valid text").is_empty());
        assert!(parse_aoi("# nothing\n\n").expect("Valid text").is_empty());
    }

    // Tests malformed lines report their line number
    // Verified by reporting the polygon's opening line instead
    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_aoi("1 2\n"), Err(GridError::Parse { line: 1, .. })));
        assert!(matches!(
            parse_aoi("inclusion\n0 0\n1 x\n"),
            Err(GridError::Parse { line: 3, .. })
        ));
        assert!(matches!(
            parse_aoi("inclusion\n0 0 0\n"),
            Err(GridError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            parse_aoi("\ninclusion\n0\n"),
            Err(GridError::Parse { line: 3, .. })
        ));
    }

    // Tests a polygon with too few vertices names its opening line
    // Verified by closing only the final polygon
    #[test]
    fn test_short_polygon() {
        let text = "inclusion\n0 0\n1 0\nexclusion\n0 0\n1 0\n0 1\n";
        match parse_aoi(text) {
            Err(GridError::InvalidPolygon { reason }) => {
                assert!(reason.starts_with("polygon opened on line 1"), "{reason}");
            }
            _ => unreachable!("Expected InvalidPolygon"),
        }
    }

    // Tests file reading and missing-file errors
    // Verified by returning an empty area for missing files
    #[test]
    fn test_read_file() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("area.aoi");
        fs::write(&path, OUTLINE).expect("Failed to write outline");
        assert_eq!(read_aoi_file(&path).expect("Valid file").polygons().len(), 2);

        assert!(matches!(
            read_aoi_file(&dir.path().join("missing.aoi")),
            Err(GridError::FileSystem { .. })
        ));
    }
}
