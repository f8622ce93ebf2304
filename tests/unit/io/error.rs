//! Tests for error messages and conversions

#[cfg(test)]
mod tests {
    use gridmask::GridError;
    use gridmask::io::error::{corrupt_header, file_system_error, invalid_parameter, parse_error};
    use std::error::Error;
    use std::io;

    // Tests user-facing messages carry the error details
    // Verified by dropping fields from the formatted messages
    #[test]
    fn test_display_messages() {
        let out_of_range = GridError::IndexOutOfRange {
            row: 4,
            col: 9,
            dimensions: (3, 5),
        };
        assert_eq!(out_of_range.to_string(), "Cell (4, 9) is outside the grid (size 3x5)");

        let cancelled = GridError::Cancelled {
            rows_processed: 2,
            total_rows: 10,
        };
        assert_eq!(cancelled.to_string(), "Cancelled after 2 of 10 rows");

        let truncated = GridError::TruncatedData {
            expected_bytes: 80,
            available_bytes: 12,
        };
        assert_eq!(truncated.to_string(), "Truncated grid data: expected 80 bytes, found 12");

        let mismatch = GridError::ShapeMismatch {
            expected: (2, 3),
            actual: (3, 2),
        };
        assert!(mismatch.to_string().contains("3x2"));
    }

    // Tests helper constructors fill the right variants
    // Verified by swapping helper variants
    #[test]
    fn test_helpers() {
        assert_eq!(
            corrupt_header(&"bad magic").to_string(),
            "Corrupt grid header: bad magic"
        );
        assert_eq!(
            parse_error(7, &"missing y").to_string(),
            "Parse error on line 7: missing y"
        );
        assert_eq!(
            invalid_parameter("min", &3.5, &"must be finite").to_string(),
            "Invalid parameter 'min' = '3.5': must be finite"
        );
    }

    // Tests file system errors keep their path and source
    // Verified by returning no source
    #[test]
    fn test_file_system_source() {
        let err = file_system_error("/tmp/grid.grid", "open grid", io::Error::other("denied"));
        let message = err.to_string();
        assert!(message.contains("open grid"));
        assert!(message.contains("/tmp/grid.grid"));
        assert!(err.source().is_some());
        assert!(parse_error(1, &"x").source().is_none());

        let converted: GridError = io::Error::other("eof").into();
        assert!(converted.to_string().contains("<stream>"));
    }
}
