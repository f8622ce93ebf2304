//! Tests for distance units and unit preferences

#[cfg(test)]
mod tests {
    use gridmask::io::units::{DistanceUnit, UnitPreferences};

    // Tests conversion between defined units and identity for undefined
    // Verified by inverting the foot factor
    #[test]
    fn test_convert() {
        assert!((DistanceUnit::Feet.convert(100.0, DistanceUnit::Meters) - 30.48).abs() < 1e-9);
        assert!((DistanceUnit::Meters.convert(0.3048, DistanceUnit::Feet) - 1.0).abs() < 1e-12);
        assert!((DistanceUnit::Meters.convert(7.0, DistanceUnit::Meters) - 7.0).abs() < f64::EPSILON);
        assert!((DistanceUnit::Undefined.convert(7.0, DistanceUnit::Feet) - 7.0).abs() < f64::EPSILON);
        assert!((DistanceUnit::Feet.convert(7.0, DistanceUnit::Undefined) - 7.0).abs() < f64::EPSILON);
    }

    // Tests accepted spellings and display names
    // Verified by removing the abbreviation arms
    #[test]
    fn test_parse_and_display() {
        assert_eq!("m".parse::<DistanceUnit>().ok(), Some(DistanceUnit::Meters));
        assert_eq!(" Metres ".parse::<DistanceUnit>().ok(), Some(DistanceUnit::Meters));
        assert_eq!("ft".parse::<DistanceUnit>().ok(), Some(DistanceUnit::Feet));
        assert_eq!("".parse::<DistanceUnit>().ok(), Some(DistanceUnit::Undefined));
        assert!("furlong".parse::<DistanceUnit>().is_err());

        assert_eq!(DistanceUnit::Feet.to_string(), "feet");
        assert_eq!(DistanceUnit::default().to_string(), "undefined");
        assert_eq!(DistanceUnit::Meters.symbol(), "m");
    }

    // Tests undefined preferences adopt the file unit
    // Verified by always returning the preferred unit
    #[test]
    fn test_resolve() {
        let undefined = UnitPreferences::default();
        assert_eq!(undefined.resolve(DistanceUnit::Feet), DistanceUnit::Feet);
        let metric = UnitPreferences::new(DistanceUnit::Meters);
        assert_eq!(metric.resolve(DistanceUnit::Feet), DistanceUnit::Meters);
    }

    // Tests distances are labelled with the preferred unit
    // Verified by dropping the unit label
    #[test]
    fn test_format_distance() {
        assert_eq!(UnitPreferences::new(DistanceUnit::Meters).format_distance(1.5), "1.500 m");
        assert_eq!(UnitPreferences::new(DistanceUnit::Feet).format_distance(2.0), "2.000 ft");
        assert_eq!(UnitPreferences::default().format_distance(2.0), "2.000");
    }
}
