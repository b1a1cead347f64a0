//! Option catalogues offered by the questionnaire.
//!
//! The server accepts free text for every choice, so these lists only shape
//! what the wizard offers.

/// Choice that unlocks a free-text override.
pub const OTHER: &str = "Other";

/// Cabinet types.
pub const CABINET_TYPES: &[&str] = &[
    "NEMA TS-1",
    "NEMA TS-2 Type 1",
    "NEMA TS-2 Type 2",
    "ATC Cabinet",
    "332 Cabinet",
    "334 Cabinet",
    "336 Cabinet",
    "TEES Cabinet",
    "NYDOT Cabinet",
    "M Cabinet",
    "G Cabinet",
    "P Cabinet",
    "R Cabinet",
    "Super P Cabinet",
    "Super M Cabinet",
    "ITS Cabinet",
    OTHER,
];

/// Detection I/O configurations.
pub const DETECTION_IO: &[&str] = &[
    "DB37 to Spades",
    "SDLC 15 Pin",
    "SDLC 25 to 15 Pin",
    "NTCIP",
    "Smart Harness",
    OTHER,
];

/// TLS connection types.
pub const TLS_CONNECTIONS: &[&str] = &[
    "NTCIP",
    "SDLC",
    "C1/C4 Harness",
    "DB25 to Spade Cables",
    "None",
    OTHER,
];

/// Equipment items ordered by quantity.
pub const EQUIPMENT: &[&str] = &[
    "Nexus Unit",
    "Sensor Power Unit",
    "Type 1 Sensor",
    "Type 2 Sensor",
];

/// Auxiliary equipment items ordered by quantity.
pub const AUXILIARY_EQUIPMENT: &[&str] = &[
    "Wifi Repeater",
    "19\" Rack Mount Kit",
    "Shelf Mount Kit",
    "C1 Harness",
];

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CABINET_TYPES)]
    #[case(DETECTION_IO)]
    #[case(TLS_CONNECTIONS)]
    fn choice_lists_end_with_other(#[case] options: &[&str]) {
        assert_eq!(options.last(), Some(&OTHER));
    }

    #[test]
    fn equipment_catalogues_are_disjoint() {
        assert!(EQUIPMENT.iter().all(|item| !AUXILIARY_EQUIPMENT.contains(item)));
    }
}
