//! Real Las Vegas area addresses with known coordinates.
//!
//! Coordinates sourced from OpenStreetMap. Used as the backing data for the
//! fixture geocoder so tests exercise realistic distances.

/// An address string and the point it resolves to.
#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub address: &'static str,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub const fn new(address: &'static str, lat: f64, lon: f64) -> Self {
        Self { address, lat, lon }
    }
}

/// Shared destination for most scenarios.
pub const SCHOOL: Location = Location::new("3801 E Washington Ave, Las Vegas, NV", 36.1808, -115.0876);

/// Pickups along the Strip, roughly south to north.
pub const STRIP_HOMES: &[Location] = &[
    Location::new("3799 S Las Vegas Blvd, Las Vegas, NV", 36.1023654, -115.1688720),
    Location::new("3600 S Las Vegas Blvd, Las Vegas, NV", 36.1126, -115.1767),
    Location::new("3570 S Las Vegas Blvd, Las Vegas, NV", 36.1162, -115.1745),
    Location::new("3131 S Las Vegas Blvd, Las Vegas, NV", 36.1263781, -115.1658180),
];

/// Pickups out east near Henderson and Sunrise Manor.
pub const EAST_HOMES: &[Location] = &[
    Location::new("1301 W Sunset Rd, Henderson, NV", 36.0614, -115.0631),
    Location::new("2300 Paseo Verde Pkwy, Henderson, NV", 36.0308, -115.0825),
    Location::new("5111 Boulder Hwy, Las Vegas, NV", 36.1070664, -115.0591256),
    Location::new("4601 E Charleston Blvd, Las Vegas, NV", 36.1450055, -115.0482587),
];

pub fn all() -> Vec<Location> {
    std::iter::once(SCHOOL)
        .chain(STRIP_HOMES.iter().copied())
        .chain(EAST_HOMES.iter().copied())
        .collect()
}
