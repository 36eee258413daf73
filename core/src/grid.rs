//! Maidenhead locator utilities: grid-to-coordinate conversion, great-circle
//! distance between grid centres, and coordinate-to-grid encoding.

use crate::error::{Result, WsprError};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Centre latitude/longitude of a 4- or 6-character grid square.
pub fn grid_center(grid: &str) -> Result<(f64, f64)> {
    let g = grid.to_ascii_uppercase();
    let b = g.as_bytes();
    if b.len() != 4 && b.len() != 6 {
        return Err(WsprError::InvalidGrid(grid.to_string()));
    }
    let ok = (b'A'..=b'R').contains(&b[0])
        && (b'A'..=b'R').contains(&b[1])
        && b[2].is_ascii_digit()
        && b[3].is_ascii_digit()
        && (b.len() == 4 || ((b'A'..=b'X').contains(&b[4]) && (b'A'..=b'X').contains(&b[5])));
    if !ok {
        return Err(WsprError::InvalidGrid(grid.to_string()));
    }
    let mut lon = -180.0 + (b[0] - b'A') as f64 * 20.0 + (b[2] - b'0') as f64 * 2.0;
    let mut lat = -90.0 + (b[1] - b'A') as f64 * 10.0 + (b[3] - b'0') as f64;
    if b.len() == 6 {
        lon += (b[4] - b'A') as f64 * (2.0 / 24.0) + 1.0 / 24.0;
        lat += (b[5] - b'A') as f64 * (1.0 / 24.0) + 1.0 / 48.0;
    } else {
        lon += 1.0;
        lat += 0.5;
    }
    Ok((lat, lon))
}

/// Great-circle distance in km between the centres of two grid squares,
/// by the spherical law of cosines.
pub fn grid_distance_km(a: &str, b: &str) -> Result<f64> {
    let (lat1, lon1) = grid_center(a)?;
    let (lat2, lon2) = grid_center(b)?;
    let p1 = lat1.to_radians();
    let p2 = lat2.to_radians();
    let dl = (lon2 - lon1).to_radians();
    let cos_angle = (p1.sin() * p2.sin() + p1.cos() * p2.cos() * dl.cos()).clamp(-1.0, 1.0);
    Ok(EARTH_RADIUS_KM * cos_angle.acos())
}

/// Convert latitude/longitude to a 6-character grid locator.
///
/// Fails on NaN input and at the poles (|lat| >= 90), where the locator
/// system degenerates. Longitude outside (-180, +180] is wrapped.
pub fn latlon_to_grid(lat: f64, lon: f64) -> Result<String> {
    if lat.is_nan() || lon.is_nan() {
        return Err(WsprError::CoordinateDomain("latitude or longitude is NaN".into()));
    }
    if lat.abs() >= 90.0 {
        return Err(WsprError::CoordinateDomain(format!(
            "latitude {lat} is at or beyond a pole"
        )));
    }
    let mut lon = lon;
    while lon <= -180.0 {
        lon += 360.0;
    }
    while lon > 180.0 {
        lon -= 360.0;
    }
    let x = lon + 180.0;
    let y = lat + 90.0;
    let lon_field = (x / 20.0).floor().min(17.0);
    let lat_field = (y / 10.0).floor().min(17.0);
    let lon_sq = ((x - lon_field * 20.0) / 2.0).floor().min(9.0);
    let lat_sq = (y - lat_field * 10.0).floor().min(9.0);
    let lon_sub = ((x - lon_field * 20.0 - lon_sq * 2.0) * 12.0).floor().min(23.0);
    let lat_sub = ((y - lat_field * 10.0 - lat_sq) * 24.0).floor().min(23.0);
    Ok(format!(
        "{}{}{}{}{}{}",
        (b'A' + lon_field as u8) as char,
        (b'A' + lat_field as u8) as char,
        lon_sq as u8,
        lat_sq as u8,
        (b'a' + lon_sub as u8) as char,
        (b'a' + lat_sub as u8) as char,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_center() {
        let (lat, lon) = grid_center("FN20").unwrap();
        assert!((lat - 40.5).abs() < 1e-9);
        assert!((lon - -75.0).abs() < 1e-9);
        let (lat, lon) = grid_center("JO65").unwrap();
        assert!((lat - 55.5).abs() < 1e-9);
        assert!((lon - 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance_known_pair() {
        // FN20 (New Jersey) to JO65 (southern Sweden)
        let d = grid_distance_km("FN20", "JO65").unwrap();
        assert!((d - 6295.0).abs() < 5.0, "got {d}");
        // symmetric
        let d2 = grid_distance_km("JO65", "FN20").unwrap();
        assert!((d - d2).abs() < 1e-6);
    }

    #[test]
    fn test_distance_zero_and_antipodal() {
        assert!(grid_distance_km("FN20", "FN20").unwrap().abs() < 1e-9);
        // near-antipodal pair stays finite and below half the circumference
        let d = grid_distance_km("AA00", "RR99").unwrap();
        assert!(d <= EARTH_RADIUS_KM * std::f64::consts::PI + 1e-6);
        assert!(d > 19000.0);
    }

    #[test]
    fn test_distance_six_char_grids() {
        let d4 = grid_distance_km("FN20", "JO65").unwrap();
        let d6 = grid_distance_km("FN20QX", "JO65MM").unwrap();
        // subsquare precision moves the estimate by well under a square
        assert!((d4 - d6).abs() < 200.0);
    }

    #[test]
    fn test_distance_invalid_grid() {
        assert!(grid_distance_km("ZZ99", "FN20").is_err());
        assert!(grid_distance_km("FN2", "FN20").is_err());
        assert!(grid_distance_km("FNAA", "FN20").is_err());
    }

    #[test]
    fn test_latlon_to_grid() {
        assert_eq!(latlon_to_grid(40.5, -75.0).unwrap(), "FN20mm");
        assert_eq!(latlon_to_grid(55.5, 13.0).unwrap(), "JO65mm");
        assert_eq!(latlon_to_grid(0.0, 0.0).unwrap(), "JJ00aa");
        assert_eq!(latlon_to_grid(-33.9, 18.4).unwrap(), "JF96ec");
    }

    #[test]
    fn test_latlon_to_grid_wrapping() {
        // longitude wraps into (-180, +180]
        assert_eq!(
            latlon_to_grid(0.0, 360.0).unwrap(),
            latlon_to_grid(0.0, 0.0).unwrap()
        );
        assert_eq!(
            latlon_to_grid(0.0, -190.0).unwrap(),
            latlon_to_grid(0.0, 170.0).unwrap()
        );
    }

    #[test]
    fn test_latlon_domain_errors() {
        assert!(latlon_to_grid(f64::NAN, 0.0).is_err());
        assert!(latlon_to_grid(0.0, f64::NAN).is_err());
        assert!(latlon_to_grid(90.0, 0.0).is_err());
        assert!(latlon_to_grid(-90.0, 0.0).is_err());
        assert!(latlon_to_grid(89.9, 0.0).is_ok());
    }

    #[test]
    fn test_grid_roundtrip_through_latlon() {
        for grid in ["FN20", "JO65", "AA00", "RR99", "IO91"] {
            let (lat, lon) = grid_center(grid).unwrap();
            let six = latlon_to_grid(lat, lon).unwrap();
            assert_eq!(&six[..4], grid, "centre of {grid} maps back into it");
        }
    }
}
