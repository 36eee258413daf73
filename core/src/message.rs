use crate::error::{Result, WsprError};
use std::fmt;

/// Correction applied to `power % 10` so every transmitted power ends in 0, 3 or 7
pub const POWER_CORRECTION: [i32; 10] = [0, -1, 1, 0, -1, 2, 1, 0, -1, 1];

/// A standard (Type 1) WSPR station report.
///
/// `callsign` is 1-6 uppercase letters/digits with exactly one digit at
/// position 1 or 2; `grid` is a 4-character Maidenhead locator (A-R, A-R,
/// 0-9, 0-9); `power_dbm` is 0-60 and is snapped to the nearest value ending
/// in 0, 3 or 7 when packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub callsign: String,
    pub grid: String,
    pub power_dbm: i32,
}

impl Message {
    /// Validate and normalize the report to uppercase.
    pub fn new(callsign: &str, grid: &str, power_dbm: i32) -> Result<Self> {
        let callsign = callsign.trim().to_ascii_uppercase();
        let grid = grid.trim().to_ascii_uppercase();
        validate_callsign(&callsign)?;
        validate_grid(&grid)?;
        if !(0..=60).contains(&power_dbm) {
            return Err(WsprError::InvalidPower(power_dbm));
        }
        Ok(Self {
            callsign,
            grid,
            power_dbm,
        })
    }

    /// Power after snapping to the 0/3/7 grid actually transmitted.
    pub fn snapped_power(&self) -> i32 {
        snap_power(self.power_dbm)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.callsign, self.grid, self.power_dbm)
    }
}

/// Snap a dBm value onto the WSPR power grid (last digit 0, 3 or 7).
pub fn snap_power(power_dbm: i32) -> i32 {
    power_dbm + POWER_CORRECTION[(power_dbm.rem_euclid(10)) as usize]
}

fn validate_callsign(call: &str) -> Result<()> {
    let bytes = call.as_bytes();
    if bytes.is_empty() || bytes.len() > 6 {
        return Err(WsprError::InvalidCallsign(call.to_string()));
    }
    if !bytes
        .iter()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    {
        return Err(WsprError::InvalidCallsign(call.to_string()));
    }
    // exactly one digit, at position 1 or 2
    let digit_positions: Vec<usize> = bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| b.is_ascii_digit())
        .map(|(i, _)| i)
        .collect();
    match digit_positions.as_slice() {
        [1] | [2] => Ok(()),
        _ => Err(WsprError::InvalidCallsign(call.to_string())),
    }
}

fn validate_grid(grid: &str) -> Result<()> {
    let b = grid.as_bytes();
    let ok = b.len() == 4
        && (b'A'..=b'R').contains(&b[0])
        && (b'A'..=b'R').contains(&b[1])
        && b[2].is_ascii_digit()
        && b[3].is_ascii_digit();
    if ok {
        Ok(())
    } else {
        Err(WsprError::InvalidGrid(grid.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_messages() {
        assert!(Message::new("K1JT", "FN20", 37).is_ok());
        assert!(Message::new("W1ABC", "AA00", 0).is_ok());
        assert!(Message::new("Q0QQQ", "RR99", 60).is_ok());
        // lowercase input is normalized
        let m = Message::new("k1jt", "fn20", 37).unwrap();
        assert_eq!(m.callsign, "K1JT");
        assert_eq!(m.grid, "FN20");
    }

    #[test]
    fn test_callsign_rejections() {
        // no digit
        assert!(Message::new("ABCD", "FN20", 30).is_err());
        // digit in the wrong position
        assert!(Message::new("ABC1D", "FN20", 30).is_err());
        // two digits
        assert!(Message::new("K1J2T", "FN20", 30).is_err());
        // too long
        assert!(Message::new("VK7ABCD", "FN20", 30).is_err());
        // empty
        assert!(Message::new("", "FN20", 30).is_err());
        // non-alphanumeric
        assert!(Message::new("K1/T", "FN20", 30).is_err());
    }

    #[test]
    fn test_grid_rejections() {
        assert!(Message::new("K1JT", "FN2", 30).is_err());
        assert!(Message::new("K1JT", "FN200", 30).is_err());
        // field letters past R
        assert!(Message::new("K1JT", "SN20", 30).is_err());
        assert!(Message::new("K1JT", "FS20", 30).is_err());
        // digits where letters belong
        assert!(Message::new("K1JT", "1N20", 30).is_err());
        assert!(Message::new("K1JT", "FNAA", 30).is_err());
    }

    #[test]
    fn test_power_range() {
        assert!(Message::new("K1JT", "FN20", -1).is_err());
        assert!(Message::new("K1JT", "FN20", 61).is_err());
        assert!(Message::new("K1JT", "FN20", 0).is_ok());
        assert!(Message::new("K1JT", "FN20", 60).is_ok());
    }

    #[test]
    fn test_power_snapping() {
        assert_eq!(snap_power(30), 30);
        assert_eq!(snap_power(31), 30);
        assert_eq!(snap_power(32), 33);
        assert_eq!(snap_power(33), 33);
        assert_eq!(snap_power(34), 33);
        assert_eq!(snap_power(35), 37);
        assert_eq!(snap_power(36), 37);
        assert_eq!(snap_power(37), 37);
        assert_eq!(snap_power(38), 37);
        assert_eq!(snap_power(39), 40);
    }

    #[test]
    fn test_power_snapping_idempotent() {
        for p in 0..=60 {
            assert_eq!(snap_power(snap_power(p)), snap_power(p));
        }
    }

    #[test]
    fn test_display() {
        let m = Message::new("K1JT", "FN20", 37).unwrap();
        assert_eq!(m.to_string(), "K1JT FN20 37");
    }
}
