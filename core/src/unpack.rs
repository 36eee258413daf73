//! Turn a decoded 50-bit payload back into a printable report.
//!
//! The low 7 bits of the trailing field select the message type. Type 1
//! carries callsign + 4-char grid + power; Type 2 swaps the grid field for a
//! prefix/suffix on the callsign; Type 3 carries a 6-character grid and a
//! 15-bit callsign hash resolved through the hash table. Unresolvable
//! hashes render as `<...>`.

use crate::error::{Result, WsprError};
use crate::hash::{callsign_hash, CallsignHashTable};
use crate::pack::{split_payload, unpack_callsign, unpack_callsign_raw, unpack_grid, unpack_prefix};

/// One decoded report, before the channel measurements are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackedMessage {
    /// Printable form: "CALL GRID POWER", with `<...>` for unresolved hashes
    pub text: String,
    /// Plain or compound callsign; `<...>` when only an unknown hash was sent
    pub callsign: String,
    /// 4- or 6-character grid; empty for Type 2 (no grid transmitted)
    pub grid: String,
    pub power_dbm: i32,
}

/// Decode the payload bit stream (81 bits, tail included) into a message,
/// updating the hash table on success.
pub fn unpack_payload(
    bits: &[u8],
    hash_table: &mut dyn CallsignHashTable,
) -> Result<UnpackedMessage> {
    let (n1, n2) = split_payload(bits);
    let ntype = (n2 & 127) as i32 - 64;
    let field = n2 >> 7;

    if (0..=62).contains(&ntype) {
        let nu = ntype % 10;
        if nu == 0 || nu == 3 || nu == 7 {
            // Type 1: plain callsign, 4-char grid, power
            let callsign = unpack_callsign(n1);
            validate_unpacked_callsign(&callsign)?;
            let grid = unpack_grid(field)?;
            hash_table.insert(callsign_hash(&callsign), &callsign);
            Ok(UnpackedMessage {
                text: format!("{callsign} {grid} {ntype}"),
                callsign,
                grid,
                power_dbm: ntype,
            })
        } else {
            // Type 2: compound callsign, no grid
            let nadd = if nu > 7 {
                nu - 7
            } else if nu > 3 {
                nu - 3
            } else {
                nu
            };
            let npfx = field + 32768 * (nadd as u32 - 1);
            let power = ntype - nadd;
            let base = unpack_callsign(n1);
            validate_unpacked_callsign(&base)?;
            let callsign = unpack_prefix(npfx, &base)?;
            hash_table.insert(callsign_hash(&callsign), &callsign);
            Ok(UnpackedMessage {
                text: format!("{callsign} {power}"),
                callsign,
                grid: String::new(),
                power_dbm: power,
            })
        }
    } else if ntype < 0 {
        // Type 3: 6-char grid in the callsign field (rotated), hashed call
        let power = -(ntype + 1);
        if !matches!(power % 10, 0 | 3 | 7) || power > 60 {
            return Err(WsprError::InvalidPower(power));
        }
        let raw = unpack_callsign_raw(n1);
        let grid6: String = [raw[5], raw[0], raw[1], raw[2], raw[3], raw[4]]
            .iter()
            .collect::<String>()
            .trim()
            .to_string();
        validate_grid6(&grid6)?;
        let callsign = match hash_table.lookup(field as u16) {
            Some(call) => format!("<{call}>"),
            None => "<...>".to_string(),
        };
        Ok(UnpackedMessage {
            text: format!("{callsign} {grid6} {power}"),
            callsign,
            grid: grid6,
            power_dbm: power,
        })
    } else {
        Err(WsprError::InvalidPower(ntype))
    }
}

/// Reject payloads whose callsign field decodes outside the Type-1 grammar.
/// The Fano decoder can emerge with a self-consistent but meaningless bit
/// stream; this is the last line of defence.
fn validate_unpacked_callsign(call: &str) -> Result<()> {
    let b = call.as_bytes();
    if b.is_empty() || b.contains(&b' ') {
        return Err(WsprError::InvalidCallsign(call.to_string()));
    }
    let digits = b.iter().filter(|c| c.is_ascii_digit()).count();
    // every real callsign has at least one letter
    if digits == b.len() {
        return Err(WsprError::InvalidCallsign(call.to_string()));
    }
    Ok(())
}

fn validate_grid6(grid: &str) -> Result<()> {
    let b = grid.as_bytes();
    let ok = b.len() == 6
        && (b'A'..=b'R').contains(&b[0])
        && (b'A'..=b'R').contains(&b[1])
        && b[2].is_ascii_digit()
        && b[3].is_ascii_digit()
        && b[4].is_ascii_uppercase()
        && b[5].is_ascii_uppercase();
    if ok {
        Ok(())
    } else {
        Err(WsprError::InvalidGrid(grid.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::InMemoryHashTable;
    use crate::message::Message;
    use crate::pack::{pack_callsign, pack_payload};

    fn payload_bits(n1: u32, n2: u32) -> Vec<u8> {
        let v = (((n1 as u128) << 22) | n2 as u128) << 31;
        (0..81).map(|i| ((v >> (80 - i)) & 1) as u8).collect()
    }

    #[test]
    fn test_type1_roundtrip() {
        let msg = Message::new("K1JT", "FN20", 37).unwrap();
        let payload = pack_payload(&msg).unwrap();
        let bits: Vec<u8> = (0..81)
            .map(|i| (payload[i / 8] >> (7 - i % 8)) & 1)
            .collect();
        let mut table = InMemoryHashTable::new();
        let un = unpack_payload(&bits, &mut table).unwrap();
        assert_eq!(un.callsign, "K1JT");
        assert_eq!(un.grid, "FN20");
        assert_eq!(un.power_dbm, 37);
        assert_eq!(un.text, "K1JT FN20 37");
        // a Type 1 decode seeds the hash table
        assert_eq!(table.lookup(callsign_hash("K1JT")).as_deref(), Some("K1JT"));
    }

    #[test]
    fn test_type2_prefix() {
        // construct a Type 2 payload: prefix "PJ4" on K1ABC, 37 dBm
        let npfx = ((25u32 * 37) + 19) * 37 + 4; // "PJ4"
        let nadd = npfx / 32768 + 1;
        let n2 = (npfx % 32768) * 128 + (37 + nadd) as u32 + 64;
        let n1 = pack_callsign("K1ABC").unwrap();
        let mut table = InMemoryHashTable::new();
        let un = unpack_payload(&payload_bits(n1, n2), &mut table).unwrap();
        assert_eq!(un.callsign, "PJ4/K1ABC");
        assert_eq!(un.power_dbm, 37);
        assert_eq!(un.grid, "");
        assert_eq!(un.text, "PJ4/K1ABC 37");
        // the compound call is now resolvable by hash
        assert_eq!(
            table.lookup(callsign_hash("PJ4/K1ABC")).as_deref(),
            Some("PJ4/K1ABC")
        );
    }

    #[test]
    fn test_type2_suffix() {
        let npfx = 60000 + 10 + (b'P' - b'A') as u32; // "/P"
        let nadd = npfx / 32768 + 1;
        let n2 = (npfx % 32768) * 128 + (30 + nadd) as u32 + 64;
        let n1 = pack_callsign("VK7AB").unwrap();
        let mut table = InMemoryHashTable::new();
        let un = unpack_payload(&payload_bits(n1, n2), &mut table).unwrap();
        assert_eq!(un.callsign, "VK7AB/P");
        assert_eq!(un.power_dbm, 30);
    }

    #[test]
    fn test_type3_resolved_and_unresolved() {
        // grid6 "FN20QX" travels in the callsign field rotated left by one,
        // packed with the callsign radix: N,2,0,Q,X,F -> c0,c1,d,s0,s1,s2
        let stored = "N20QXF";
        let n1 = {
            let b = stored.as_bytes();
            let mut n = (b[0] - b'A') as u32 + 10;
            n = n * 36 + (b[1] - b'0') as u32;
            n = n * 10 + (b[2] - b'0') as u32;
            n = n * 27 + (b[3] - b'A') as u32;
            n = n * 27 + (b[4] - b'A') as u32;
            n * 27 + (b[5] - b'A') as u32
        };
        let hash = callsign_hash("PJ4/K1ABC") as u32;
        let ndbm = 33;
        let n2 = hash * 128 + (63 - ndbm) as u32;
        let mut table = InMemoryHashTable::new();
        // unresolved first
        let un = unpack_payload(&payload_bits(n1, n2), &mut table).unwrap();
        assert_eq!(un.callsign, "<...>");
        assert_eq!(un.grid, "FN20QX");
        assert_eq!(un.power_dbm, ndbm);
        assert_eq!(un.text, "<...> FN20QX 33");
        // after the table learns the call, the same payload resolves
        table.insert(hash as u16, "PJ4/K1ABC");
        let un = unpack_payload(&payload_bits(n1, n2), &mut table).unwrap();
        assert_eq!(un.callsign, "<PJ4/K1ABC>");
        assert_eq!(un.text, "<PJ4/K1ABC> FN20QX 33");
    }

    #[test]
    fn test_garbage_payload_rejected() {
        let mut table = InMemoryHashTable::new();
        // all-zero bits decode to an all-digit "callsign" and are rejected
        let bits = vec![0u8; 81];
        assert!(unpack_payload(&bits, &mut table).is_err());
    }
}
