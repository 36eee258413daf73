//! 15-bit callsign hashing and the hash table that resolves Type 2/3
//! messages back to plain callsigns.
//!
//! The hash is Bob Jenkins' lookup3 `hashlittle` with initial value 146,
//! masked to 15 bits. Every conforming decoder computes the same hash, so a
//! compound call learned from one transmission resolves hash references in
//! later ones.

use std::collections::HashMap;

const HASH_INIT: u32 = 146;

#[inline]
fn rot(x: u32, k: u32) -> u32 {
    x.rotate_left(k)
}

fn word(key: &[u8], i: usize) -> u32 {
    let mut w = 0u32;
    for j in (0..4).rev() {
        w = (w << 8) | *key.get(i + j).unwrap_or(&0) as u32;
    }
    w
}

/// lookup3 `hashlittle` over an ASCII key.
fn hashlittle(key: &[u8], initval: u32) -> u32 {
    let mut a = 0xdead_beefu32
        .wrapping_add(key.len() as u32)
        .wrapping_add(initval);
    let mut b = a;
    let mut c = a;

    let mut k = key;
    while k.len() > 12 {
        a = a.wrapping_add(word(k, 0));
        b = b.wrapping_add(word(k, 4));
        c = c.wrapping_add(word(k, 8));
        // mix
        a = a.wrapping_sub(c) ^ rot(c, 4);
        c = c.wrapping_add(b);
        b = b.wrapping_sub(a) ^ rot(a, 6);
        a = a.wrapping_add(c);
        c = c.wrapping_sub(b) ^ rot(b, 8);
        b = b.wrapping_add(a);
        a = a.wrapping_sub(c) ^ rot(c, 16);
        c = c.wrapping_add(b);
        b = b.wrapping_sub(a) ^ rot(a, 19);
        a = a.wrapping_add(c);
        c = c.wrapping_sub(b) ^ rot(b, 4);
        b = b.wrapping_add(a);
        k = &k[12..];
    }

    if k.is_empty() {
        return c;
    }
    if k.len() >= 9 {
        c = c.wrapping_add(word(k, 8));
    }
    if k.len() >= 5 {
        b = b.wrapping_add(word(k, 4));
    }
    a = a.wrapping_add(word(k, 0));

    // final
    c ^= b;
    c = c.wrapping_sub(rot(b, 14));
    a ^= c;
    a = a.wrapping_sub(rot(c, 11));
    b ^= a;
    b = b.wrapping_sub(rot(a, 25));
    c ^= b;
    c = c.wrapping_sub(rot(b, 16));
    a ^= c;
    a = a.wrapping_sub(rot(c, 4));
    b ^= a;
    b = b.wrapping_sub(rot(a, 14));
    c ^= b;
    c = c.wrapping_sub(rot(b, 24));
    c
}

/// 15-bit hash of a callsign as transmitted in Type 3 messages.
pub fn callsign_hash(call: &str) -> u16 {
    (hashlittle(call.to_ascii_uppercase().as_bytes(), HASH_INIT) & 32767) as u16
}

/// Resolver for hashed callsigns. The decoder inserts on every successful
/// plain-callsign decode and looks up when a Type 2/3 message carries only a
/// hash. Backed by an in-memory map by default; implement this trait to
/// persist entries or stub them out in tests.
pub trait CallsignHashTable {
    fn lookup(&self, hash: u16) -> Option<String>;
    fn insert(&mut self, hash: u16, callsign: &str);
}

/// Process-lifetime map from hash to the last callsign seen with it.
#[derive(Debug, Default)]
pub struct InMemoryHashTable {
    entries: HashMap<u16, String>,
}

impl InMemoryHashTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CallsignHashTable for InMemoryHashTable {
    fn lookup(&self, hash: u16) -> Option<String> {
        self.entries.get(&hash).cloned()
    }

    fn insert(&mut self, hash: u16, callsign: &str) {
        self.entries.insert(hash, callsign.to_string());
    }
}
