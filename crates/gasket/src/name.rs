//! 64-bit packed identifiers used for action and table names.
//!
//! A name holds up to 13 characters from `.12345abcdefghijklmnopqrstuvwxyz`.
//! The first 12 characters take 5 bits each, from the most significant end;
//! the 13th takes the remaining 4 bits and so only reaches `.` to `j`.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// A packed 64-bit name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Name(pub u64);

fn symbol(c: u8) -> u64 {
    match c {
        b'a'..=b'z' => (c - b'a') as u64 + 6,
        b'1'..=b'5' => (c - b'1') as u64 + 1,
        _ => 0,
    }
}

impl Name {
    /// Pack a string without checking it; unknown characters become `.`.
    pub fn pack(s: &str) -> Self {
        let bytes = s.as_bytes();
        let mut value = 0u64;
        for i in 0..13 {
            let c = bytes.get(i).map_or(0, |&c| symbol(c));
            value |= if i < 12 {
                (c & 0x1f) << (64 - 5 * (i + 1))
            } else {
                c & 0x0f
            };
        }
        Name(value)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = [b'.'; 13];
        let mut tmp = self.0;
        for i in 0..13 {
            let mask = if i == 0 { 0x0f } else { 0x1f };
            out[12 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= if i == 0 { 4 } else { 5 };
        }
        let len = out.iter().rposition(|&c| c != b'.').map_or(0, |p| p + 1);
        // CHARMAP is ASCII
        f.write_str(std::str::from_utf8(&out[..len]).map_err(|_| fmt::Error)?)
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > 13 {
            return Err(Error::InvalidName(format!(
                "name is longer than 13 characters ({s})"
            )));
        }
        let name = Name::pack(s);
        let normalized = name.to_string();
        if normalized != s {
            return Err(Error::InvalidName(format!(
                "name not properly normalized (name: {s}, normalized: {normalized})"
            )));
        }
        Ok(name)
    }
}

impl From<u64> for Name {
    fn from(v: u64) -> Self {
        Name(v)
    }
}

impl From<Name> for u64 {
    fn from(n: Name) -> Self {
        n.0
    }
}
