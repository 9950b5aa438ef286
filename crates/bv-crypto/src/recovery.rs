//! Recovery-key codec: the user-held "master key" token
//!
//! A key is 22 random characters from a 64-character URL-safe alphabet
//! followed by a 2-character CRC-8 checksum in base-32 digits. The
//! checksum catches typos before the key is fed to the KDF — it is not
//! authentication, and a passing key may still fail to decrypt.
//!
//! Generated once at signup, shown once, never stored in plaintext.

use rand::Rng;

/// URL-safe alphabet for the identifier part (64 characters).
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Base-32 digits for the checksum suffix.
const BASE32_DIGITS: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

const ID_LEN: usize = 22;
const CHECKSUM_LEN: usize = 2;
const KEY_LEN: usize = ID_LEN + CHECKSUM_LEN;

/// CRC-8, polynomial 0x07, init 0 — detects every single-character
/// substitution in the identifier (burst length 8 = degree 8).
fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x07
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Two base-32 digits, zero-padded (0x00 → "00", 0xFF → "7v").
fn checksum_suffix(id: &[u8]) -> [u8; CHECKSUM_LEN] {
    let crc = crc8(id);
    [
        BASE32_DIGITS[(crc >> 5) as usize],
        BASE32_DIGITS[(crc & 0x1f) as usize],
    ]
}

/// Generate a fresh 24-character recovery key.
pub fn generate_key() -> String {
    let mut rng = rand::rngs::OsRng;
    let mut key = Vec::with_capacity(KEY_LEN);
    for _ in 0..ID_LEN {
        key.push(ALPHABET[rng.gen_range(0..ALPHABET.len())]);
    }
    key.extend_from_slice(&checksum_suffix(&key[..ID_LEN]));
    String::from_utf8(key).expect("alphabet is ASCII")
}

/// Check length and checksum. Typo detection only — never treat a
/// passing key as authenticated.
pub fn validate_key(key: &str) -> bool {
    let bytes = key.as_bytes();
    if bytes.len() != KEY_LEN {
        return false;
    }
    let (id, suffix) = bytes.split_at(ID_LEN);
    checksum_suffix(id) == suffix
}
