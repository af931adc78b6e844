//! Public quiz codes: six symbols from an alphabet without `0/O/1/I`.

use rand::Rng;

pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CODE_LENGTH: usize = 6;

/// How many fresh codes to try before giving up on a collision streak.
pub const MAX_CODE_ATTEMPTS: usize = 20;

pub fn random_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Normalize user-typed codes; participants often enter them in lowercase.
pub fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
