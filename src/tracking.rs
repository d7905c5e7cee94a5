//! Public tracking codes: `HH-` followed by seven base-36 characters.

use rand::Rng;

pub const TRACKING_PREFIX: &str = "HH-";
pub const SUFFIX_LEN: usize = 7;

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub fn generate_tracking_code() -> String {
    generate_with(&mut rand::thread_rng())
}

pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}{}", TRACKING_PREFIX, suffix)
}

/// Trims user input; `None` when nothing is left to look up.
pub fn normalize(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
