use rand::Rng;

/// Characters allowed in a session code. Excludes I, O, 0 and 1.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const CODE_LENGTH: usize = 5;

/// Generate a random session code (e.g. "K7MPQ").
pub fn generate_session_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Trim and upper-case user-entered code text.
pub fn normalize_session_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Whether an already-normalized code is well formed.
pub fn is_valid_session_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| CODE_ALPHABET.contains(&b))
}
