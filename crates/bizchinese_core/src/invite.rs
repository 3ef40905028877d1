//! crates/bizchinese_core/src/invite.rs
//!
//! Referral codes.

use rand::Rng;

pub const INVITE_CODE_LEN: usize = 6;
/// Quota granted to both the inviter and the new user when a code is redeemed.
pub const INVITE_REWARD: i32 = 3;
pub const DEFAULT_INVITE_QUOTA: i32 = 3;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Codes are typed by hand, so accept any case and stray whitespace.
pub fn normalize_invite_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    let valid = code.len() == INVITE_CODE_LEN && code.bytes().all(|b| CODE_ALPHABET.contains(&b));
    valid.then_some(code)
}

pub fn invite_link(app_url: &str, code: &str) -> String {
    format!("{}/login?invite_code={}", app_url.trim_end_matches('/'), code)
}
