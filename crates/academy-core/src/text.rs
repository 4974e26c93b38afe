//! Slugs and random tokens.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use rand::distributions::{Alphanumeric, Uniform};

/// Lowercase ASCII slug: word characters kept, whitespace and hyphen runs
/// collapsed to a single `-`, leading and trailing `-`/`_` stripped.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for c in value.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Uppercase letters and digits, e.g. `7QK2M9XA`.
pub fn random_code(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect()
}

/// A numeric code of `len` digits, zero padded.
pub fn random_digits(len: usize) -> String {
    let digits = Uniform::from(0..10u8);
    rand::thread_rng()
        .sample_iter(digits)
        .take(len)
        .map(|d| char::from(b'0' + d))
        .collect()
}

/// URL-safe base64 of `nbytes` random bytes, without padding.
pub fn url_safe_token(nbytes: usize) -> String {
    let mut bytes = vec![0u8; nbytes];
    rand::thread_rng().fill(bytes.as_mut_slice());
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Intro to Rust"), "intro-to-rust");
        assert_eq!(slugify("  Web   Development -- 101 "), "web-development-101");
        assert_eq!(slugify("C++ & Data!"), "c-data");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn random_code_shape() {
        let code = random_code(8);
        assert_eq!(code.len(), 8);
        assert!(
            code.chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn random_digits_shape() {
        let code = random_digits(6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn url_safe_token_has_no_padding() {
        let token = url_safe_token(10);
        assert!(!token.contains('='));
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
        assert_eq!(token.len(), 14);
    }
}
