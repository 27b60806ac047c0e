//! Shared-secret checks for the admin token and the payment webhook secret.

/// Compares a presented secret against the configured one without
/// short-circuiting on the first differing byte.
pub fn secret_matches(provided: Option<&str>, expected: &str) -> bool {
    let Some(provided) = provided else {
        return false;
    };
    let (a, b) = (provided.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
