//! Random slug and link id generation.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of generated link ids.
pub const ID_LENGTH: usize = 10;

/// Alphabet for generated slugs: lowercase letters and digits.
const SLUG_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// URL-safe alphabet for generated link ids.
const ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_-";

fn random_string(alphabet: &[u8], len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

/// Generates a random lowercase alphanumeric slug.
///
/// The output always matches the default slug pattern
/// `^[a-z0-9]+(?:-[a-z0-9]+)*$`.
pub fn generate_slug(len: usize) -> String {
    random_string(SLUG_ALPHABET, len.max(1))
}

/// Generates a random link id of [`ID_LENGTH`] characters.
pub fn generate_id() -> String {
    random_string(ID_ALPHABET, ID_LENGTH)
}

/// Generates a mixed-case token, used for secrets in the admin CLI.
pub fn generate_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
