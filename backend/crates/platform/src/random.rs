//! Random strings
//!
//! Uniform, independent draws from a caller-supplied alphabet. Not meant
//! for secrets; the rendezvous codes only need to be hard to collide.

use rand::Rng;
use rand::seq::IndexedRandom;

/// Draw `len` characters from `alphabet` using the thread RNG
pub fn random_string(alphabet: &[u8], len: usize) -> String {
    random_string_with(&mut rand::rng(), alphabet, len)
}

/// Draw `len` characters from `alphabet` using the given RNG
///
/// An empty alphabet yields an empty string.
pub fn random_string_with<R>(rng: &mut R, alphabet: &[u8], len: usize) -> String
where
    R: Rng + ?Sized,
{
    (0..len)
        .filter_map(|_| alphabet.choose(rng))
        .map(|&b| char::from(b))
        .collect()
}
