//! Test helpers shared by unit tests across this crate.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ======================================================================
// FUNCTIONS - CRATE

/// Generates a reproducible pseudo-random payload of `len` bytes.
pub(crate) fn generate_payload(len: usize, seed: u8) -> Vec<u8> {
    let mut rng = ChaCha8Rng::from_seed([seed; 32]);
    let mut payload = vec![0u8; len];
    rng.fill::<[u8]>(&mut payload);
    payload
}
