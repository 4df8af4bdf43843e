/*!
   Utilities for random value generation.
*/

use rand::Rng;

/// Generates a random `u32` value.
pub fn random_u32() -> u32 {
    let mut rng = rand::thread_rng();
    rng.gen()
}
