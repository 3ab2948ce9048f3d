use rand::{thread_rng, Rng};

/// Length of every generated paste id.
pub const ID_LENGTH: usize = 10;

/// URL-safe alphabet ids are drawn from.
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Generate a random paste id using the thread-local RNG.
pub fn generate_id() -> String {
    generate_id_with(&mut thread_rng())
}

/// Generate a random paste id from the given entropy source.
///
/// Uniqueness is not guaranteed: with 64^10 possible ids a collision is
/// vanishingly rare, and the primary key constraint rejects it if it happens.
pub fn generate_id_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ID_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn ids_have_fixed_length_and_url_safe_chars() {
        for _ in 0..1000 {
            let id = generate_id();
            assert_eq!(id.len(), ID_LENGTH);
            assert!(id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
        }
    }

    #[test]
    fn seeded_rng_is_deterministic() {
        let a = generate_id_with(&mut StdRng::seed_from_u64(42));
        let b = generate_id_with(&mut StdRng::seed_from_u64(42));
        let c = generate_id_with(&mut StdRng::seed_from_u64(43));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn ids_do_not_repeat_in_practice() {
        let ids: HashSet<String> = (0..10_000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }
}
