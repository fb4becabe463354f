//! Pluggable OID generation.
//!
//! Production uses the OS-seeded random generator. Tests can install a
//! fixed OID, a predetermined sequence (failing fast when exhausted), or a
//! monotone counter formatted as `%040d`. The generator is process-wide;
//! [`GeneratorGuard`] restores the random generator on drop so each test
//! case starts clean.

use std::sync::Mutex;

use rand::RngCore;

use crate::oid::Oid;

/// Strategy for allocating random-mode OIDs.
pub enum OidGenerator {
    /// 160 random bits from the OS-seeded RNG.
    Random,
    /// Always the same OID.
    Fixed(Oid),
    /// A predetermined sequence; panics when exhausted (test misconfiguration).
    Sequence(Vec<Oid>, usize),
    /// Monotone counter rendered as 40 decimal digits.
    Counter(u64),
}

static GENERATOR: Mutex<OidGenerator> = Mutex::new(OidGenerator::Random);

pub(crate) fn next() -> Oid {
    let mut gen = GENERATOR.lock().expect("oid generator lock poisoned");
    match &mut *gen {
        OidGenerator::Random => {
            let mut bytes = [0u8; 20];
            rand::thread_rng().fill_bytes(&mut bytes);
            let mut hex = String::with_capacity(Oid::LEN);
            for byte in bytes {
                hex.push_str(&format!("{byte:02x}"));
            }
            Oid::from_raw_hex(hex)
        }
        OidGenerator::Fixed(oid) => oid.clone(),
        OidGenerator::Sequence(oids, cursor) => {
            let Some(oid) = oids.get(*cursor) else {
                panic!("{}", crate::OidError::SequenceExhausted(oids.len()));
            };
            *cursor += 1;
            oid.clone()
        }
        OidGenerator::Counter(n) => {
            *n += 1;
            Oid::from_raw_hex(format!("{n:040}"))
        }
    }
}

/// Install a generator, returning a guard that restores the random
/// generator when dropped.
pub fn set_generator(generator: OidGenerator) -> GeneratorGuard {
    *GENERATOR.lock().expect("oid generator lock poisoned") = generator;
    GeneratorGuard { _private: () }
}

/// Install a fixed OID for every allocation.
pub fn use_fixed(oid: Oid) -> GeneratorGuard {
    set_generator(OidGenerator::Fixed(oid))
}

/// Install a predetermined sequence.
pub fn use_sequence(oids: Vec<Oid>) -> GeneratorGuard {
    set_generator(OidGenerator::Sequence(oids, 0))
}

/// Install the `%040d` counter, starting at 1.
pub fn use_counter() -> GeneratorGuard {
    set_generator(OidGenerator::Counter(0))
}

/// Restores the random generator on drop.
pub struct GeneratorGuard {
    _private: (),
}

impl Drop for GeneratorGuard {
    fn drop(&mut self) {
        *GENERATOR.lock().expect("oid generator lock poisoned") = OidGenerator::Random;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The generator is process-wide; serialize tests that touch it.
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    fn lock() -> std::sync::MutexGuard<'static, ()> {
        TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn random_produces_valid_oids() {
        let _lock = lock();
        let a = Oid::random();
        let b = Oid::random();
        assert_eq!(a.as_str().len(), Oid::LEN);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn counter_formats_forty_digits() {
        let _lock = lock();
        let _guard = use_counter();
        assert_eq!(
            Oid::random().as_str(),
            "0000000000000000000000000000000000000001"
        );
        assert_eq!(
            Oid::random().as_str(),
            "0000000000000000000000000000000000000002"
        );
    }

    #[test]
    fn fixed_repeats() {
        let _lock = lock();
        let oid = Oid::from_bytes(b"fixed");
        let _guard = use_fixed(oid.clone());
        assert_eq!(Oid::random(), oid);
        assert_eq!(Oid::random(), oid);
    }

    #[test]
    fn sequence_yields_in_order() {
        let _lock = lock();
        let oids = vec![Oid::from_bytes(b"a"), Oid::from_bytes(b"b")];
        let _guard = use_sequence(oids.clone());
        assert_eq!(Oid::random(), oids[0]);
        assert_eq!(Oid::random(), oids[1]);
    }

    #[test]
    #[should_panic(expected = "oid sequence exhausted")]
    fn sequence_fails_fast_when_exhausted() {
        let _lock = lock();
        let _guard = use_sequence(vec![Oid::from_bytes(b"only")]);
        let _ = Oid::random();
        let _ = Oid::random();
    }

    #[test]
    fn guard_restores_random() {
        let _lock = lock();
        {
            let _guard = use_counter();
            let _ = Oid::random();
        }
        let a = Oid::random();
        let b = Oid::random();
        assert_ne!(a, b);
    }
}
