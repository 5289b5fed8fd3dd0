use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::{ChainError, Result};

/// Cooperative cancellation flag shared with an in-flight nonce search.
/// Cloning hands out another handle to the same flag.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Proof predicate: the hex digest of the decimal concatenation
/// `"{last_nonce}{nonce}"` must start with `difficulty` `'0'` characters.
pub fn valid_proof(last_nonce: u64, nonce: u64, difficulty: u32) -> bool {
    let digest = Sha256::digest(format!("{last_nonce}{nonce}").as_bytes());
    leading_zero_hex_digits(&digest) >= difficulty
}

/// Search nonces from 0 upward until the proof predicate holds against
/// `last_nonce`. The search has no upper bound; the stop signal is
/// checked once per candidate and aborts with `Interrupted`.
pub fn search(last_nonce: u64, difficulty: u32, stop: &StopSignal) -> Result<u64> {
    let mut nonce = 0u64;
    loop {
        if stop.is_triggered() {
            return Err(ChainError::Interrupted);
        }
        if valid_proof(last_nonce, nonce, difficulty) {
            return Ok(nonce);
        }
        nonce += 1;
    }
}

pub fn leading_zero_hex_digits(digest: &[u8]) -> u32 {
    let mut total = 0u32;
    for b in digest {
        if *b == 0 {
            total += 2;
        } else {
            if b >> 4 == 0 {
                total += 1;
            }
            break;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_zero_hex_digit_examples() {
        let mut d = [0u8; 32];
        assert_eq!(leading_zero_hex_digits(&d), 64);
        d[0] = 0x0F; // "0f..."
        assert_eq!(leading_zero_hex_digits(&d), 1);
        d[0] = 0xF0; // "f0..."
        assert_eq!(leading_zero_hex_digits(&d), 0);
        d = [0u8; 32];
        d[1] = 0x80; // "0080..."
        assert_eq!(leading_zero_hex_digits(&d), 2);
        d[1] = 0x08; // "0008..."
        assert_eq!(leading_zero_hex_digits(&d), 3);
    }

    #[test]
    fn zero_difficulty_accepts_everything() {
        assert!(valid_proof(0, 0, 0));
        assert!(valid_proof(123, 456, 0));
        let stop = StopSignal::new();
        assert_eq!(search(99, 0, &stop).unwrap(), 0);
    }

    #[test]
    fn search_finds_known_nonces() {
        let stop = StopSignal::new();
        // sha256("03") = "0b8efa..." is the first digest with a zero prefix.
        assert_eq!(search(0, 1, &stop).unwrap(), 3);
        assert_eq!(search(3, 1, &stop).unwrap(), 9);
        assert_eq!(search(0, 2, &stop).unwrap(), 563);
        assert_eq!(search(100, 1, &stop).unwrap(), 16);
    }

    #[test]
    fn search_returns_smallest_satisfying_nonce() {
        let stop = StopSignal::new();
        for last_nonce in [0u64, 7, 42, 1_000] {
            let found = search(last_nonce, 1, &stop).unwrap();
            assert!(valid_proof(last_nonce, found, 1));
            for candidate in 0..found {
                assert!(!valid_proof(last_nonce, candidate, 1));
            }
        }
    }

    #[test]
    fn triggered_stop_interrupts_search() {
        let stop = StopSignal::new();
        stop.trigger();
        // Difficulty 64 can never be met, so only the stop check exits.
        let err = search(0, 64, &stop).unwrap_err();
        assert!(matches!(err, ChainError::Interrupted));
    }

    #[test]
    fn stop_signal_clones_share_state() {
        let stop = StopSignal::new();
        let other = stop.clone();
        assert!(!other.is_triggered());
        stop.trigger();
        assert!(other.is_triggered());
    }
}
