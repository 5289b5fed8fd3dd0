use crate::pow;
use crate::{block_hash, Block, PreviousHash};

/// Structural and proof-of-work consistency of a whole chain. Walks
/// consecutive pairs checking the stored predecessor digest and the
/// nonce-pair proof, returning false at the first failing pair. Empty
/// and genesis-only chains are vacuously valid.
///
/// The proof check relates consecutive nonces only; it does not bind the
/// remaining fields of a block at mining time. That is the chain format
/// peers exchange, preserved as-is.
pub fn is_valid(blocks: &[Block], difficulty: u32) -> bool {
    for pair in blocks.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        if cur.previous_hash != PreviousHash::Digest(block_hash(prev)) {
            return false;
        }
        if !pow::valid_proof(prev.nonce, cur.nonce, difficulty) {
            return false;
        }
    }
    true
}
