use tracing::info;

use crate::constants::{GENESIS_RECIPIENT, GENESIS_SENDER};
use crate::pow::{self, StopSignal};
use crate::{block_hash, now_millis, Block, ChainError, PreviousHash, Result, Transaction};

/// Staging area for transactions awaiting inclusion in the next block.
/// Drained exactly once per forged block.
#[derive(Clone, Debug, Default)]
pub struct TransactionPool {
    pending: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tx: Transaction) {
        self.pending.push(tx);
    }

    /// Empties the pool and returns the staged transactions in submission
    /// order.
    pub fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// The node's ledger: an append-only block sequence plus its staging
/// pool. The only chain mutations are `forge_block` (append) and
/// `replace` (wholesale swap by consensus resolution). Callers needing
/// concurrent access wrap the whole value in a mutex; every method
/// assumes it is the sole mutator for its duration.
#[derive(Debug)]
pub struct Chain {
    blocks: Vec<Block>,
    pool: TransactionPool,
    difficulty: u32,
}

impl Chain {
    /// A fresh chain holding only the genesis block.
    pub fn new(difficulty: u32, initial_balance: u64) -> Self {
        Self {
            blocks: vec![genesis_block(initial_balance)],
            pool: TransactionPool::new(),
            difficulty,
        }
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn last_block(&self) -> Result<&Block> {
        self.blocks.last().ok_or(ChainError::NoGenesis)
    }

    pub fn pool(&self) -> &TransactionPool {
        &self.pool
    }

    /// Stages a transaction for the next forged block and returns the
    /// index of the block that will hold it.
    pub fn submit_transaction(&mut self, tx: Transaction) -> Result<u64> {
        let next_index = self.last_block()?.index + 1;
        self.pool.push(tx);
        Ok(next_index)
    }

    /// Materializes a new block from the drained pool, the discovered
    /// nonce, and the predecessor link, then appends it.
    pub fn forge_block(&mut self, nonce: u64, previous_hash: PreviousHash) -> &Block {
        let block = Block {
            index: self.blocks.len() as u64 + 1,
            timestamp: now_millis(),
            transactions: self.pool.drain(),
            nonce,
            previous_hash,
        };
        self.blocks.push(block);
        self.blocks.last().expect("block just appended")
    }

    /// Mine one block: run the nonce search from the tail's nonce, then
    /// forge and append. Blocks the calling thread for the whole search;
    /// `stop` is the only way to bound it.
    pub fn mine_once(&mut self, stop: &StopSignal) -> Result<Block> {
        let tail = self.last_block()?;
        let last_nonce = tail.nonce;
        let previous_hash = block_hash(tail);
        let nonce = pow::search(last_nonce, self.difficulty, stop)?;
        let block = self
            .forge_block(nonce, PreviousHash::Digest(previous_hash))
            .clone();
        info!(index = block.index, nonce = block.nonce, "mined block");
        Ok(block)
    }

    /// Wholesale replacement with a longer peer chain. The pool is left
    /// untouched; staged transactions remain candidates for the next
    /// block on the adopted chain.
    pub fn replace(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
    }
}

/// Synthetic first block: index 1, sentinel predecessor link, and the
/// single initial-allocation transaction.
pub fn genesis_block(initial_balance: u64) -> Block {
    Block {
        index: 1,
        timestamp: now_millis(),
        transactions: vec![Transaction {
            sender: GENESIS_SENDER.to_string(),
            recipient: GENESIS_RECIPIENT.to_string(),
            amount: initial_balance,
        }],
        nonce: 0,
        previous_hash: PreviousHash::genesis(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::INITIAL_BALANCE;
    use crate::pow::valid_proof;

    #[test]
    fn genesis_block_invariants() {
        let genesis = genesis_block(INITIAL_BALANCE);
        assert_eq!(genesis.index, 1);
        assert_eq!(genesis.nonce, 0);
        assert_eq!(genesis.previous_hash, PreviousHash::genesis());
        assert_eq!(
            genesis.transactions,
            vec![Transaction {
                sender: "genesis".to_string(),
                recipient: "0".to_string(),
                amount: INITIAL_BALANCE,
            }]
        );
    }

    #[test]
    fn new_chain_holds_only_genesis() {
        let chain = Chain::new(1, INITIAL_BALANCE);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.last_block().unwrap().index, 1);
        assert!(chain.pool().is_empty());
    }

    #[test]
    fn submit_transaction_reports_next_block_index() {
        let mut chain = Chain::new(1, INITIAL_BALANCE);
        let tx = Transaction {
            sender: "alice".to_string(),
            recipient: "bob".to_string(),
            amount: 10,
        };
        assert_eq!(chain.submit_transaction(tx.clone()).unwrap(), 2);
        assert_eq!(chain.pool().pending(), &[tx]);
    }

    #[test]
    fn mine_once_links_to_genesis_and_drains_pool() {
        let mut chain = Chain::new(1, INITIAL_BALANCE);
        let tx = Transaction {
            sender: "alice".to_string(),
            recipient: "bob".to_string(),
            amount: 10,
        };
        chain.submit_transaction(tx.clone()).unwrap();
        let genesis_digest = block_hash(chain.last_block().unwrap());
        let genesis_nonce = chain.last_block().unwrap().nonce;

        let block = chain.mine_once(&StopSignal::new()).unwrap();

        assert_eq!(chain.len(), 2);
        assert_eq!(block.index, 2);
        assert_eq!(block.previous_hash, PreviousHash::Digest(genesis_digest));
        assert!(valid_proof(genesis_nonce, block.nonce, 1));
        assert_eq!(block.transactions, vec![tx]);
        assert!(chain.pool().is_empty());
    }

    #[test]
    fn mine_once_with_empty_pool_forges_empty_block() {
        let mut chain = Chain::new(1, INITIAL_BALANCE);
        let block = chain.mine_once(&StopSignal::new()).unwrap();
        assert_eq!(block.index, 2);
        assert!(block.transactions.is_empty());
    }

    #[test]
    fn mine_once_without_genesis_fails() {
        let mut chain = Chain::new(1, INITIAL_BALANCE);
        chain.replace(Vec::new());
        let err = chain.mine_once(&StopSignal::new()).unwrap_err();
        assert!(matches!(err, ChainError::NoGenesis));
    }

    #[test]
    fn replace_swaps_blocks_but_keeps_pool() {
        let mut chain = Chain::new(1, INITIAL_BALANCE);
        chain
            .submit_transaction(Transaction {
                sender: "alice".to_string(),
                recipient: "bob".to_string(),
                amount: 1,
            })
            .unwrap();
        let mut other = Chain::new(1, INITIAL_BALANCE);
        other.mine_once(&StopSignal::new()).unwrap();
        let adopted = other.blocks().to_vec();

        chain.replace(adopted.clone());

        assert_eq!(chain.blocks(), adopted.as_slice());
        assert_eq!(chain.pool().len(), 1);
    }
}
