//! AES-CBC block producer.
//!
//! The producer encrypts its working buffer in place. CBC carries the
//! last ciphertext block into the next pass, so the output never repeats
//! even though the key and IV are fixed for the producer's lifetime.

use super::cancel::CancelToken;
use super::config::{ProducerConfig, BLOCK_SIZE, KEY_SIZE};
use crate::metrics::GeneratorMetrics;
use crate::seed::{SeedError, SeedSource};
use aes::Aes128;
use cbc::cipher::{generic_array::GenericArray, BlockEncryptMut, KeyIvInit};
use crossbeam::channel::{select, Sender};

type Encryptor = cbc::Encryptor<Aes128>;

/// A single seeded generator of pseudo-random buffers.
pub struct BlockProducer {
    /// Identifier for logging.
    id: usize,
    /// Chained encryptor; its IV register advances with every block.
    encryptor: Encryptor,
    /// Working buffer, always `blocks * BLOCK_SIZE` bytes.
    buffer: Vec<u8>,
    /// Current buffer size in cipher blocks.
    blocks: usize,
    /// Growth bounds.
    config: ProducerConfig,
    /// Encryption passes completed.
    passes: u64,
}

impl BlockProducer {
    /// Seeds a new producer with a fresh key and IV from `seed`.
    ///
    /// Fails if the seed source cannot supply the full key and IV; a
    /// producer is never built from partial seed material.
    pub fn new(
        id: usize,
        config: ProducerConfig,
        seed: &dyn SeedSource,
    ) -> Result<Self, SeedError> {
        let mut key = [0u8; KEY_SIZE];
        let mut iv = [0u8; BLOCK_SIZE];
        seed.fill(&mut key)?;
        seed.fill(&mut iv)?;

        let encryptor = Encryptor::new(&key.into(), &iv.into());
        key.fill(0);
        iv.fill(0);

        Ok(Self {
            id,
            encryptor,
            buffer: vec![0u8; config.min_blocks * BLOCK_SIZE],
            blocks: config.min_blocks,
            config,
            passes: 0,
        })
    }

    /// Returns true once the buffer has reached its cap.
    #[inline]
    pub fn is_capped(&self) -> bool {
        self.blocks >= self.config.max_blocks
    }

    /// Returns the number of encryption passes completed.
    #[inline]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Runs one encryption pass and returns the finished buffer.
    ///
    /// While growing, the finished buffer itself is handed out and a
    /// larger working buffer (finished bytes followed by zeros) takes its
    /// place. Once capped, the caller receives an independent copy and the
    /// working buffer is re-encrypted in place on the next pass.
    pub fn next_block(&mut self) -> Vec<u8> {
        for chunk in self.buffer.chunks_exact_mut(BLOCK_SIZE) {
            self.encryptor
                .encrypt_block_mut(GenericArray::from_mut_slice(chunk));
        }
        self.passes += 1;

        if self.is_capped() {
            return self.buffer.clone();
        }

        let next = self.config.next_blocks(self.blocks);
        let mut grown = Vec::with_capacity(next * BLOCK_SIZE);
        grown.extend_from_slice(&self.buffer);
        grown.resize(next * BLOCK_SIZE, 0);
        self.blocks = next;
        std::mem::replace(&mut self.buffer, grown)
    }

    /// Produces buffers until cancelled or until the handoff closes.
    ///
    /// Cancellation is only observed between passes: before starting a
    /// pass, and while parked offering a finished buffer.
    pub fn run(
        mut self,
        handoff: &Sender<Vec<u8>>,
        cancel: &CancelToken,
        metrics: &GeneratorMetrics,
    ) {
        tracing::debug!(producer = self.id, blocks = self.blocks, "Block producer started");

        while !cancel.is_cancelled() {
            let block = self.next_block();
            let len = block.len();

            select! {
                send(handoff, block) -> res => {
                    if res.is_err() {
                        tracing::debug!(producer = self.id, "Handoff channel closed");
                        break;
                    }
                    metrics.record_block(len);
                    tracing::trace!(producer = self.id, bytes = len, "Delivered block");
                }
                recv(cancel.receiver()) -> _ => break,
            }
        }

        tracing::debug!(
            producer = self.id,
            passes = self.passes,
            "Block producer stopped"
        );
    }
}

impl std::fmt::Debug for BlockProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockProducer")
            .field("id", &self.id)
            .field("blocks", &self.blocks)
            .field("passes", &self.passes)
            .finish_non_exhaustive()
    }
}
