use super::{CorrelationForReceiver, CorrelationForSender, Delta, ReceiverSeed, SenderSeed};
use anyhow::{Error, Result};
use rand::{CryptoRng, Rng, SeedableRng};
use scuttlebutt::channel::AbstractChannel;
use scuttlebutt::{AesRng, Block};

/// Ideal provider: both roles derive the seed pairs from the same dealer seed.
///
/// Give both parties a `DealerCorrelation` built from the same seed. Nothing is sent over the
/// channel, so anyone knowing the seed knows both seeds of every column. Only use it where
/// that's acceptable (tests, benchmarks, simulations).
#[derive(Clone, Copy, Debug)]
pub struct DealerCorrelation {
    seed: Block,
}

impl DealerCorrelation {
    /// Provider expanding `seed`.
    pub fn new(seed: Block) -> Self {
        Self { seed }
    }

    fn pairs(&self, count: usize) -> Vec<(Block, Block)> {
        let mut rng = AesRng::from_seed(self.seed);
        (0..count)
            .map(|_| (rng.gen::<Block>(), rng.gen::<Block>()))
            .collect()
    }
}

impl CorrelationForReceiver for DealerCorrelation {
    fn produce<C: AbstractChannel, RNG: CryptoRng + Rng>(
        &mut self,
        _channel: &mut C,
        _rng: &mut RNG,
        count: usize,
    ) -> Result<Vec<(ReceiverSeed, ReceiverSeed)>, Error> {
        Ok(self
            .pairs(count)
            .into_iter()
            .map(|(k0, k1)| (ReceiverSeed::new(k0), ReceiverSeed::new(k1)))
            .collect())
    }
}

impl CorrelationForSender for DealerCorrelation {
    fn consume<C: AbstractChannel, RNG: CryptoRng + Rng>(
        &mut self,
        _channel: &mut C,
        _rng: &mut RNG,
        delta: &Delta,
    ) -> Result<Vec<SenderSeed>, Error> {
        Ok(self
            .pairs(delta.len())
            .into_iter()
            .enumerate()
            .map(|(j, (k0, k1))| SenderSeed::new(if delta.bit(j) { k1 } else { k0 }))
            .collect())
    }
}
