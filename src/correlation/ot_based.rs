use super::{CorrelationForReceiver, CorrelationForSender, Delta, ReceiverSeed, SenderSeed};
use crate::error::OprfError;
use anyhow::{bail, Context, Error, Result};
use ocelot::ot::{Receiver as OtReceiver, Sender as OtSender};
use rand::{CryptoRng, Rng};
use scuttlebutt::channel::AbstractChannel;
use scuttlebutt::{Block, SemiHonest};
use std::marker::PhantomData;
use tracing::debug;

/// OT-backed provider for the OPRF receiver: runs `OT` as the OT sender of random seed pairs.
pub struct OtCorrelationForReceiver<OT>(PhantomData<fn() -> OT>)
where
    OT: OtSender<Msg = Block> + SemiHonest;

impl<OT> Clone for OtCorrelationForReceiver<OT>
where
    OT: OtSender<Msg = Block> + SemiHonest,
{
    fn clone(&self) -> Self {
        Self(PhantomData)
    }
}

impl<OT> Copy for OtCorrelationForReceiver<OT> where OT: OtSender<Msg = Block> + SemiHonest {}

impl<OT> Default for OtCorrelationForReceiver<OT>
where
    OT: OtSender<Msg = Block> + SemiHonest,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<OT> OtCorrelationForReceiver<OT>
where
    OT: OtSender<Msg = Block> + SemiHonest,
{
    /// Create a new provider.
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<OT> CorrelationForReceiver for OtCorrelationForReceiver<OT>
where
    OT: OtSender<Msg = Block> + SemiHonest,
{
    fn produce<C: AbstractChannel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        count: usize,
    ) -> Result<Vec<(ReceiverSeed, ReceiverSeed)>, Error> {
        let keys = (0..count)
            .map(|_| (rng.gen::<Block>(), rng.gen::<Block>()))
            .collect::<Vec<_>>();

        let mut ot = OT::init(channel, rng).with_context(|| format!("@{}:{}", file!(), line!()))?;
        ot.send(channel, &keys, rng)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        debug!(count, "sent seed pairs through OT");

        Ok(keys
            .into_iter()
            .map(|(k0, k1)| (ReceiverSeed::new(k0), ReceiverSeed::new(k1)))
            .collect())
    }
}

/// OT-backed provider for the OPRF sender: runs `OT` as the OT receiver with choice bits $`\Delta`$.
pub struct OtCorrelationForSender<OT>(PhantomData<fn() -> OT>)
where
    OT: OtReceiver<Msg = Block> + SemiHonest;

impl<OT> Clone for OtCorrelationForSender<OT>
where
    OT: OtReceiver<Msg = Block> + SemiHonest,
{
    fn clone(&self) -> Self {
        Self(PhantomData)
    }
}

impl<OT> Copy for OtCorrelationForSender<OT> where OT: OtReceiver<Msg = Block> + SemiHonest {}

impl<OT> Default for OtCorrelationForSender<OT>
where
    OT: OtReceiver<Msg = Block> + SemiHonest,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<OT> OtCorrelationForSender<OT>
where
    OT: OtReceiver<Msg = Block> + SemiHonest,
{
    /// Create a new provider.
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<OT> CorrelationForSender for OtCorrelationForSender<OT>
where
    OT: OtReceiver<Msg = Block> + SemiHonest,
{
    fn consume<C: AbstractChannel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        delta: &Delta,
    ) -> Result<Vec<SenderSeed>, Error> {
        let mut ot = OT::init(channel, rng).with_context(|| format!("@{}:{}", file!(), line!()))?;
        let keys = ot
            .receive(channel, &delta.to_bits(), rng)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        if keys.len() != delta.len() {
            bail!(OprfError::ParameterMismatch {
                what: "OT outputs",
                expected: delta.len(),
                actual: keys.len(),
            });
        }

        debug!(count = keys.len(), "received chosen seeds through OT");

        Ok(keys.into_iter().map(SenderSeed::new).collect())
    }
}
