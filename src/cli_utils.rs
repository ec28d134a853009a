//! CLI (CommandLine Interface) utilities for the OPRF demo.
//!
//! Here, you can know the options for the protocol through enum types and structs.
//! See [oprf](crate::oprf) for what the options mean.

use crate::channel_utils::sync_channel::{create_unix_channels, UnixChannel};
use crate::channel_utils::sync_channel_by_cb::{create_crossbeam_channels, CrossbeamChannel};
use crate::channel_utils::tcp_channel::{create_tcp_channels, TcpChannel};
use crate::correlation::{
    CorrelationForReceiver, CorrelationForSender, DealerCorrelation, Delta, OtCorrelationForReceiver,
    OtCorrelationForSender, ReceiverSeed, SenderSeed,
};
use crate::oprf::{OprfConfig, OprfVariant};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use ocelot::ot::{AlszReceiver as OtReceiver, AlszSender as OtSender};
use rand::{CryptoRng, Rng};
use scuttlebutt::AbstractChannel;
use std::fmt::Display;

/// How correction data is sent. More details: [OprfVariant].
#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum VariantType {
    /// Two masked messages per column.
    Original,
    /// One correction per column.
    Optimized,
}

impl Display for VariantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariantType::Original => write!(f, "original"),
            VariantType::Optimized => write!(f, "optimized"),
        }
    }
}

impl From<VariantType> for OprfVariant {
    fn from(v: VariantType) -> Self {
        match v {
            VariantType::Original => OprfVariant::Original,
            VariantType::Optimized => OprfVariant::Optimized,
        }
    }
}

/// How the correlated seeds are produced. More details: [correlation](crate::correlation).
#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum CorrelationType {
    /// Use Oblivious Transfer. See [OtCorrelationForReceiver] or [OtCorrelationForSender].
    Ot,
    /// Use a trusted dealer seed shared by both roles. See [DealerCorrelation].
    Dealer,
}

impl Display for CorrelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorrelationType::Ot => write!(f, "ot"),
            CorrelationType::Dealer => write!(f, "dealer"),
        }
    }
}

/// Channel types. Channels are used to communicate between parties. More details: [channel_utils](crate::channel_utils).
#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum ChannelType {
    /// Unix domain socket. See [std::os::unix::net::UnixStream].
    Unix,
    /// TCP socket. See [std::net::TcpStream].
    Tcp,
    /// Native channel of Rust. See [crossbeam].
    CrossBeam,
}

impl Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelType::Unix => write!(f, "unix"),
            ChannelType::Tcp => write!(f, "tcp"),
            ChannelType::CrossBeam => write!(f, "cross-beam"),
        }
    }
}

/// Arguments for the OPRF demo.
/// This struct implements [clap::Parser] to make that this binary has CommandLine Arguments.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, next_line_help = true)]
pub struct DemoArgs {
    /// Correction variant.
    #[arg(short = 'v', long = "variant", default_value_t = VariantType::Optimized)]
    pub variant: VariantType,

    /// Number of inputs the receiver evaluates.
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub batch_size: usize,

    /// Number of evaluations the session is sized for (`0` means the batch size).
    #[arg(short = 'f', long, default_value_t = 0)]
    pub max_future_evaluations: usize,

    /// Number of positions where the sender's candidate equals the receiver's input.
    #[arg(short = 'm', long, default_value_t = 100)]
    pub common_size: usize,

    /// Channel Types.
    #[arg(short = 'c', long = "channel", default_value_t = ChannelType::Unix)]
    pub channel_type: ChannelType,

    /// Port number for TCP channel.
    ///
    /// The port is used internally on localhost.
    #[arg(short = 'p', long = "port", default_value_t = 10000)]
    pub port: u16,

    /// Correlated seed providers.
    #[arg(short = 'C', long = "correlation", default_value_t = CorrelationType::Ot)]
    pub correlation: CorrelationType,

    /// Worker threads of each role.
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    pub threads: usize,

    /// Verbose mode.
    ///
    /// If specified, log every protocol step and print the matching positions.
    #[arg(long = "verbose", default_value_t = false)]
    pub verbose: bool,
}

impl DemoArgs {
    /// Protocol configuration shared by both roles.
    pub fn config(&self) -> OprfConfig {
        OprfConfig::new(self.variant.into()).with_threads(self.threads)
    }
}

/// Enum type to handle multiple channel types on runtime.
pub enum ChannelUnion {
    /// Unix domain socket.
    Unix(UnixChannel),
    /// TCP socket.
    Tcp(TcpChannel),
    /// Native channel of Rust.
    CrossBeam(CrossbeamChannel),
}

use ChannelUnion::*;

impl AbstractChannel for ChannelUnion {
    #[inline(always)]
    fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        match self {
            Unix(c) => c.write_bytes(bytes),
            Tcp(c) => c.write_bytes(bytes),
            CrossBeam(c) => c.write_bytes(bytes),
        }
    }

    #[inline(always)]
    fn read_bytes(&mut self, bytes: &mut [u8]) -> std::io::Result<()> {
        match self {
            Unix(c) => c.read_bytes(bytes),
            Tcp(c) => c.read_bytes(bytes),
            CrossBeam(c) => c.read_bytes(bytes),
        }
    }

    #[inline(always)]
    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Unix(c) => c.flush(),
            Tcp(c) => c.flush(),
            CrossBeam(c) => c.flush(),
        }
    }

    #[inline(always)]
    fn clone(&self) -> Self {
        match self {
            Unix(c) => Unix(c.clone()),
            Tcp(c) => Tcp(c.clone()),
            CrossBeam(c) => CrossBeam(c.clone()),
        }
    }
}

/// Create `(receiver_channel, sender_channel)` for the protocol. Runtime utility.
pub fn create_channels(type_: ChannelType, port: u16) -> Result<(ChannelUnion, ChannelUnion)> {
    let res = match type_ {
        ChannelType::Unix => {
            let (r, s) = create_unix_channels()?;
            (Unix(r), Unix(s))
        }
        ChannelType::Tcp => {
            let (r, s) = create_tcp_channels(port)?;
            (Tcp(r), Tcp(s))
        }
        ChannelType::CrossBeam => {
            let (r, s) = create_crossbeam_channels();
            (CrossBeam(r), CrossBeam(s))
        }
    };

    Ok(res)
}

/// Enum type to handle multiple correlation providers for the receiver on runtime.
#[derive(Clone, Copy)]
pub enum CorrelationForReceiverUnion {
    /// Use Oblivious Transfer. See [OtCorrelationForReceiver].
    Ot(OtCorrelationForReceiver<OtSender>),
    /// Use a dealer seed. See [DealerCorrelation].
    Dealer(DealerCorrelation),
}

/// Enum type to handle multiple correlation providers for the sender on runtime.
#[derive(Clone, Copy)]
pub enum CorrelationForSenderUnion {
    /// Use Oblivious Transfer. See [OtCorrelationForSender].
    Ot(OtCorrelationForSender<OtReceiver>),
    /// Use a dealer seed. See [DealerCorrelation].
    Dealer(DealerCorrelation),
}

impl CorrelationForReceiver for CorrelationForReceiverUnion {
    fn produce<C: AbstractChannel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        count: usize,
    ) -> Result<Vec<(ReceiverSeed, ReceiverSeed)>> {
        match self {
            CorrelationForReceiverUnion::Ot(p) => p.produce(channel, rng, count),
            CorrelationForReceiverUnion::Dealer(p) => p.produce(channel, rng, count),
        }
    }
}

impl CorrelationForSender for CorrelationForSenderUnion {
    fn consume<C: AbstractChannel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        delta: &Delta,
    ) -> Result<Vec<SenderSeed>> {
        match self {
            CorrelationForSenderUnion::Ot(p) => p.consume(channel, rng, delta),
            CorrelationForSenderUnion::Dealer(p) => p.consume(channel, rng, delta),
        }
    }
}

/// Create correlation providers for the sender and the receiver. Runtime utility.
///
/// The dealer seed is drawn from `rng`.
pub fn create_correlation_sr<RNG: CryptoRng + Rng>(
    correlation: CorrelationType,
    rng: &mut RNG,
) -> (CorrelationForSenderUnion, CorrelationForReceiverUnion) {
    match correlation {
        CorrelationType::Ot => (
            CorrelationForSenderUnion::Ot(OtCorrelationForSender::new()),
            CorrelationForReceiverUnion::Ot(OtCorrelationForReceiver::new()),
        ),
        CorrelationType::Dealer => {
            let dealer = DealerCorrelation::new(rng.gen());
            (
                CorrelationForSenderUnion::Dealer(dealer),
                CorrelationForReceiverUnion::Dealer(dealer),
            )
        }
    }
}
