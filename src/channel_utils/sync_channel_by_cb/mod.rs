//! Module about native channel of Rust. See [crossbeam].
//! This module provides a function to create a pair of in-process crossbeam channels for the receiver and the sender.

use scuttlebutt::SyncChannel;
pub mod crossbeam_wrapper;
use crossbeam_wrapper::cbch_pair;
pub use crossbeam_wrapper::{CrossbeamReceiver, CrossbeamSender};

/// One end of an in-process link.
pub type CrossbeamChannel = SyncChannel<CrossbeamReceiver, CrossbeamSender>;

/// Create a pair of crossbeam channels.
///
/// Return `(receiver_channel, sender_channel)`.
pub fn create_crossbeam_channels() -> (CrossbeamChannel, CrossbeamChannel) {
    let (sr, rl) = cbch_pair();
    let (sl, rr) = cbch_pair();
    let left = SyncChannel::new(rl, sl);
    let right = SyncChannel::new(rr, sr);

    (left, right)
}
