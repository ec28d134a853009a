//! Two-party channels for the OPRF roles. See [scuttlebutt::AbstractChannel].
//!
//! Every `create_*` function returns `(receiver_channel, sender_channel)`, two ends of the same
//! duplex link.

pub mod byte_count;
pub mod sync_channel;
pub mod sync_channel_by_cb;
pub mod tcp_channel;
