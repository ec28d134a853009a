//! Module about unix domain socket channel. See [UnixStream].
//! This module provides a function to create a pair of unix domain socket channels for the receiver and the sender.

use anyhow::{Context, Result};
use scuttlebutt::SyncChannel;
use std::{
    io::{BufReader, BufWriter},
    os::unix::net::UnixStream,
};

/// One end of a unix domain socket link.
pub type UnixChannel = SyncChannel<BufReader<UnixStream>, BufWriter<UnixStream>>;

fn wrap(stream: UnixStream) -> Result<UnixChannel> {
    let reader = stream
        .try_clone()
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    Ok(SyncChannel::new(
        BufReader::new(reader),
        BufWriter::new(stream),
    ))
}

/// Create a pair of unix domain socket channels. See [UnixStream].
///
/// Return `(receiver_channel, sender_channel)`.
pub fn create_unix_channels() -> Result<(UnixChannel, UnixChannel)> {
    let (r, s) = UnixStream::pair().with_context(|| format!("@{}:{}", file!(), line!()))?;

    Ok((wrap(r)?, wrap(s)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scuttlebutt::{AbstractChannel, Block};

    #[test]
    fn test_unix_pair() {
        let (mut receiver, mut sender) = create_unix_channels().unwrap();

        let handle = std::thread::spawn(move || {
            let b = sender.read_block().unwrap();
            sender.write_block(&b).unwrap();
            sender.flush().unwrap();
        });

        receiver.write_block(&Block::from(7u128)).unwrap();
        receiver.flush().unwrap();
        assert_eq!(receiver.read_block().unwrap(), Block::from(7u128));

        handle.join().unwrap();
    }
}
