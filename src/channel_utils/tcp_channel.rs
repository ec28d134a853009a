//! Module about tcp channel. See [TcpStream].
//! This module provides functions to create tcp stream channels on localhost for the receiver and the sender.

use anyhow::{Context, Result};
use scuttlebutt::SyncChannel;
use std::io::{BufReader, BufWriter};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::sleep;
use std::time::Duration;
use tracing::debug;

const TIMEOUT: Duration = Duration::from_secs(10);
const RETRIES: usize = 50;

/// One end of a tcp link.
pub type TcpChannel = SyncChannel<BufReader<TcpStream>, BufWriter<TcpStream>>;

fn wrap(stream: TcpStream) -> Result<TcpChannel> {
    stream
        .set_nodelay(true)
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    let reader = stream
        .try_clone()
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    Ok(SyncChannel::new(
        BufReader::new(reader),
        BufWriter::new(stream),
    ))
}

fn local_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Return the receiver's channel: listens on `port` and accepts one connection.
pub fn create_tcp_channel_for_receiver(port: u16) -> Result<TcpChannel> {
    let addr = local_addr(port);
    let listener =
        TcpListener::bind(addr).with_context(|| format!("addr={} @{}:{}", addr, file!(), line!()))?;

    let (stream, peer) = listener
        .accept()
        .with_context(|| format!("addr={} @{}:{}", addr, file!(), line!()))?;
    debug!(%peer, "receiver accepted connection");

    wrap(stream)
}

/// Return the sender's channel: connects to `port`, retrying while the receiver isn't listening
/// yet.
pub fn create_tcp_channel_for_sender(port: u16) -> Result<TcpChannel> {
    let addr = local_addr(port);

    let mut attempt = 0;
    let stream = loop {
        match TcpStream::connect_timeout(&addr, TIMEOUT) {
            Ok(s) => break s,
            Err(_) if attempt < RETRIES => {
                attempt += 1;
                sleep(Duration::from_millis(100));
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("addr={} @{}:{}", addr, file!(), line!()));
            }
        }
    };

    wrap(stream)
}

/// Create a pair of tcp stream channels on localhost. See [TcpStream].
///
/// Return `(receiver_channel, sender_channel)`.
pub fn create_tcp_channels(port: u16) -> Result<(TcpChannel, TcpChannel)> {
    let receiver_handle = std::thread::spawn(move || create_tcp_channel_for_receiver(port));
    let sender = create_tcp_channel_for_sender(port)?;

    let receiver = match receiver_handle.join() {
        Ok(r) => r?,
        Err(e) => std::panic::resume_unwind(e),
    };

    Ok((receiver, sender))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scuttlebutt::AbstractChannel;

    #[test]
    fn test_2party() {
        let port = 10000;

        let handle = std::thread::spawn(move || {
            let mut channel = create_tcp_channel_for_sender(port).unwrap();

            let m = channel.read_usize().unwrap();
            assert_eq!(m, 1);

            channel.write_usize(0).unwrap();
            channel.flush().unwrap();
        });

        let mut channel = create_tcp_channel_for_receiver(port).unwrap();

        channel.write_usize(1).unwrap();
        channel.flush().unwrap();

        let m = channel.read_usize().unwrap();
        assert_eq!(m, 0);

        handle.join().unwrap();
    }

    #[test]
    fn test_pair() {
        let (mut receiver, mut sender) = create_tcp_channels(10050).unwrap();

        sender.write_usize(42).unwrap();
        sender.flush().unwrap();
        assert_eq!(receiver.read_usize().unwrap(), 42);
    }
}
