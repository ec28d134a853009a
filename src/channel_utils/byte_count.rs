//! Traffic measurement: a [Write] adapter counting the bytes that reach the inner writer.

use anyhow::{Context, Result};
use scuttlebutt::SyncChannel;
use std::io::{BufReader, BufWriter, Write};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared byte counter. Clones observe the same total.
#[derive(Clone, Debug, Default)]
pub struct TrafficBytes(Arc<AtomicUsize>);

impl TrafficBytes {
    /// Counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes counted so far.
    pub fn total_bytes(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn add(&self, n: usize) {
        self.0.fetch_add(n, Ordering::SeqCst);
    }
}

/// Writer wrapper adding every written byte to a [TrafficBytes].
pub struct ByteCountWrite<W: Write> {
    inner: W,
    counter: TrafficBytes,
}

impl<W: Write> ByteCountWrite<W> {
    /// Wraps `inner`, counting into `counter`.
    pub fn new(inner: W, counter: TrafficBytes) -> Self {
        Self { inner, counter }
    }
}

impl<W: Write> Write for ByteCountWrite<W> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.counter.add(n);
        Ok(n)
    }

    #[inline]
    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Unix channel whose outgoing bytes are counted.
pub type WriteCountChannel =
    SyncChannel<BufReader<UnixStream>, ByteCountWrite<BufWriter<UnixStream>>>;

fn wrap(stream: UnixStream, counter: TrafficBytes) -> Result<WriteCountChannel> {
    let reader = stream
        .try_clone()
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    Ok(SyncChannel::new(
        BufReader::new(reader),
        ByteCountWrite::new(BufWriter::new(stream), counter),
    ))
}

/// Create a pair of unix domain socket channels counting what each side writes.
///
/// Return `((receiver_channel, receiver_sent), (sender_channel, sender_sent))`.
#[allow(clippy::type_complexity)]
pub fn create_writecount_channels() -> Result<(
    (WriteCountChannel, TrafficBytes),
    (WriteCountChannel, TrafficBytes),
)> {
    let (r, s) = UnixStream::pair().with_context(|| format!("@{}:{}", file!(), line!()))?;
    let r_count = TrafficBytes::new();
    let s_count = TrafficBytes::new();

    Ok((
        (wrap(r, r_count.clone())?, r_count),
        (wrap(s, s_count.clone())?, s_count),
    ))
}
