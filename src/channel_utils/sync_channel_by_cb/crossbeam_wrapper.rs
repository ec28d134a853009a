//! [Read]/[Write] ends over an unbounded crossbeam channel of byte chunks.

use crossbeam::channel::{unbounded, Receiver, RecvError, SendError, Sender};
use std::io::{Error, ErrorKind, Read, Result, Write};

/// Writing end. Every `write` call becomes one chunk.
pub struct CrossbeamSender(Sender<Vec<u8>>);

/// Reading end. Blocks until the next chunk arrives.
pub struct CrossbeamReceiver {
    inner: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    pos: usize,
}

impl Write for CrossbeamSender {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if let Err(SendError(v)) = self.0.send(buf.to_vec()) {
            return Err(Error::new(ErrorKind::BrokenPipe, SendError(v.len())));
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Read for CrossbeamReceiver {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if self.pos == self.pending.len() {
            self.pending = self
                .inner
                .recv()
                .map_err(|e: RecvError| Error::new(ErrorKind::BrokenPipe, e))?;
            self.pos = 0;
        }

        let n = buf.len().min(self.pending.len() - self.pos);
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;

        Ok(n)
    }
}

/// One direction of an in-process link.
pub fn cbch_pair() -> (CrossbeamSender, CrossbeamReceiver) {
    let (s, r) = unbounded();
    (
        CrossbeamSender(s),
        CrossbeamReceiver {
            inner: r,
            pending: Vec::new(),
            pos: 0,
        },
    )
}
