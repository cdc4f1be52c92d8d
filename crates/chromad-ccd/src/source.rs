use std::time::Duration;

use chromad_foundation::TransportError;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

/// Seam to whatever delivers raw CCD bytes (serial driver, socket, replay file).
///
/// Reads block up to `timeout`; `Ok(0)` means the timeout elapsed with no
/// data, which is not an error. The caller loops and checks its shutdown flag.
pub trait ByteSource: Send {
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, TransportError>;
}

/// Channel-backed byte source.
///
/// Any reader thread can push chunks into the sending side; the pipeline
/// consumes them here. The channel is bounded so a stalled pipeline pushes
/// back on the producer instead of growing without limit.
pub struct ChannelByteSource {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    pos: usize,
}

impl ChannelByteSource {
    /// Create a source together with its sending half.
    pub fn channel(capacity: usize) -> (Sender<Vec<u8>>, Self) {
        let (tx, rx) = bounded(capacity);
        (
            tx,
            Self {
                rx,
                pending: Vec::new(),
                pos: 0,
            },
        )
    }
}

impl ByteSource for ChannelByteSource {
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, TransportError> {
        if self.pos == self.pending.len() {
            match self.rx.recv_timeout(timeout) {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.pos = 0;
                }
                Err(RecvTimeoutError::Timeout) => return Ok(0),
                Err(RecvTimeoutError::Disconnected) => return Err(TransportError::Disconnected),
            }
        }

        let n = buf.len().min(self.pending.len() - self.pos);
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
