//! Decoding of spike events streamed back from the board

use crate::{Event, EVENT_SIZE};

/// Events decoded from one read, plus the number of trailing bytes that did
/// not make up a complete record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Decoded {
    pub events: Vec<Event>,
    pub dropped: usize,
}

/// Decode a raw buffer into events, one per complete 3-byte record.
///
/// Each record is a big-endian `u16` timestamp followed by the address byte.
/// The stream has no framing, so any trailing partial record is discarded:
/// `len % 3` bytes are lost, and a record split across two reads never
/// arrives. See [`Reassembler`] for the variant that carries them over.
pub fn events(bytes: &[u8]) -> Decoded {
    let records = bytes.chunks_exact(EVENT_SIZE);
    let dropped = records.remainder().len();
    let events = records
        .map(|r| Event {
            time: u16::from_be_bytes([r[0], r[1]]),
            address: r[2],
        })
        .collect();
    Decoded { events, dropped }
}

/// Decode into two parallel sequences `(times, addresses)` in record order.
pub fn split(bytes: &[u8]) -> (Vec<u16>, Vec<u8>) {
    events(bytes)
        .events
        .iter()
        .map(|e| (e.time, e.address))
        .unzip()
}

/// Decoder that keeps a trailing partial record and prepends it to the next
/// read, so records straddling two reads are recovered.
///
/// This changes what is shown compared to [`events`] whenever the device
/// output does not line up with read boundaries, so it is opt-in.
#[derive(Clone, Debug, Default)]
pub struct Reassembler {
    pending: Vec<u8>,
}

impl Reassembler {
    pub fn new() -> Self {
        Reassembler { pending: Vec::with_capacity(EVENT_SIZE) }
    }

    /// Decode `bytes` after any bytes held over from the previous call.
    /// `dropped` in the result is always zero; held bytes are in [`Self::pending`].
    pub fn feed(&mut self, bytes: &[u8]) -> Decoded {
        let mut buf = std::mem::take(&mut self.pending);
        buf.extend_from_slice(bytes);
        let mut decoded = events(&buf);
        let tail = buf.len() - decoded.dropped;
        self.pending.extend_from_slice(&buf[tail..]);
        decoded.dropped = 0;
        decoded
    }

    /// Bytes waiting for the rest of their record
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn reset(&mut self) {
        self.pending.clear();
    }
}
