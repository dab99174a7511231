//! Curve hand-off from the audio thread.
//!
//! Fixed-length magnitude curves (noise profile, smoothed power, filter bank
//! output, ...) are copied into a lock-free SPSC queue by the real-time side
//! and picked up by a display or analysis thread. The writer never blocks: if
//! the queue has no room for a whole curve the curve is dropped. The reader
//! only cares about the newest complete curve and skips older ones.

use crate::error::{check_len, DspError};
use crate::vx_log;
use ringbuf::{Consumer, Producer, RingBuffer};

/// Real-time side.
pub struct CurveWriter {
    producer: Producer<f32>,
    curve_len: usize,
    dropped: u64,
}

/// Non-real-time side.
pub struct CurveReader {
    consumer: Consumer<f32>,
    curve_len: usize,
}

/// Queue holding up to `depth` curves of `curve_len` values.
pub fn curve_handoff(curve_len: usize, depth: usize) -> Result<(CurveWriter, CurveReader), DspError> {
    if curve_len == 0 || depth == 0 {
        return Err(DspError::InvalidCapacity);
    }
    let (producer, consumer) = RingBuffer::<f32>::new(curve_len * depth).split();
    Ok((
        CurveWriter {
            producer,
            curve_len,
            dropped: 0,
        },
        CurveReader {
            consumer,
            curve_len,
        },
    ))
}

impl CurveWriter {
    /// Queues `curve`. Returns `Ok(false)` when it was dropped for lack of room.
    pub fn push(&mut self, curve: &[f32]) -> Result<bool, DspError> {
        check_len("handoff curve", self.curve_len, curve.len())?;
        if self.producer.remaining() < self.curve_len {
            self.dropped += 1;
            vx_log!("handoff: queue full, {} curves dropped", self.dropped);
            return Ok(false);
        }
        let written = self.producer.push_slice(curve);
        debug_assert_eq!(written, self.curve_len);
        Ok(true)
    }

    pub fn curve_len(&self) -> usize {
        self.curve_len
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl CurveReader {
    /// Copies the newest complete curve into `out`, discarding older ones.
    /// Returns `Ok(false)` if nothing new arrived.
    pub fn read_latest(&mut self, out: &mut [f32]) -> Result<bool, DspError> {
        check_len("handoff output", self.curve_len, out.len())?;
        let ready = self.consumer.len() / self.curve_len;
        if ready == 0 {
            return Ok(false);
        }
        self.consumer.discard((ready - 1) * self.curve_len);
        let read = self.consumer.pop_slice(out);
        debug_assert_eq!(read, self.curve_len);
        Ok(true)
    }

    /// Complete curves waiting.
    pub fn pending(&self) -> usize {
        self.consumer.len() / self.curve_len
    }

    pub fn curve_len(&self) -> usize {
        self.curve_len
    }
}
