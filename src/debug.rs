//! Real-time safe diagnostics.
//!
//! `vx_log!` formats into a fixed-size slot of a preallocated ring, so it can be
//! called from the audio thread without allocating or locking. A non-real-time
//! thread drains the ring with [`logger::drain_to_file`] or [`logger::drain_with`].
//! Without the `debug` feature the macro compiles to nothing.

use std::fmt;

#[cfg(feature = "debug")]
pub mod logger {
    use std::cell::UnsafeCell;
    use std::fmt;
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::OnceLock;

    pub const DEFAULT_LOG_PATH: &str = "/tmp/vxspectral.log";

    const SLOTS: usize = 128;
    const MSG_MAX: usize = 256;

    #[derive(Copy, Clone)]
    struct Slot {
        seq: u64,
        len: usize,
        bytes: [u8; MSG_MAX],
    }

    impl Slot {
        const EMPTY: Slot = Slot {
            seq: 0,
            len: 0,
            bytes: [0; MSG_MAX],
        };

        fn text(&self) -> &str {
            // Truncation may split a code point; keep the valid prefix.
            match std::str::from_utf8(&self.bytes[..self.len]) {
                Ok(s) => s,
                Err(e) => std::str::from_utf8(&self.bytes[..e.valid_up_to()]).unwrap_or(""),
            }
        }
    }

    impl fmt::Write for Slot {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            let n = s.len().min(MSG_MAX - self.len);
            self.bytes[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
            self.len += n;
            Ok(())
        }
    }

    /// Single-producer/single-consumer ring; one slot stays free.
    struct SlotRing {
        write: AtomicUsize,
        read: AtomicUsize,
        dropped: AtomicU64,
        slots: Box<[UnsafeCell<Slot>]>,
    }

    // Only the audio thread writes and only the drain thread reads.
    unsafe impl Sync for SlotRing {}

    impl SlotRing {
        fn new() -> Self {
            Self {
                write: AtomicUsize::new(0),
                read: AtomicUsize::new(0),
                dropped: AtomicU64::new(0),
                slots: (0..SLOTS).map(|_| UnsafeCell::new(Slot::EMPTY)).collect(),
            }
        }

        fn push(&self, slot: &Slot) {
            let w = self.write.load(Ordering::Relaxed);
            let next = (w + 1) % SLOTS;
            if next == self.read.load(Ordering::Acquire) {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return;
            }
            unsafe {
                *self.slots[w].get() = *slot;
            }
            self.write.store(next, Ordering::Release);
        }

        fn pop(&self) -> Option<Slot> {
            let r = self.read.load(Ordering::Relaxed);
            if r == self.write.load(Ordering::Acquire) {
                return None;
            }
            let slot = unsafe { *self.slots[r].get() };
            self.read.store((r + 1) % SLOTS, Ordering::Release);
            Some(slot)
        }
    }

    static RING: OnceLock<SlotRing> = OnceLock::new();
    static ENABLED: AtomicBool = AtomicBool::new(false);
    static SEQ: AtomicU64 = AtomicU64::new(0);

    /// Allocates the ring. Call once before processing starts.
    pub fn init_logger() {
        let _ = RING.get_or_init(SlotRing::new);
        ENABLED.store(true, Ordering::Relaxed);
    }

    pub fn log_args(args: fmt::Arguments) {
        if !ENABLED.load(Ordering::Relaxed) {
            return;
        }
        let Some(ring) = RING.get() else {
            return;
        };
        let mut slot = Slot::EMPTY;
        slot.seq = SEQ.fetch_add(1, Ordering::Relaxed);
        let _ = fmt::write(&mut slot, args);
        ring.push(&slot);
    }

    /// Number of messages lost because the ring was full.
    pub fn dropped() -> u64 {
        RING.get()
            .map(|r| r.dropped.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Hands every pending message to `f`, oldest first. Returns the count.
    pub fn drain_with<F: FnMut(u64, &str)>(mut f: F) -> usize {
        let Some(ring) = RING.get() else {
            return 0;
        };
        let mut n = 0;
        while let Some(slot) = ring.pop() {
            f(slot.seq, slot.text());
            n += 1;
        }
        n
    }

    pub fn drain_to_file() -> std::io::Result<usize> {
        drain_to_path(DEFAULT_LOG_PATH)
    }

    pub fn drain_to_path<P: AsRef<Path>>(path: P) -> std::io::Result<usize> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut result = Ok(());
        let n = drain_with(|seq, msg| {
            if result.is_ok() {
                result = writeln!(file, "[{seq}] {msg}");
            }
        });
        result.map(|_| n)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn slot(msg: &str) -> Slot {
            let mut slot = Slot::EMPTY;
            let _ = fmt::write(&mut slot, format_args!("{msg}"));
            slot
        }

        #[test]
        fn test_ring_is_fifo_and_drops_when_full() {
            let ring = SlotRing::new();
            ring.push(&slot("first"));
            ring.push(&slot("second"));
            assert_eq!(ring.pop().map(|s| s.text().to_string()), Some("first".into()));
            assert_eq!(ring.pop().map(|s| s.text().to_string()), Some("second".into()));
            assert!(ring.pop().is_none());

            for _ in 0..SLOTS + 10 {
                ring.push(&slot("x"));
            }
            assert_eq!(ring.dropped.load(Ordering::Relaxed), 11);
        }

        #[test]
        fn test_long_messages_are_truncated() {
            let mut slot = Slot::EMPTY;
            let long = "x".repeat(MSG_MAX * 2);
            let _ = fmt::write(&mut slot, format_args!("{long}"));
            assert_eq!(slot.len, MSG_MAX);
            assert_eq!(slot.text().len(), MSG_MAX);
        }
    }
}

#[cfg(feature = "debug")]
#[doc(hidden)]
pub fn vx_log_inner(args: fmt::Arguments) {
    logger::log_args(args);
}

#[cfg(not(feature = "debug"))]
#[doc(hidden)]
#[inline(always)]
pub fn vx_log_inner(_args: fmt::Arguments) {}

#[macro_export]
macro_rules! vx_log {
    ($($arg:tt)*) => {
        $crate::debug::vx_log_inner(format_args!($($arg)*))
    };
}
