//! Consumer Gateway: the blocking dequeue and the synchronous inference
//! read path, both implemented as methods on `SessionHandle`.

use std::sync::atomic::Ordering;

use crate::error::ChipError;
use crate::session::SessionHandle;
use crate::types::Mode;

impl SessionHandle {
    fn imagery_len(&self) -> usize {
        self.shared.imagery_dt.word_size()
            * self.shared.band_count as usize
            * (self.shared.window_size as usize).pow(2)
    }

    fn label_len(&self) -> Option<usize> {
        self.has_label()
            .then(|| self.shared.label_dt.word_size() * (self.shared.window_size as usize).pow(2))
    }

    /// Blocks until a full chip is available and copies it into the
    /// caller-supplied buffers.
    ///
    /// Scans slots starting at `current mod M`, advancing on every miss,
    /// until a trylock succeeds on a `ready = Full` slot. Returns
    /// `Err(ChipError::SessionStopped)` instead of spinning forever if the
    /// session's mode is observed as `Stopped` mid-scan.
    pub fn get_next(
        &self,
        imagery_out: &mut [u8],
        mut label_out: Option<&mut [u8]>,
    ) -> Result<(), ChipError> {
        let expected_imagery = self.imagery_len();
        if imagery_out.len() != expected_imagery {
            return Err(ChipError::BufferSize {
                expected: expected_imagery,
                got: imagery_out.len(),
            });
        }
        if let (Some(expected_label), Some(buf)) = (self.label_len(), label_out.as_deref()) {
            if buf.len() != expected_label {
                return Err(ChipError::BufferSize {
                    expected: expected_label,
                    got: buf.len(),
                });
            }
        }

        let m = self.shared.ring.len();
        loop {
            let idx = (self.current.get() % m as u64) as usize;

            if let Some(mut guard) = self.shared.ring.try_lock(idx) {
                if guard.ready {
                    imagery_out.copy_from_slice(&guard.imagery);
                    if let Some(out) = label_out.as_deref_mut() {
                        if let Some(label) = guard.label.as_ref() {
                            out.copy_from_slice(label);
                        }
                    }
                    guard.ready = false;
                    return Ok(());
                }
            }

            self.current.set(self.current.get().wrapping_add(1));

            if Mode::from_u8(self.shared.mode.load(Ordering::Acquire)) == Mode::Stopped {
                return Err(ChipError::SessionStopped);
            }
        }
    }

    /// Synchronous read of one chip at pixel `(x, y)`. Valid only in
    /// `Inference` mode; uses worker 0's imagery handle, safe because no
    /// worker thread runs its read loop in that mode.
    ///
    /// Returns `false` and zero-fills `imagery_out` if the mode check fails,
    /// the target chip-grid cell is entirely empty, or all `attempts` reads
    /// fail.
    pub fn get_inference_chip(&self, imagery_out: &mut [u8], x: i32, y: i32, attempts: u32) -> bool {
        let expected = self.imagery_len();
        assert_eq!(
            imagery_out.len(),
            expected,
            "get_inference_chip buffer must be exactly {expected} bytes"
        );

        let bad = |buf: &mut [u8]| {
            buf.fill(0);
            false
        };

        if Mode::from_u8(self.shared.mode.load(Ordering::Acquire)) != Mode::Inference {
            return bad(imagery_out);
        }

        // Coverage is checked against the chip-grid-aligned window containing
        // (x, y), not the raw pixel offset.
        let window_size = self.shared.window_size;
        let aligned_x = (x / window_size) * window_size;
        let aligned_y = (y / window_size) * window_size;

        let worker0 = self.worker_zero();
        if worker0
            .imagery_first_band
            .window_is_empty(aligned_x, aligned_y, window_size)
        {
            return bad(imagery_out);
        }

        let mut bands = self.shared.bands.clone();
        for _ in 0..attempts {
            if worker0
                .imagery_dataset
                .read_window(self.shared.imagery_dt, &mut bands, x, y, window_size, imagery_out)
                .is_ok()
            {
                return true;
            }
        }

        bad(imagery_out)
    }
}
