//! Two-phase "probe, allocate, fetch" buffers.
//!
//! The vendor API reports how many records it has only when called with no
//! buffer, and never populates a buffer it was not given a size for. Every
//! variable-length query therefore goes through [`sized_fetch`], which owns
//! the resulting allocation in a [`SizedBuffer`] released on drop.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use tracing::trace;

use crate::types::CtlResult;

/// Which phase of a sized fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SizedFetchError {
    #[error("probe call failed: {0}")]
    Probe(CtlResult),
    #[error("fill call failed: {0}")]
    Fill(CtlResult),
}

/// Counts buffer allocations and releases.
///
/// One ledger lives in each `ControlLibrary`; every [`SizedBuffer`] created
/// through it registers on allocation and deregisters exactly once on drop.
#[derive(Debug, Default)]
pub struct BufferLedger {
    allocated: AtomicUsize,
    released: AtomicUsize,
}

impl BufferLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total buffers allocated.
    pub fn allocations(&self) -> usize {
        self.allocated.load(Ordering::Acquire)
    }

    /// Total buffers released.
    pub fn releases(&self) -> usize {
        self.released.load(Ordering::Acquire)
    }

    /// Buffers currently alive.
    pub fn live(&self) -> usize {
        self.allocations().saturating_sub(self.releases())
    }

    fn register(&self, len: usize) {
        self.allocated.fetch_add(1, Ordering::AcqRel);
        trace!(len, live = self.live(), "buffer allocated");
    }

    fn release(&self, len: usize) {
        self.released.fetch_add(1, Ordering::AcqRel);
        trace!(len, live = self.live(), "buffer released");
    }
}

/// Zero-initialized buffer tied to a [`BufferLedger`].
#[derive(Debug)]
pub struct SizedBuffer<'a, T> {
    items: Vec<T>,
    ledger: &'a BufferLedger,
}

impl<'a, T: Default + Clone> SizedBuffer<'a, T> {
    /// Allocate `len` default ("zeroed") records.
    pub fn zeroed(len: usize, ledger: &'a BufferLedger) -> Self {
        ledger.register(len);
        Self {
            items: vec![T::default(); len],
            ledger,
        }
    }
}

impl<T> SizedBuffer<'_, T> {
    /// Drop trailing records the fill call did not populate.
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }
}

impl<T> Deref for SizedBuffer<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> DerefMut for SizedBuffer<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.items
    }
}

impl<T> Drop for SizedBuffer<'_, T> {
    fn drop(&mut self) {
        self.ledger.release(self.items.len());
    }
}

/// Run the probe/allocate/fetch sequence against one vendor call.
///
/// `call` receives the in/out record count and either no buffer (probe) or
/// the freshly allocated buffer (fill). A zero count yields an empty buffer
/// without a fill call. If the fill reports fewer records than were
/// allocated, the buffer is truncated to that count.
pub fn sized_fetch<'a, T, F>(
    ledger: &'a BufferLedger,
    mut call: F,
) -> Result<SizedBuffer<'a, T>, SizedFetchError>
where
    T: Default + Clone,
    F: FnMut(&mut u32, Option<&mut [T]>) -> CtlResult,
{
    let mut count = 0u32;
    let status = call(&mut count, None);
    if !status.is_success() {
        return Err(SizedFetchError::Probe(status));
    }

    let mut buffer = SizedBuffer::zeroed(count as usize, ledger);
    if count == 0 {
        return Ok(buffer);
    }

    let mut filled = count;
    let status = call(&mut filled, Some(&mut *buffer));
    if !status.is_success() {
        return Err(SizedFetchError::Fill(status));
    }
    if (filled as usize) < buffer.len() {
        buffer.truncate(filled as usize);
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_then_fill() {
        let ledger = BufferLedger::new();
        let mut calls = Vec::new();
        let buffer = sized_fetch(&ledger, |count: &mut u32, buf: Option<&mut [u32]>| {
            calls.push(buf.as_ref().map(|b| b.len()));
            match buf {
                None => *count = 3,
                Some(buf) => buf.copy_from_slice(&[7, 8, 9]),
            }
            CtlResult::SUCCESS
        })
        .unwrap();

        assert_eq!(&*buffer, &[7, 8, 9]);
        assert_eq!(calls, vec![None, Some(3)]);
        assert_eq!(ledger.live(), 1);
        drop(buffer);
        assert_eq!(ledger.live(), 0);
        assert_eq!(ledger.allocations(), 1);
        assert_eq!(ledger.releases(), 1);
    }

    #[test]
    fn probe_failure_allocates_nothing() {
        let ledger = BufferLedger::new();
        let err = sized_fetch::<u32, _>(&ledger, |_, _| CtlResult::ERROR_DEVICE_LOST).unwrap_err();
        assert_eq!(err, SizedFetchError::Probe(CtlResult::ERROR_DEVICE_LOST));
        assert_eq!(ledger.allocations(), 0);
    }

    #[test]
    fn fill_failure_releases_buffer() {
        let ledger = BufferLedger::new();
        let err = sized_fetch::<u32, _>(&ledger, |count, buf| match buf {
            None => {
                *count = 4;
                CtlResult::SUCCESS
            }
            Some(_) => CtlResult::ERROR_NOT_AVAILABLE,
        })
        .unwrap_err();

        assert_eq!(err, SizedFetchError::Fill(CtlResult::ERROR_NOT_AVAILABLE));
        assert_eq!(ledger.allocations(), 1);
        assert_eq!(ledger.releases(), 1);
    }

    #[test]
    fn zero_count_skips_fill() {
        let ledger = BufferLedger::new();
        let mut fills = 0;
        let buffer = sized_fetch::<u32, _>(&ledger, |count, buf| {
            if buf.is_some() {
                fills += 1;
            }
            *count = 0;
            CtlResult::SUCCESS
        })
        .unwrap();
        assert!(buffer.is_empty());
        assert_eq!(fills, 0);
    }

    #[test]
    fn short_fill_truncates() {
        let ledger = BufferLedger::new();
        let buffer = sized_fetch(&ledger, |count: &mut u32, buf: Option<&mut [u32]>| {
            match buf {
                None => *count = 4,
                Some(buf) => {
                    buf[0] = 1;
                    buf[1] = 2;
                    *count = 2;
                }
            }
            CtlResult::SUCCESS
        })
        .unwrap();
        assert_eq!(&*buffer, &[1, 2]);
    }

    #[test]
    fn zeroed_buffer_starts_default() {
        let ledger = BufferLedger::new();
        let buffer: SizedBuffer<'_, u64> = SizedBuffer::zeroed(5, &ledger);
        assert!(buffer.iter().all(|v| *v == 0));
    }
}
