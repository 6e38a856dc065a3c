//! Thread-local touched-cell buffers for lock-free parallel writes.
//!
//! During the simulate phase each thread records the cells it touched in its
//! own buffer without any synchronization. At finalize, the coordinator
//! collects all buffers and copies only those cells into the snapshot.
//!
//! Uses the `thread_local` crate for automatic per-thread storage with
//! iteration support.

use rgb_spatial::CellIndex;

/// Thread-local lists of touched cells.
///
/// Each thread automatically gets its own `Vec<CellIndex>` when it first
/// pushes. The store deduplicates with a per-cell dirty bit before pushing, so
/// an index appears at most once per tick across all buffers.
pub struct TouchedBuffers {
    inner: thread_local::ThreadLocal<core::cell::RefCell<Vec<CellIndex>>>,
}

impl TouchedBuffers {
    /// Create a new empty buffer collection.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: thread_local::ThreadLocal::new(),
        }
    }

    /// Record a touched cell in the current thread's buffer.
    #[inline]
    pub fn push(&self, index: CellIndex) {
        self.inner.get_or_default().borrow_mut().push(index);
    }

    /// Collect the touched cells from all threads, clearing the buffers.
    ///
    /// This requires `&mut self` which guarantees no other threads are
    /// currently pushing.
    pub fn collect_all(&mut self) -> Vec<CellIndex> {
        self.inner
            .iter_mut()
            .flat_map(|cell| cell.get_mut().drain(..))
            .collect()
    }

    /// Total touched count across all threads.
    pub fn total_pending(&mut self) -> usize {
        self.inner.iter_mut().map(|cell| cell.get_mut().len()).sum()
    }
}

impl Default for TouchedBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for TouchedBuffers {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TouchedBuffers").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_thread() {
        let mut buffers = TouchedBuffers::new();

        buffers.push(CellIndex(3));
        buffers.push(CellIndex(9));
        assert_eq!(buffers.total_pending(), 2);

        let touched = buffers.collect_all();
        assert_eq!(touched, vec![CellIndex(3), CellIndex(9)]);
        assert_eq!(buffers.total_pending(), 0);
    }

    #[test]
    fn test_multi_thread() {
        let mut buffers = TouchedBuffers::new();

        std::thread::scope(|s| {
            for i in 0..4 {
                let buffers = &buffers;
                s.spawn(move || {
                    buffers.push(CellIndex(i));
                    buffers.push(CellIndex(i + 100));
                });
            }
        });

        let mut touched = buffers.collect_all();
        touched.sort();
        assert_eq!(touched.len(), 8);
        assert_eq!(touched[0], CellIndex(0));
        assert_eq!(touched[7], CellIndex(103));
    }
}
