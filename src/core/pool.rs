//! Typed free-list pools for scratch memory reused across pipeline invocations.
//!
//! A [`Pool<T>`] hands out [`Pooled`] guards that dereference to `T` and put the value
//! back when dropped, so a stage that bails out early with `?` still returns its
//! buffers. The free list is internally synchronized; callers share a pool by `&`.
use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

use ndarray::Array4;

pub struct Pool<T> {
    free: Mutex<Vec<T>>,
}

impl<T: Default> Pool<T> {
    pub fn new() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
        }
    }

    /// Borrow a value, creating a fresh one when the free list is empty.
    pub fn take(&self) -> Pooled<'_, T> {
        let value = self.lock().pop().unwrap_or_default();
        Pooled { pool: self, value }
    }

    /// Number of idle values waiting for reuse.
    pub fn available(&self) -> usize {
        self.lock().len()
    }

    fn put(&self, value: T) {
        self.lock().push(value);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<T>> {
        // A panic while holding the lock cannot leave a Vec half-pushed.
        self.free.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Default> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive borrow of a pooled value.
pub struct Pooled<'a, T: Default> {
    pool: &'a Pool<T>,
    value: T,
}

impl<T: Default> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Default> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Default> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        // Leaves an empty default behind; the guard is gone after this.
        self.pool.put(std::mem::take(&mut self.value));
    }
}

/// Intermediate planes of the resize + blur refinement.
#[derive(Debug, Default)]
pub struct BlurBuffers {
    /// Bilinear resize output
    pub tmp: Vec<u8>,
    /// Horizontal blur pass output
    pub h_pass: Vec<u8>,
}

impl BlurBuffers {
    /// Set both planes to `size` bytes. Capacity never shrinks.
    pub fn prepare(&mut self, size: usize) {
        self.tmp.resize(size, 0);
        self.h_pass.resize(size, 0);
    }
}

/// Model input (1×3×S×S) and output (S×S) storage.
#[derive(Debug)]
pub struct TensorBuffers {
    pub input: Array4<f32>,
    pub output: Vec<f32>,
}

impl Default for TensorBuffers {
    fn default() -> Self {
        Self {
            input: Array4::zeros((1, 3, 0, 0)),
            output: Vec::new(),
        }
    }
}

impl TensorBuffers {
    /// Reallocate the input tensor only when the side length changes.
    pub fn prepare(&mut self, side: usize) {
        if self.input.dim() != (1, 3, side, side) {
            self.input = Array4::zeros((1, 3, side, side));
        }
        self.output.clear();
        self.output.reserve(side * side);
    }
}

pub type BlurBufferPool = Pool<BlurBuffers>;
pub type TensorPool = Pool<TensorBuffers>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_and_return() {
        let pool = BlurBufferPool::new();
        {
            let mut buf = pool.take();
            buf.prepare(1024);
            assert_eq!(buf.tmp.len(), 1024);
            assert_eq!(buf.h_pass.len(), 1024);
            assert_eq!(pool.available(), 0);
        }
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn capacity_keeps_high_water_mark() {
        let pool = BlurBufferPool::new();

        let mut buf = pool.take();
        buf.prepare(100);
        let cap_small = buf.tmp.capacity();
        drop(buf);

        let mut buf = pool.take();
        buf.prepare(200);
        assert_eq!(buf.tmp.len(), 200);
        assert!(buf.tmp.capacity() >= 200);
        assert!(buf.tmp.capacity() >= cap_small);
        drop(buf);

        let mut buf = pool.take();
        buf.prepare(50);
        assert_eq!(buf.tmp.len(), 50);
        assert_eq!(buf.h_pass.len(), 50);
        assert!(buf.tmp.capacity() >= 200);
        assert!(buf.h_pass.capacity() >= 200);
    }

    #[test]
    fn returned_on_early_exit() {
        fn failing_stage(pool: &BlurBufferPool) -> Result<(), &'static str> {
            let mut buf = pool.take();
            buf.prepare(16);
            let stage: Result<(), &'static str> = Err("stage failed");
            stage?;
            Ok(())
        }

        let pool = BlurBufferPool::new();
        assert!(failing_stage(&pool).is_err());
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn concurrent_borrowers_get_distinct_buffers() {
        let pool = BlurBufferPool::new();
        std::thread::scope(|s| {
            for i in 0..8 {
                let pool = &pool;
                s.spawn(move || {
                    let mut buf = pool.take();
                    buf.prepare(64 + i);
                    buf.tmp.fill(i as u8);
                    assert!(buf.tmp.iter().all(|&v| v == i as u8));
                });
            }
        });
        assert!(pool.available() >= 1 && pool.available() <= 8);
    }

    #[test]
    fn tensor_buffers_reuse_input_allocation() {
        let pool = TensorPool::new();
        {
            let mut t = pool.take();
            t.prepare(8);
            t.input[[0, 2, 7, 7]] = 1.5;
        }
        let mut t = pool.take();
        t.prepare(8);
        assert_eq!(t.input.dim(), (1, 3, 8, 8));
        assert_eq!(t.input[[0, 2, 7, 7]], 1.5);
        assert!(t.output.is_empty());
        assert!(t.output.capacity() >= 64);
    }
}
