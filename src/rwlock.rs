// Modified from https://github.com/rust-lang/rust/blob/master/library/std/src/sys/sync/rwlock/futex.rs
use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{
    AtomicU32,
    Ordering::{Acquire, Relaxed, Release},
};

// Bits 0..30:
//   0: unlocked
//   1..=0x3FFF_FFFE: locked by N readers
//   0x3FFF_FFFF: write locked
// Bit 30: readers are waiting on `state`.
// Bit 31: writers are waiting on `writer_notify`.
const READ_LOCKED: u32 = 1;
const MASK: u32 = (1 << 30) - 1;
const WRITE_LOCKED: u32 = MASK;
const MAX_READERS: u32 = MASK - 1;
const READERS_WAITING: u32 = 1 << 30;
const WRITERS_WAITING: u32 = 1 << 31;

#[inline]
fn is_unlocked(state: u32) -> bool {
    state & MASK == 0
}

#[inline]
fn is_write_locked(state: u32) -> bool {
    state & MASK == WRITE_LOCKED
}

#[inline]
fn has_readers_waiting(state: u32) -> bool {
    state & READERS_WAITING != 0
}

#[inline]
fn has_writers_waiting(state: u32) -> bool {
    state & WRITERS_WAITING != 0
}

#[inline]
fn is_read_lockable(state: u32) -> bool {
    // Readers never overtake a waiting writer. A set readers-waiting bit on an
    // unlocked state means an unlocking thread is busy waking writers first.
    state & MASK < MAX_READERS && !has_readers_waiting(state) && !has_writers_waiting(state)
}

#[inline]
fn has_reached_max_readers(state: u32) -> bool {
    state & MASK == MAX_READERS
}

/// The raw lock word pair behind [`RwLock`].
struct RawRwLock {
    state: AtomicU32,
    /// Bumped on every writer notification.
    writer_notify: AtomicU32,
}

impl RawRwLock {
    const fn new() -> Self {
        Self {
            state: AtomicU32::new(0),
            writer_notify: AtomicU32::new(0),
        }
    }

    #[inline]
    fn read(&self) {
        let state = self.state.load(Relaxed);
        if !is_read_lockable(state)
            || self
                .state
                .compare_exchange_weak(state, state + READ_LOCKED, Acquire, Relaxed)
                .is_err()
        {
            self.read_contended();
        }
    }

    #[inline]
    fn read_unlock(&self) {
        let state = self.state.fetch_sub(READ_LOCKED, Release) - READ_LOCKED;

        // A reader only waits on a read-locked lock when a writer waits too.
        debug_assert!(!has_readers_waiting(state) || has_writers_waiting(state));

        // The last reader out hands the lock to a waiting writer.
        if is_unlocked(state) && has_writers_waiting(state) {
            self.wake_writer_or_readers(state);
        }
    }

    #[cold]
    fn read_contended(&self) {
        let mut state = self.spin_read();

        loop {
            if is_read_lockable(state) {
                match self
                    .state
                    .compare_exchange_weak(state, state + READ_LOCKED, Acquire, Relaxed)
                {
                    Ok(_) => return, // Locked!
                    Err(s) => {
                        state = s;
                        continue;
                    }
                }
            }

            assert!(
                !has_reached_max_readers(state),
                "too many active read locks on RwLock"
            );

            // Make sure the readers waiting bit is set before we go to sleep.
            if !has_readers_waiting(state) {
                if let Err(s) =
                    self.state
                        .compare_exchange(state, state | READERS_WAITING, Relaxed, Relaxed)
                {
                    state = s;
                    continue;
                }
            }

            atomic_wait::wait(&self.state, state | READERS_WAITING);

            // Spin again after waking up.
            state = self.spin_read();
        }
    }

    #[inline]
    fn write(&self) {
        if self
            .state
            .compare_exchange_weak(0, WRITE_LOCKED, Acquire, Relaxed)
            .is_err()
        {
            self.write_contended();
        }
    }

    #[inline]
    fn write_unlock(&self) {
        let state = self.state.fetch_sub(WRITE_LOCKED, Release) - WRITE_LOCKED;

        debug_assert!(is_unlocked(state));

        if has_writers_waiting(state) || has_readers_waiting(state) {
            self.wake_writer_or_readers(state);
        }
    }

    #[cold]
    fn write_contended(&self) {
        let mut state = self.spin_write();
        let mut other_writers_waiting = 0;

        loop {
            if is_unlocked(state) {
                match self.state.compare_exchange_weak(
                    state,
                    state | WRITE_LOCKED | other_writers_waiting,
                    Acquire,
                    Relaxed,
                ) {
                    Ok(_) => return, // Locked!
                    Err(s) => {
                        state = s;
                        continue;
                    }
                }
            }

            if !has_writers_waiting(state) {
                if let Err(s) =
                    self.state
                        .compare_exchange(state, state | WRITERS_WAITING, Relaxed, Relaxed)
                {
                    state = s;
                    continue;
                }
            }

            // Other writers may be parked as well, so keep the bit once we own the lock.
            other_writers_waiting = WRITERS_WAITING;

            // Read the notification counter before re-checking `state`,
            // so a wake-up between the two is not lost.
            let seq = self.writer_notify.load(Acquire);

            state = self.state.load(Relaxed);
            if is_unlocked(state) || !has_writers_waiting(state) {
                continue;
            }

            atomic_wait::wait(&self.writer_notify, seq);

            // Spin again after waking up.
            state = self.spin_write();
        }
    }

    /// Wakes waiting threads after the lock became unlocked.
    ///
    /// One writer is preferred over readers. `atomic_wait::wake_one` does not
    /// report whether anybody was actually parked, so when both kinds are
    /// waiting the readers are released too and race the writer for the lock.
    #[cold]
    fn wake_writer_or_readers(&self, mut state: u32) {
        assert!(is_unlocked(state));

        // If the lock gets locked in the meantime, the new owner takes care of
        // waking waiters when it unlocks.
        if state == WRITERS_WAITING {
            match self.state.compare_exchange(state, 0, Relaxed, Relaxed) {
                Ok(_) => {
                    self.wake_writer();
                    return;
                }
                Err(s) => state = s,
            }
        }

        if state == READERS_WAITING + WRITERS_WAITING {
            if self
                .state
                .compare_exchange(state, READERS_WAITING, Relaxed, Relaxed)
                .is_err()
            {
                return;
            }
            self.wake_writer();
            state = READERS_WAITING;
        }

        if state == READERS_WAITING
            && self
                .state
                .compare_exchange(state, 0, Relaxed, Relaxed)
                .is_ok()
        {
            atomic_wait::wake_all(&self.state);
        }
    }

    fn wake_writer(&self) {
        self.writer_notify.fetch_add(1, Release);
        atomic_wait::wake_one(&self.writer_notify);
    }

    #[inline]
    fn spin_until(&self, f: impl Fn(u32) -> bool) -> u32 {
        let mut spin = 100;
        loop {
            // Only `load` while spinning, to be easier on the caches.
            let state = self.state.load(Relaxed);
            if f(state) || spin == 0 {
                return state;
            }
            std::hint::spin_loop();
            spin -= 1;
        }
    }

    #[inline]
    fn spin_write(&self) -> u32 {
        // Stop when unlocked, or when other writers are already queued.
        self.spin_until(|state| is_unlocked(state) || has_writers_waiting(state))
    }

    #[inline]
    fn spin_read(&self) -> u32 {
        // Stop when not write locked, or when anybody is already queued.
        self.spin_until(|state| {
            !is_write_locked(state) || has_readers_waiting(state) || has_writers_waiting(state)
        })
    }
}

/// A writer-preferring reader/writer lock built on futexes.
///
/// Any number of readers may hold the lock at once; a writer holds it alone.
/// Once a writer is waiting, new readers queue behind it. The lock does not
/// poison: a guard dropped during a panic releases the lock normally.
pub struct RwLock<T: ?Sized> {
    raw: RawRwLock,
    data: UnsafeCell<T>,
}

// Safety: access to `data` is serialized by `raw`, exactly like `std::sync::RwLock`.
unsafe impl<T: ?Sized + Send> Send for RwLock<T> {}
unsafe impl<T: ?Sized + Send + Sync> Sync for RwLock<T> {}

impl<T> RwLock<T> {
    /// Creates a new unlocked `RwLock` holding `value`.
    pub const fn new(value: T) -> Self {
        Self {
            raw: RawRwLock::new(),
            data: UnsafeCell::new(value),
        }
    }
}

impl<T: Default> Default for RwLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ?Sized> RwLock<T> {
    /// Acquires shared access, blocking while a writer holds or waits for the lock.
    pub fn read(&self) -> ReadGuard<'_, T> {
        self.raw.read();
        ReadGuard { lock: self }
    }

    /// Acquires exclusive access, blocking until all readers and writers are gone.
    pub fn write(&self) -> WriteGuard<'_, T> {
        self.raw.write();
        WriteGuard { lock: self }
    }
}

/// Shared access to the value behind a [`RwLock`], released on drop.
pub struct ReadGuard<'a, T: ?Sized> {
    lock: &'a RwLock<T>,
}

impl<T: ?Sized> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safety: the read lock is held for the lifetime of the guard.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.raw.read_unlock();
    }
}

/// Exclusive access to the value behind a [`RwLock`], released on drop.
pub struct WriteGuard<'a, T: ?Sized> {
    lock: &'a RwLock<T>,
}

impl<T: ?Sized> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safety: the write lock is held for the lifetime of the guard.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // Safety: the write lock is held exclusively for the lifetime of the guard.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.raw.write_unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, AtomicUsize};
    use std::sync::Arc;

    #[test]
    fn test_rwlock_write_exclusive() {
        let lock = Arc::new(RwLock::new(0usize));
        let current = Arc::new(AtomicU32::new(0));
        const N: usize = 8;
        const M: usize = 1 << 16;

        let mut tasks = vec![];
        for _ in 0..N {
            let lock = lock.clone();
            let current = current.clone();
            tasks.push(std::thread::spawn(move || {
                for _ in 0..M {
                    let mut guard = lock.write();
                    assert_eq!(current.fetch_add(1, Acquire), 0);
                    *guard += 1;
                    current.fetch_sub(1, Acquire);
                }
            }));
        }
        for task in tasks {
            task.join().unwrap();
        }

        assert_eq!(*lock.read(), N * M);
    }

    #[test]
    fn test_rwlock_readers_share() {
        let lock = Arc::new(RwLock::new(7u32));
        let first = lock.read();
        // A second reader on another thread must not block behind the first.
        let other = {
            let lock = lock.clone();
            std::thread::spawn(move || *lock.read())
        };
        assert_eq!(other.join().unwrap(), 7);
        assert_eq!(*first, 7);
        drop(first);

        *lock.write() = 8;
        assert_eq!(*lock.read(), 8);
    }

    #[test]
    fn test_rwlock_readers_never_see_writer() {
        let lock = Arc::new(RwLock::new((0u64, 0u64)));
        let reads = Arc::new(AtomicUsize::new(0));
        const READERS: usize = 6;
        const WRITERS: usize = 2;
        const ITERATIONS: usize = 10000;

        let mut handles = vec![];
        for _ in 0..WRITERS {
            let lock = lock.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..ITERATIONS {
                    let mut guard = lock.write();
                    guard.0 += 1;
                    std::thread::yield_now(); // Widen the window between the two halves.
                    guard.1 += 1;
                }
            }));
        }
        for _ in 0..READERS {
            let lock = lock.clone();
            let reads = reads.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..ITERATIONS {
                    let guard = lock.read();
                    assert_eq!(guard.0, guard.1);
                    reads.fetch_add(1, Relaxed);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let expected = (WRITERS * ITERATIONS) as u64;
        assert_eq!(*lock.read(), (expected, expected));
        assert_eq!(reads.load(Relaxed), READERS * ITERATIONS);
    }

    #[test]
    fn test_rwlock_released_on_panic() {
        let lock = Arc::new(RwLock::new(1u32));
        let res = {
            let lock = lock.clone();
            std::thread::spawn(move || {
                let _guard = lock.write();
                panic!("boom");
            })
            .join()
        };
        assert!(res.is_err());
        assert_eq!(*lock.read(), 1);
        *lock.write() = 2;
        assert_eq!(*lock.read(), 2);
    }
}
