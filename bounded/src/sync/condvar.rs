use std::{cell::UnsafeCell, mem::MaybeUninit};

use libc::{
    pthread_cond_broadcast, pthread_cond_destroy, pthread_cond_init, pthread_cond_signal,
    pthread_cond_t, pthread_cond_wait, pthread_condattr_destroy, pthread_condattr_init,
};

use crate::{CheckOk, Error};

use super::MutexGuard;

/// Process-private pthread condition variable.
///
/// A `Condvar` must only ever be waited on together with one [`super::Mutex`].
#[derive(Debug)]
pub struct Condvar {
    inner: Box<UnsafeCell<MaybeUninit<pthread_cond_t>>>,
}

impl Condvar {
    pub fn new() -> Result<Self, Error> {
        let inner = Box::new(UnsafeCell::new(MaybeUninit::uninit()));
        let mut attr = MaybeUninit::uninit();
        unsafe {
            pthread_condattr_init(attr.as_mut_ptr()).r("condattr_init")?;
            let init = pthread_cond_init((*inner.get()).as_mut_ptr(), attr.as_ptr());
            pthread_condattr_destroy(attr.as_mut_ptr());
            init.r("cond_init")?;
        }

        Ok(Self { inner })
    }

    /// Wakes at least one waiter, if any.
    pub fn signal(&self) {
        unsafe {
            if pthread_cond_signal(self.raw()) != 0 {
                panic!("failed to signal condvar");
            }
        }
    }

    pub fn broadcast(&self) {
        unsafe {
            if pthread_cond_broadcast(self.raw()) != 0 {
                panic!("failed to broadcast condvar");
            }
        }
    }

    /// Releases the guard's lock until woken, then re-acquires it.
    ///
    /// The wake-up may be spurious, callers must re-check their predicate.
    pub fn wait<'m, T>(&self, guard: MutexGuard<'m, T>) -> MutexGuard<'m, T> {
        unsafe {
            let res = pthread_cond_wait(self.raw(), guard.raw_lock());
            if res != 0 {
                panic!("failed to wait on condvar: code {res}");
            }
        }
        guard
    }

    /// Blocks for as long as `condition` holds on the guarded data.
    pub fn wait_while<'m, T>(
        &self,
        mut guard: MutexGuard<'m, T>,
        mut condition: impl FnMut(&mut T) -> bool,
    ) -> MutexGuard<'m, T> {
        while condition(&mut *guard) {
            guard = self.wait(guard);
        }
        guard
    }

    fn raw(&self) -> *mut pthread_cond_t {
        unsafe { (*self.inner.get()).as_mut_ptr() }
    }
}

unsafe impl Send for Condvar {}
unsafe impl Sync for Condvar {}

impl Drop for Condvar {
    fn drop(&mut self) {
        if unsafe { pthread_cond_destroy(self.raw()) } != 0 {
            panic!("failed to destroy condvar");
        }
    }
}
