use std::{
    cell::UnsafeCell,
    marker::PhantomData,
    mem::MaybeUninit,
    ops::{Deref, DerefMut},
};

use libc::{
    pthread_mutex_destroy, pthread_mutex_init, pthread_mutex_lock, pthread_mutex_t,
    pthread_mutex_unlock, pthread_mutexattr_destroy, pthread_mutexattr_init,
    pthread_mutexattr_settype, PTHREAD_MUTEX_ERRORCHECK,
};

use crate::{CheckOk, Error};

/// Process-private pthread mutex owning the data it guards.
///
/// The raw lock lives on the heap so its address stays fixed when the
/// `Mutex` itself is moved after initialization.
#[derive(Debug)]
pub struct Mutex<T> {
    lock: Box<UnsafeCell<MaybeUninit<pthread_mutex_t>>>,
    data: UnsafeCell<T>,
}

impl<T> Mutex<T> {
    pub fn new(data: T) -> Result<Self, Error> {
        let lock = Box::new(UnsafeCell::new(MaybeUninit::uninit()));
        let mut attr = MaybeUninit::uninit();
        unsafe {
            pthread_mutexattr_init(attr.as_mut_ptr()).r("mutexattr_init")?;

            // Relocking from the owning thread reports EDEADLK instead of hanging.
            let typed = pthread_mutexattr_settype(attr.as_mut_ptr(), PTHREAD_MUTEX_ERRORCHECK);
            let init = if typed == 0 {
                pthread_mutex_init((*lock.get()).as_mut_ptr(), attr.as_ptr())
            } else {
                0
            };
            pthread_mutexattr_destroy(attr.as_mut_ptr());

            typed.r("mutexattr_settype")?;
            init.r("mutex_init")?;
        }

        Ok(Self {
            lock,
            data: UnsafeCell::new(data),
        })
    }

    pub fn lock(&self) -> MutexGuard<T> {
        unsafe {
            let res = pthread_mutex_lock(self.raw());
            if res != 0 {
                panic!("failed to lock mutex: code {res}");
            }
            MutexGuard {
                lock: self,
                data: &mut *self.data.get(),
                _unsend: PhantomData,
            }
        }
    }

    fn raw(&self) -> *mut pthread_mutex_t {
        unsafe { (*self.lock.get()).as_mut_ptr() }
    }
}

/// Unlocks on drop. Must stay on the thread that locked.
pub struct MutexGuard<'a, T: 'a> {
    lock: &'a Mutex<T>,
    data: &'a mut T,
    _unsend: PhantomData<*const ()>,
}

impl<'a, T: 'a> MutexGuard<'a, T> {
    pub(super) fn raw_lock(&self) -> *mut pthread_mutex_t {
        self.lock.raw()
    }
}

impl<T> Deref for MutexGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        self.data
    }
}

impl<T> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.data
    }
}

impl<T> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        unsafe {
            if pthread_mutex_unlock(self.lock.raw()) != 0 {
                panic!("failed to unlock mutex");
            }
        }
    }
}

unsafe impl<T: Send> Send for Mutex<T> {}
unsafe impl<T: Send> Sync for Mutex<T> {}

impl<T> Drop for Mutex<T> {
    fn drop(&mut self) {
        if unsafe { pthread_mutex_destroy(self.raw()) } != 0 {
            panic!("failed to destroy mutex");
        }
    }
}
