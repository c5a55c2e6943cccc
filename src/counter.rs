use std::{
    any::type_name,
    cell::UnsafeCell,
    mem,
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering::*},
};

use crate::{
    pointers::Destroyer,
    stats::{self, Event},
};

/// Counts above this are treated as a leak loop and abort the process.
const MAX_REFCOUNT: usize = isize::MAX as usize;

/// Strong and weak reference counts of one shared allocation.
///
/// All strong handles together hold one weak reference, so the weak count
/// only reaches zero once every `SharedPtr` and every `WeakPtr` is gone.
pub(crate) struct Counter
{
    strong: AtomicUsize,
    weak: AtomicUsize,
}

impl Counter
{
    pub(crate) fn new() -> Self
    {
        Self {
            strong: AtomicUsize::new(1),
            weak: AtomicUsize::new(1),
        }
    }

    /// Best-effort read, stale by the time it returns.
    pub(crate) fn strong(&self) -> usize { self.strong.load(Relaxed) }

    pub(crate) fn is_dead(&self) -> bool { self.strong.load(Acquire) == 0 }

    /// Only valid while the caller holds a strong reference.
    pub(crate) fn increment(&self)
    {
        if self.strong.fetch_add(1, Relaxed) > MAX_REFCOUNT {
            std::process::abort();
        }
    }

    /// Returns true if this call took the strong count from 1 to 0.
    pub(crate) fn decrement(&self) -> bool { self.strong.fetch_sub(1, AcqRel) == 1 }

    /// Take a strong reference unless the count has already reached zero.
    pub(crate) fn try_increment(&self) -> bool
    {
        let mut current = self.strong.load(Relaxed);
        loop {
            if current == 0 {
                return false;
            }
            if current > MAX_REFCOUNT {
                std::process::abort();
            }
            match self
                .strong
                .compare_exchange_weak(current, current + 1, Acquire, Relaxed)
            {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    pub(crate) fn increment_weak(&self)
    {
        if self.weak.fetch_add(1, Relaxed) > MAX_REFCOUNT {
            std::process::abort();
        }
    }

    /// Returns true if this call released the last weak reference.
    pub(crate) fn decrement_weak(&self) -> bool { self.weak.fetch_sub(1, AcqRel) == 1 }

    /// Weak handles alive, excluding the one held by the strong handles.
    pub(crate) fn weak(&self) -> usize
    {
        let weak = self.weak.load(Relaxed);
        if self.strong() == 0 {
            weak
        } else {
            weak.saturating_sub(1)
        }
    }
}

/// Heap block shared by every `SharedPtr` and `WeakPtr` of one pointee.
///
/// The pointee and its destroyer are touched by exactly one thread after
/// construction: the one whose decrement took the strong count to zero.
/// Until then they are only read through strong handles.
pub(crate) struct SharedBlock<T: ?Sized + 'static>
{
    counter: Counter,
    value: UnsafeCell<Option<Box<T>>>,
    destroyer: UnsafeCell<Destroyer<T>>,
}

impl<T: ?Sized + 'static> SharedBlock<T>
{
    pub(crate) fn allocate(value: Box<T>, destroyer: Destroyer<T>) -> NonNull<Self>
    {
        stats::record(Event::BlockAllocated);
        trace!("allocated control block for `{}`", type_name::<T>());
        NonNull::from(Box::leak(Box::new(Self {
            counter: Counter::new(),
            value: UnsafeCell::new(Some(value)),
            destroyer: UnsafeCell::new(destroyer),
        })))
    }

    pub(crate) fn counter(&self) -> &Counter { &self.counter }

    /// # Safety
    ///
    /// The caller must hold a strong reference for as long as the returned
    /// borrow lives.
    pub(crate) unsafe fn value(&self) -> Option<&T> { (*self.value.get()).as_deref() }

    /// Drop one strong reference, destroying the pointee if it was the last.
    ///
    /// # Safety
    ///
    /// `this` must point to a live block and the caller must give up one
    /// strong reference it owns.
    pub(crate) unsafe fn release_strong(this: NonNull<Self>)
    {
        if !this.as_ref().counter.decrement() {
            return;
        }

        // The count is zero: no strong handle is left and no weak handle can
        // promote, so this thread has exclusive access to the payload.
        let value = (*this.as_ref().value.get()).take();
        let mut destroyer = mem::take(&mut *this.as_ref().destroyer.get());

        stats::record(Event::SharedDestroyed);
        trace!("destroying shared `{}`", type_name::<T>());
        // An empty destroyer drops the value itself.
        let _ = destroyer.call((value,));
        drop(destroyer);

        Self::release_weak(this);
    }

    /// Drop one weak reference, freeing the block if it was the last.
    ///
    /// # Safety
    ///
    /// `this` must point to a live block and the caller must give up one
    /// weak reference it owns.
    pub(crate) unsafe fn release_weak(this: NonNull<Self>)
    {
        if this.as_ref().counter.decrement_weak() {
            stats::record(Event::BlockFreed);
            trace!("freed control block for `{}`", type_name::<T>());
            drop(Box::from_raw(this.as_ptr()));
        }
    }
}
