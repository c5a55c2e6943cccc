use std::{any::type_name, fmt, marker::PhantomData, mem, ptr::NonNull};

use crate::{
    counter::SharedBlock,
    function::Function,
    stats::{self, Event},
};

/// Closure that releases a pointee.
///
/// It receives `None` when the owning pointer is null and must accept that.
/// Destroyers must not panic: a panic propagates out of `drop` and leaks the
/// shared control block, if any.
pub type Destroyer<T> = Function<(Option<Box<T>>,), ()>;

/// The destroyer used when none is given: drops the box.
pub fn default_destroyer<T: ?Sized + 'static>() -> Destroyer<T>
{
    Function::new(|ptr: Option<Box<T>>| drop(ptr))
}

fn address<T: ?Sized>(it: Option<&T>) -> *const ()
{
    it.map_or(std::ptr::null(), |r| r as *const T as *const ())
}

fn block_address<T: ?Sized>(block: Option<NonNull<T>>) -> *const ()
{
    block.map_or(std::ptr::null(), |b| b.as_ptr() as *const ())
}

/// Sole owner of a heap object.
///
/// Like `Box` with a pluggable destroyer, and nullable. Not `Clone`: moving
/// is the only way to hand ownership on, and a move carries the destroyer
/// along. The destroyer runs exactly once per adopted pointer, on `reset` or
/// on drop, and is also run with `None` when a null pointer is dropped.
pub struct UniquePtr<T: ?Sized + 'static>
{
    ptr: Option<Box<T>>,
    destroyer: Destroyer<T>,
}

impl<T: ?Sized + 'static> UniquePtr<T>
{
    pub fn new(value: T) -> Self
    where
        T: Sized,
    {
        Self::from_box(Box::new(value))
    }

    pub fn from_box(value: Box<T>) -> Self { Self::with_destroyer(value, default_destroyer()) }

    pub fn with_destroyer(value: Box<T>, destroyer: Destroyer<T>) -> Self
    {
        Self {
            ptr: Some(value),
            destroyer,
        }
    }

    pub fn null() -> Self
    {
        Self {
            ptr: None,
            destroyer: default_destroyer(),
        }
    }

    pub fn get(&self) -> Option<&T> { self.ptr.as_deref() }

    pub fn get_mut(&mut self) -> Option<&mut T> { self.ptr.as_deref_mut() }

    pub fn is_null(&self) -> bool { self.ptr.is_none() }

    /// Replace the destroyer, returning the previous one.
    pub fn set_destroyer(&mut self, destroyer: Destroyer<T>) -> Destroyer<T>
    {
        mem::replace(&mut self.destroyer, destroyer)
    }

    /// Run the current destroyer on the current pointer, even if null, then
    /// adopt `ptr` and `destroyer`.
    pub fn reset(&mut self, ptr: Option<Box<T>>, destroyer: Destroyer<T>)
    {
        self.destroy();
        self.ptr = ptr;
        self.destroyer = destroyer;
    }

    /// Give up the pointee without running the destroyer on it.
    pub fn release(&mut self) -> Option<Box<T>> { self.ptr.take() }

    pub fn swap(&mut self, other: &mut Self) { mem::swap(self, other) }

    fn destroy(&mut self)
    {
        let ptr = self.ptr.take();
        if ptr.is_some() {
            stats::record(Event::UniqueDestroyed);
            trace!("destroying unique `{}`", type_name::<T>());
        }
        // An empty destroyer drops the pointer itself.
        let _ = self.destroyer.call((ptr,));
    }
}

impl<T: ?Sized + 'static> Drop for UniquePtr<T>
{
    fn drop(&mut self) { self.destroy() }
}

impl<T: ?Sized + 'static> Default for UniquePtr<T>
{
    fn default() -> Self { Self::null() }
}

impl<T: ?Sized + 'static> From<Box<T>> for UniquePtr<T>
{
    fn from(it: Box<T>) -> Self { Self::from_box(it) }
}

/// Pointers compare by the address of their pointee; null equals null.
///
/// Zero-sized pointees all share one dangling address, so a pointer to one
/// only equals itself.
impl<T: ?Sized + 'static> PartialEq for UniquePtr<T>
{
    fn eq(&self, other: &Self) -> bool
    {
        match self.get() {
            Some(pointee) if mem::size_of_val(pointee) == 0 => std::ptr::eq(self, other),
            _ => address(self.get()) == address(other.get()),
        }
    }
}

impl<T: ?Sized + 'static> Eq for UniquePtr<T> {}

impl<T: ?Sized + fmt::Debug + 'static> fmt::Debug for UniquePtr<T>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("UniquePtr").field("ptr", &self.get()).finish()
    }
}

/// Reference-counted owner of a heap object.
///
/// Clones share the pointee and the destroyer given at construction. The
/// destroyer runs exactly once, on whichever thread drops the last clone.
/// Only the counts are synchronized; shared mutation of the pointee needs
/// its own interior mutability. Cycles leak.
pub struct SharedPtr<T: ?Sized + 'static>
{
    block: Option<NonNull<SharedBlock<T>>>,
    _phantom: PhantomData<SharedBlock<T>>,
}

unsafe impl<T: ?Sized + Send + Sync + 'static> Send for SharedPtr<T> {}
unsafe impl<T: ?Sized + Send + Sync + 'static> Sync for SharedPtr<T> {}

impl<T: ?Sized + 'static> SharedPtr<T>
{
    pub fn new(value: T) -> Self
    where
        T: Sized,
    {
        Self::from_box(Box::new(value))
    }

    pub fn from_box(value: Box<T>) -> Self { Self::with_destroyer(value, default_destroyer()) }

    pub fn with_destroyer(value: Box<T>, destroyer: Destroyer<T>) -> Self
    {
        Self::from_block(Some(SharedBlock::allocate(value, destroyer)))
    }

    pub fn null() -> Self { Self::from_block(None) }

    fn from_block(block: Option<NonNull<SharedBlock<T>>>) -> Self
    {
        Self {
            block,
            _phantom: PhantomData,
        }
    }

    fn block(&self) -> Option<&SharedBlock<T>> { self.block.map(|b| unsafe { &*b.as_ptr() }) }

    pub fn get(&self) -> Option<&T> { self.block().and_then(|b| unsafe { b.value() }) }

    pub fn is_null(&self) -> bool { self.block.is_none() }

    /// Number of strong handles, zero when null.
    ///
    /// Diagnostic only: other threads may change it before it is returned.
    pub fn use_count(&self) -> usize { self.block().map_or(0, |b| b.counter().strong()) }

    /// Number of weak handles, zero when null. Diagnostic only.
    pub fn weak_count(&self) -> usize { self.block().map_or(0, |b| b.counter().weak()) }

    pub fn downgrade(&self) -> WeakPtr<T>
    {
        if let Some(block) = self.block() {
            block.counter().increment_weak();
        }
        WeakPtr::from_block(self.block)
    }

    /// True if both point to the same pointee, or both are null.
    pub fn ptr_eq(&self, other: &Self) -> bool
    {
        block_address(self.block) == block_address(other.block)
    }

    pub fn swap(&mut self, other: &mut Self) { mem::swap(self, other) }

    /// Release the current pointee, then adopt `ptr` with a fresh count of one,
    /// or become null when `ptr` is `None`.
    pub fn reset(&mut self, ptr: Option<Box<T>>, destroyer: Destroyer<T>)
    {
        self.release();
        if let Some(ptr) = ptr {
            self.block = Some(SharedBlock::allocate(ptr, destroyer));
        }
    }

    fn release(&mut self)
    {
        if let Some(block) = self.block.take() {
            unsafe { SharedBlock::release_strong(block) }
        }
    }
}

impl<T: ?Sized + 'static> Clone for SharedPtr<T>
{
    fn clone(&self) -> Self
    {
        if let Some(block) = self.block() {
            block.counter().increment();
        }
        Self::from_block(self.block)
    }
}

impl<T: ?Sized + 'static> Drop for SharedPtr<T>
{
    fn drop(&mut self) { self.release() }
}

impl<T: ?Sized + 'static> Default for SharedPtr<T>
{
    fn default() -> Self { Self::null() }
}

impl<T: ?Sized + 'static> From<Box<T>> for SharedPtr<T>
{
    fn from(it: Box<T>) -> Self { Self::from_box(it) }
}

impl<T: ?Sized + 'static> PartialEq for SharedPtr<T>
{
    fn eq(&self, other: &Self) -> bool { self.ptr_eq(other) }
}

impl<T: ?Sized + 'static> Eq for SharedPtr<T> {}

impl<T: ?Sized + fmt::Debug + 'static> fmt::Debug for SharedPtr<T>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("SharedPtr")
            .field("ptr", &self.get())
            .field("use_count", &self.use_count())
            .finish()
    }
}

/// Non-owning observer of a `SharedPtr` pointee.
///
/// Never keeps the pointee alive. It does keep the control block allocated,
/// so `expired` and `lock` stay sound after the pointee is gone.
pub struct WeakPtr<T: ?Sized + 'static>
{
    block: Option<NonNull<SharedBlock<T>>>,
    _phantom: PhantomData<SharedBlock<T>>,
}

unsafe impl<T: ?Sized + Send + Sync + 'static> Send for WeakPtr<T> {}
unsafe impl<T: ?Sized + Send + Sync + 'static> Sync for WeakPtr<T> {}

impl<T: ?Sized + 'static> WeakPtr<T>
{
    pub fn new() -> Self { Self::from_block(None) }

    fn from_block(block: Option<NonNull<SharedBlock<T>>>) -> Self
    {
        Self {
            block,
            _phantom: PhantomData,
        }
    }

    fn block(&self) -> Option<&SharedBlock<T>> { self.block.map(|b| unsafe { &*b.as_ptr() }) }

    pub fn expired(&self) -> bool { self.block().is_none_or(|b| b.counter().is_dead()) }

    /// Attempt to take shared ownership.
    ///
    /// Returns a null `SharedPtr` once the last strong handle is gone. The
    /// strong count is never raised from zero.
    pub fn lock(&self) -> SharedPtr<T>
    {
        match self.block() {
            Some(block) if block.counter().try_increment() => SharedPtr::from_block(self.block),
            _ => SharedPtr::null(),
        }
    }

    /// Number of strong handles to the pointee. Diagnostic only.
    pub fn use_count(&self) -> usize { self.block().map_or(0, |b| b.counter().strong()) }

    /// True if both observe the same pointee, or both are empty.
    pub fn ptr_eq(&self, other: &Self) -> bool
    {
        block_address(self.block) == block_address(other.block)
    }

    pub fn swap(&mut self, other: &mut Self) { mem::swap(self, other) }
}

impl<T: ?Sized + 'static> Clone for WeakPtr<T>
{
    fn clone(&self) -> Self
    {
        if let Some(block) = self.block() {
            block.counter().increment_weak();
        }
        Self::from_block(self.block)
    }
}

impl<T: ?Sized + 'static> Drop for WeakPtr<T>
{
    fn drop(&mut self)
    {
        if let Some(block) = self.block.take() {
            unsafe { SharedBlock::release_weak(block) }
        }
    }
}

impl<T: ?Sized + 'static> Default for WeakPtr<T>
{
    fn default() -> Self { Self::new() }
}

impl<T: ?Sized + 'static> From<&SharedPtr<T>> for WeakPtr<T>
{
    fn from(it: &SharedPtr<T>) -> Self { it.downgrade() }
}

impl<T: ?Sized + 'static> PartialEq for WeakPtr<T>
{
    fn eq(&self, other: &Self) -> bool { self.ptr_eq(other) }
}

impl<T: ?Sized + 'static> Eq for WeakPtr<T> {}

impl<T: ?Sized + 'static> fmt::Debug for WeakPtr<T>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("WeakPtr")
            .field("block", &self.block)
            .field("expired", &self.expired())
            .finish()
    }
}

pub fn make_unique<T: 'static>(value: T) -> UniquePtr<T> { UniquePtr::new(value) }

pub fn make_shared<T: 'static>(value: T) -> SharedPtr<T> { SharedPtr::new(value) }

pub fn make_weak<T: ?Sized + 'static>(shared: &SharedPtr<T>) -> WeakPtr<T> { shared.downgrade() }
