use std::{any::type_name, fmt, mem};

use crate::{
    error::{Error, Result},
    pointers::UniquePtr,
};

trait Placeholder: Send + Sync
{
    fn clone_box(&self) -> Box<dyn Placeholder>;

    fn as_any(&self) -> &dyn std::any::Any;

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;

    fn into_any(self: Box<Self>) -> Box<dyn std::any::Any>;

    fn type_name(&self) -> &'static str;
}

struct Holder<T>
{
    held: T,
}

impl<T: Clone + Send + Sync + 'static> Placeholder for Holder<T>
{
    fn clone_box(&self) -> Box<dyn Placeholder>
    {
        Box::new(Holder {
            held: self.held.clone(),
        })
    }

    fn as_any(&self) -> &dyn std::any::Any { &self.held }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any { &mut self.held }

    fn into_any(self: Box<Self>) -> Box<dyn std::any::Any> { Box::new(self.held) }

    fn type_name(&self) -> &'static str { type_name::<T>() }
}

/// A value of any clonable type, recoverable by its exact type.
///
/// Reading an `Any` as the wrong type is an [`Error::TypeMismatch`], never a
/// reinterpretation. Cloning clones the held value.
///
/// ```
/// use ownkit::{Any, Error};
///
/// let mut value = Any::new(42i32);
/// assert_eq!(value.cast::<i32>(), Ok(&mut 42));
/// assert!(matches!(value.cast::<f64>(), Err(Error::TypeMismatch { .. })));
/// ```
pub struct Any
{
    content: UniquePtr<dyn Placeholder>,
}

impl Any
{
    pub fn new<T: Clone + Send + Sync + 'static>(value: T) -> Self
    {
        let holder: Box<dyn Placeholder> = Box::new(Holder { held: value });
        Self {
            content: UniquePtr::from_box(holder),
        }
    }

    pub fn has_value(&self) -> bool { !self.content.is_null() }

    /// Name of the held type, `None` when empty.
    pub fn type_name(&self) -> Option<&'static str> { self.content.get().map(|h| h.type_name()) }

    pub fn is<T: 'static>(&self) -> bool { self.content.get().is_some_and(|h| h.as_any().is::<T>()) }

    /// Borrow the held value mutably, if it is a `T`.
    pub fn cast<T: 'static>(&mut self) -> Result<&mut T>
    {
        let error = self.mismatch::<T>();
        self.content
            .get_mut()
            .and_then(|h| h.as_any_mut().downcast_mut::<T>())
            .ok_or(error)
    }

    /// Borrow the held value, if it is a `T`.
    pub fn cast_ref<T: 'static>(&self) -> Result<&T>
    {
        self.content
            .get()
            .and_then(|h| h.as_any().downcast_ref::<T>())
            .ok_or_else(|| self.mismatch::<T>())
    }

    /// Move the held value out if it is a `T`, leaving this `Any` empty.
    ///
    /// On a mismatch the value stays in place.
    pub fn take<T: 'static>(&mut self) -> Result<T>
    {
        if !self.is::<T>() {
            return Err(self.mismatch::<T>());
        }
        self.content
            .release()
            .and_then(|h| h.into_any().downcast::<T>().ok())
            .map(|b| *b)
            .ok_or_else(|| self.mismatch::<T>())
    }

    /// Replace the held value, dropping the previous one.
    pub fn set<T: Clone + Send + Sync + 'static>(&mut self, value: T) { *self = Self::new(value) }

    pub fn reset(&mut self) { *self = Self::default() }

    pub fn swap(&mut self, other: &mut Self) { mem::swap(&mut self.content, &mut other.content) }

    fn mismatch<T: 'static>(&self) -> Error
    {
        let expected = type_name::<T>();
        match self.type_name() {
            Some(found) => Error::TypeMismatch { expected, found },
            None => Error::EmptyValue { expected },
        }
    }
}

impl Default for Any
{
    fn default() -> Self
    {
        Self {
            content: UniquePtr::null(),
        }
    }
}

impl Clone for Any
{
    fn clone(&self) -> Self
    {
        match self.content.get() {
            Some(holder) => Self {
                content: UniquePtr::from_box(holder.clone_box()),
            },
            None => Self::default(),
        }
    }

    /// Copy-and-swap: `self` is left untouched if cloning `source` panics.
    fn clone_from(&mut self, source: &Self)
    {
        let mut copy = source.clone();
        self.swap(&mut copy);
    }
}

impl fmt::Debug for Any
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Any").field("type_name", &self.type_name()).finish()
    }
}
