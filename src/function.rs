use std::{fmt, mem};

use crate::error::{Error, Result};

/// A callable that accepts the argument tuple `Args`.
///
/// Implemented for every `FnMut` closure or function of up to eight
/// arguments that is also `Clone + Send + Sync + 'static`. The arguments are passed
/// packed into a tuple, so a `fn(i32, &str)` is an `Invoke<(i32, &str)>` and a
/// nullary closure is an `Invoke<()>`.
pub trait Invoke<Args>: Clone + Send + Sync + 'static
{
    type Output;

    fn invoke(&mut self, args: Args) -> Self::Output;
}

macro_rules! impl_invoke {
    ($($arg:ident),*) => {
        impl<F, R, $($arg),*> Invoke<($($arg,)*)> for F
        where
            F: FnMut($($arg),*) -> R + Clone + Send + Sync + 'static,
        {
            type Output = R;

            #[allow(non_snake_case, clippy::unused_unit)]
            fn invoke(&mut self, ($($arg,)*): ($($arg,)*)) -> R { self($($arg),*) }
        }
    };
}

impl_invoke!();
impl_invoke!(A);
impl_invoke!(A, B);
impl_invoke!(A, B, C);
impl_invoke!(A, B, C, D);
impl_invoke!(A, B, C, D, E);
impl_invoke!(A, B, C, D, E, G);
impl_invoke!(A, B, C, D, E, G, H);
impl_invoke!(A, B, C, D, E, G, H, I);

trait Callable<Args, R>: Send + Sync
{
    fn invoke(&mut self, args: Args) -> R;

    fn clone_box(&self) -> Box<dyn Callable<Args, R>>;

    fn type_name(&self) -> &'static str;
}

struct Holder<F>(F);

impl<F, Args, R> Callable<Args, R> for Holder<F>
where
    F: Invoke<Args, Output = R>,
    Args: 'static,
    R: 'static,
{
    fn invoke(&mut self, args: Args) -> R { self.0.invoke(args) }

    fn clone_box(&self) -> Box<dyn Callable<Args, R>> { Box::new(Holder(self.0.clone())) }

    fn type_name(&self) -> &'static str { std::any::type_name::<F>() }
}

/// Type-erased callable with the fixed signature `Args -> R`.
///
/// `Args` is the argument list packed as a tuple. A default `Function` holds
/// nothing and fails with [`Error::EmptyCallable`] when called. Cloning a
/// `Function` clones the wrapped closure, captured state included, so the
/// clone evolves independently of the original.
///
/// ```
/// use ownkit::Function;
///
/// let mut add: Function<(i32, i32), i32> = Function::new(|a: i32, b: i32| a + b);
/// assert_eq!(add.call((2, 3)), Ok(5));
///
/// let mut nothing = Function::<(i32, i32), i32>::default();
/// assert_eq!(nothing.call((2, 3)), Err(ownkit::Error::EmptyCallable));
/// ```
pub struct Function<Args: 'static, R: 'static>
{
    callable: Option<Box<dyn Callable<Args, R>>>,
}

impl<Args: 'static, R: 'static> Function<Args, R>
{
    pub fn new<F>(callable: F) -> Self
    where
        F: Invoke<Args, Output = R>,
    {
        Self {
            callable: Some(Box::new(Holder(callable))),
        }
    }

    /// Invoke the wrapped callable.
    ///
    /// When nothing is held the arguments are dropped and
    /// [`Error::EmptyCallable`] is returned. Panics raised by the callable
    /// propagate unchanged.
    pub fn call(&mut self, args: Args) -> Result<R>
    {
        match self.callable.as_mut() {
            Some(callable) => Ok(callable.invoke(args)),
            None => Err(Error::EmptyCallable),
        }
    }

    pub fn is_empty(&self) -> bool { self.callable.is_none() }

    /// Move the callable out, leaving this `Function` empty.
    pub fn take(&mut self) -> Self { mem::take(self) }

    pub fn swap(&mut self, other: &mut Self) { mem::swap(&mut self.callable, &mut other.callable) }
}

impl<Args: 'static, R: 'static> Default for Function<Args, R>
{
    fn default() -> Self { Self { callable: None } }
}

impl<Args: 'static, R: 'static> Clone for Function<Args, R>
{
    fn clone(&self) -> Self
    {
        Self {
            callable: self.callable.as_ref().map(|c| c.clone_box()),
        }
    }
}

impl<Args: 'static, R: 'static> fmt::Debug for Function<Args, R>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Function")
            .field("callable", &self.callable.as_ref().map(|c| c.type_name()))
            .finish()
    }
}
