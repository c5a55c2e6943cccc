//! # Process-wide console
//!
//! Diagnostic printing for code built on this crate. All writers share one
//! output stream, stdout until redirected with [`set_output`]. The stream is
//! created on first use and lives until the process exits; call [`flush`]
//! before exiting if the sink buffers.
//!
//! ```
//! ownkit::console_println!("answer = ", 42, ", ok = ", true).unwrap();
//! ownkit::console::flush().unwrap();
//! ```

use std::{
    cell::RefCell,
    fmt,
    io::{self, Write},
    mem,
};

use lazy_static::lazy_static;
use parking_lot::ReentrantMutex;

/// Destination of console output.
pub type Sink = Box<dyn Write + Send>;

/// Exclusive access to the console for the current thread.
///
/// The lock is reentrant, so code running under it may keep calling the free
/// functions of this module. While the guard's `RefCell` is borrowed they
/// return an [`io::ErrorKind::WouldBlock`] error instead of writing.
pub type OutputGuard =
    lock_api::ReentrantMutexGuard<'static, parking_lot::RawMutex, parking_lot::RawThreadId, RefCell<Output>>;

pub struct Output
{
    sink: Sink,
}

impl Output
{
    /// Write the concatenation of `parts`, followed by a newline if asked.
    pub fn write_parts(&mut self, parts: &[&dyn fmt::Display], newline: bool) -> io::Result<()>
    {
        for part in parts {
            write!(self.sink, "{}", part)?;
        }
        if newline {
            self.sink.write_all(b"\n")?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> { self.sink.flush() }
}

lazy_static! {
    static ref OUTPUT: ReentrantMutex<RefCell<Output>> = ReentrantMutex::new(RefCell::new(Output {
        sink: Box::new(io::stdout()),
    }));
}

pub fn lock() -> OutputGuard { OUTPUT.lock() }

fn with_output<R>(write: impl FnOnce(&mut Output) -> io::Result<R>) -> io::Result<R>
{
    let guard = lock();
    let mut output = guard
        .try_borrow_mut()
        .map_err(|_| io::Error::new(io::ErrorKind::WouldBlock, "console is already in use on this thread"))?;
    write(&mut output)
}

/// Redirect the console, returning the previous sink unflushed.
pub fn set_output(sink: Sink) -> io::Result<Sink>
{
    with_output(|output| Ok(mem::replace(&mut output.sink, sink)))
}

pub fn print(parts: &[&dyn fmt::Display]) -> io::Result<()>
{
    with_output(|output| output.write_parts(parts, false))
}

pub fn println(parts: &[&dyn fmt::Display]) -> io::Result<()>
{
    with_output(|output| output.write_parts(parts, true))
}

pub fn flush() -> io::Result<()> { with_output(Output::flush) }

/// Trace lines are dropped rather than nested when the current thread is
/// already writing to the console.
#[allow(dead_code)]
pub(crate) fn trace(location: fmt::Arguments<'_>, message: fmt::Arguments<'_>)
{
    let guard = lock();
    let busy = guard.try_borrow_mut();
    if let Ok(mut output) = busy {
        let _ = output.write_parts(&[&location, &" ", &message], true);
    }
}

/// Print the concatenation of the arguments to the console.
#[macro_export]
macro_rules! console_print {
    ($($arg:expr),* $(,)?) => {
        $crate::console::print(&[$(&$arg as &dyn ::std::fmt::Display),*])
    };
}

/// Print the concatenation of the arguments to the console, then a newline.
#[macro_export]
macro_rules! console_println {
    ($($arg:expr),* $(,)?) => {
        $crate::console::println(&[$(&$arg as &dyn ::std::fmt::Display),*])
    };
}
