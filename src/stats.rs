#[derive(Clone, Copy, Debug)]
pub(crate) enum Event
{
    BlockAllocated,
    BlockFreed,
    SharedDestroyed,
    UniqueDestroyed,
}

#[cfg(feature = "global")]
pub(crate) fn record(event: Event) { ledger::record(event) }

#[cfg(not(feature = "global"))]
pub(crate) fn record(_event: Event) {}

#[cfg(feature = "global")]
pub use ledger::{stats, Stats};

#[cfg(feature = "global")]
mod ledger
{
    use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};

    use lazy_static::lazy_static;

    use super::Event;

    lazy_static! {
        static ref BLOCKS_ALLOCATED: AtomicUsize = AtomicUsize::new(0);
        static ref BLOCKS_FREED: AtomicUsize = AtomicUsize::new(0);
        static ref SHARED_DESTROYED: AtomicUsize = AtomicUsize::new(0);
        static ref UNIQUE_DESTROYED: AtomicUsize = AtomicUsize::new(0);
    }

    pub(super) fn record(event: Event)
    {
        let counter: &AtomicUsize = match event {
            Event::BlockAllocated => &*BLOCKS_ALLOCATED,
            Event::BlockFreed => &*BLOCKS_FREED,
            Event::SharedDestroyed => &*SHARED_DESTROYED,
            Event::UniqueDestroyed => &*UNIQUE_DESTROYED,
        };
        counter.fetch_add(1, Relaxed);
    }

    /// Process-wide pointer bookkeeping, for diagnosing leaks and the like.
    ///
    /// Counters are monotonic since process start and read independently, so a
    /// snapshot taken while other threads work is only approximately coherent.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Stats
    {
        /// Shared control blocks allocated.
        pub blocks_allocated: usize,

        /// Shared control blocks freed, after the last strong and weak
        /// handles went away.
        pub blocks_freed: usize,

        /// Shared pointees handed to their destroyer.
        pub shared_destroyed: usize,

        /// Unique pointees handed to their destroyer.
        pub unique_destroyed: usize,
    }

    impl Stats
    {
        /// Control blocks still referenced by some `SharedPtr` or `WeakPtr`.
        pub fn live_blocks(&self) -> usize { self.blocks_allocated.saturating_sub(self.blocks_freed) }

        /// Shared pointees not yet destroyed.
        pub fn live_shared(&self) -> usize
        {
            self.blocks_allocated.saturating_sub(self.shared_destroyed)
        }
    }

    pub fn stats() -> Stats
    {
        Stats {
            blocks_allocated: BLOCKS_ALLOCATED.load(Relaxed),
            blocks_freed: BLOCKS_FREED.load(Relaxed),
            shared_destroyed: SHARED_DESTROYED.load(Relaxed),
            unique_destroyed: UNIQUE_DESTROYED.load(Relaxed),
        }
    }
}
