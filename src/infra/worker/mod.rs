//! Background execution: the rule worker thread, its message protocol, the
//! size-0-or-1 pool that owns it, and the column discovery worker.

pub mod columns;
pub mod pool;
pub mod protocol;
pub mod worker;

pub use pool::WorkerPool;
