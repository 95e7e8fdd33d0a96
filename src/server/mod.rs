//! Accept loop, connection queue and worker pool.
//!
//! ```text
//!   acceptor ──put──▶ ConnectionQueue (workers × 8) ──get──▶ worker 0..N
//!      ▲                     │ full
//!      └──── blocks ◀────────┘
//! ```

pub mod listener;
pub mod queue;
pub mod worker;
