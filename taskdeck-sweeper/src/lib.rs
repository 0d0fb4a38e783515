//! # Taskdeck Sweeper Library
//!
//! Background retention enforcement for Taskdeck: items in the trash longer
//! than the retention window are permanently deleted on a fixed cadence.
//!
//! ## Modules
//!
//! - `sweep`: One pass of the trash sweep
//! - `scheduler`: Periodic scheduling with cooperative cancellation
//!
//! ## Example
//!
//! ```no_run
//! use taskdeck_sweeper::scheduler::SweepScheduler;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(pool: sqlx::PgPool) {
//! let cancel = CancellationToken::new();
//! let handle = SweepScheduler::new().spawn(pool, cancel.clone());
//! # }
//! ```

pub mod scheduler;
pub mod sweep;
