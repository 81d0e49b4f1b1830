//! Planeval core library.
//!
//! The three evaluation stages over the reference caches: the action
//! reconstruction comparator, the heuristic domain-equivalence prober, and
//! the metric driver that sequences both over a result batch.

mod driver;
mod error;
mod probe;
mod recons;
pub mod telemetry;

pub use driver::MetricDriver;
pub use error::{EvalError, Result};
pub use probe::{DomainProber, ProbeOutcome};
pub use recons::reconstruction_error;
pub use telemetry::init_tracing;

/// Planeval version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
