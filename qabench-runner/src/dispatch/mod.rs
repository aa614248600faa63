//! Task dispatchers.
//!
//! Two strategies cover the two backend safety classes:
//!
//! - [`shared`]: one bounded pool of concurrent workers, all invoking a
//!   single shared-safe client instance.
//! - [`isolated`]: one dedicated worker per isolated model, each owning a
//!   freshly built client; serial within a model, parallel across models.
//!
//! Both run concurrently against the same [`ResultSet`](crate::ResultSet)
//! and convert every backend failure into an error result in place: a
//! failing task never crashes a dispatcher or abandons its siblings.

pub mod isolated;
pub mod shared;

pub use isolated::run_isolated;
pub use shared::{run_shared, SHARED_POOL_CAP};
