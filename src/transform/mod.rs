//! Semantic transforms over parsed queries.
//!
//! ```text
//! text → parse → resolve ─┬─ rename   → rewritten text
//!                         ├─ detect   → values per property
//!                         └─ extract  → live filter tuples
//! ```

mod detector;
mod live_filter;
mod rename;

pub use detector::{DetectedValues, detect};
pub use live_filter::{LiveFilter, extract};
pub use rename::rename_value;
