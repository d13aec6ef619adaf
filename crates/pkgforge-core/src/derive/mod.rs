//! Manifest derivation
//!
//! Ties the change source adapters, the ignore filter, the aggregator, the
//! merger and the serializer together into one run producing a
//! [`DerivationResult`].

pub mod options;
pub mod order;
pub mod pipeline;
pub mod result;

pub use options::DeriveOptions;
pub use order::OrderController;
pub use pipeline::{Deriver, PreparedChanges};
pub use result::DerivationResult;
