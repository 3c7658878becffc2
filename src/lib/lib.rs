#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Transactional email delivery with automatic failover
//!
//! Messages go out through a third-party delivery provider. When the provider
//! fails in a way that says something about the provider rather than the
//! message, the same send is re-issued on a fallback channel backed by the
//! authentication backend.

pub mod domain;
pub mod infrastructure;
