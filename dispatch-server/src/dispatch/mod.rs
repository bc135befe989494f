//! Dispatch Module - the order workflow
//!
//! # Structure
//!
//! - [`splitter`] - cart splitting and order-group creation
//! - [`arbiter`] - race-free delivery agent assignment
//! - [`lifecycle`] - status updates, delivery, cancellations, refunds
//! - [`compensator`] - stock restoration for dead orders
//! - [`broadcaster`] - notification fan-out
//! - [`geo`] - distance annotation
//! - [`error`] - workflow error taxonomy

pub mod arbiter;
pub mod broadcaster;
pub mod compensator;
pub mod error;
pub mod geo;
pub mod lifecycle;
pub mod splitter;

pub use error::{DispatchError, DispatchResult};
