//! Core services implementing the reconciler.
//!
//! - `notification`: Channel announcing repairs
//! - `reconciler`: Height checks, repair queue and run orchestration
//! - `store`: Document store access and range queries

pub mod notification;
pub mod reconciler;
pub mod store;
