//! CLI command implementations.

pub mod apply;
pub mod approve;
pub mod batch;
pub mod check;
pub mod review;
pub mod status;
