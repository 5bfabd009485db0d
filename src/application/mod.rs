//! Application services layer.

pub mod error;
pub mod preview;
pub mod repls;
pub mod repos;
