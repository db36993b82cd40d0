//! Application services layer.

pub mod accounts;
pub mod blog;
pub mod error;
pub mod repos;
