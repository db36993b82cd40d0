//! Foglio: a small self-hosted blog backend.
//!
//! Posts and comments over Postgres, token authentication, and a
//! read-through projection cache in front of the hot read paths.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
