//! replbuild: an HTML/CSS/JS playground with sandboxed live previews.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
