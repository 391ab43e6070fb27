// src/lib.rs
pub mod banner;
pub mod browser;
pub mod config;
pub mod content_script;
pub mod errors;
pub mod extractor;
pub mod lifecycle;
pub mod panel;
pub mod protocol;
pub mod service;
