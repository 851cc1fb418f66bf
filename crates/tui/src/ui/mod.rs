//! UI rendering module for the TUI application.
//!
//! Components hold their own state and drawing code; `main` composes them into
//! a frame and `runtime` drives the event loop.

pub mod components;
pub mod main;
pub mod runtime;
pub mod utils;
