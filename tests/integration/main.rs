//! Integration tests for Sesame

#[allow(dead_code)]
mod fixtures;

mod cli;

#[cfg(unix)]
mod pipeline;
