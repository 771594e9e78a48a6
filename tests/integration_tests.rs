//! Main integration test entry point for srbeep

mod integration;

pub mod test_utils;
