//! Integration tests module

pub mod config_test;
pub mod ring_buffer_test;
pub mod session_test;
