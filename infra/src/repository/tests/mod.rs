//! Tests for the in-memory refresh token store

#[cfg(test)]
mod memory_tests;
