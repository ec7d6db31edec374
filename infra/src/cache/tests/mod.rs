//! Tests for placeholder caches

#[cfg(test)]
mod memory_tests;
