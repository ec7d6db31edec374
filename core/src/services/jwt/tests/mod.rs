//! Tests for JWT building and validation

#[cfg(test)]
mod validator_tests;
