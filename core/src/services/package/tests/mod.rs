//! Tests for package issuance and the login state machine
