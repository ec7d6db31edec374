//! Tests for key resolution and export
