//! Tests for the refresh token service
