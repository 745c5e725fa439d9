//! Test helper utilities
