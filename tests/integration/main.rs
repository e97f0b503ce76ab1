//! Integration tests for pagekit
//! These exercise the registry against the bundled emitters and the helpers
//! through the public API only.

pub mod harness;

pub mod helpers_test;
pub mod registry_test;
