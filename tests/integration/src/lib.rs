//! Integration test support
//!
//! A hand-written binding for part of the LSA policy interface, shaped the
//! way generated bindings are, and an in-memory server for it. The test
//! targets in this crate drive both through [`msrpc::Client`] and a
//! [`msrpc::Loopback`] transport.
//!
//! Run a single suite:
//! ```text
//! cargo test -p integration-tests --test policy_tests
//! cargo test -p integration-tests --test wire_fixture_tests
//! cargo test -p integration-tests --test concurrency_tests
//! ```
//!
//! Run with increased logging:
//! ```text
//! RUST_LOG=debug cargo test -p integration-tests
//! ```

pub mod lsa;
pub mod server;

pub use lsa::PolicyClient;
pub use server::{Account, PolicyServer, PolicyServerConfig};
