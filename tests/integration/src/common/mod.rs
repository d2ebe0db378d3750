//! Shared fixtures for the integration suites

#![allow(dead_code)]

use integration_tests::lsa::{Sid, SidNameUse};
use integration_tests::{PolicyClient, PolicyServer, PolicyServerConfig};
use msrpc::{Client, Loopback};
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// Domain served by [`policy_fixture`]
pub const DOMAIN: &str = "CONTOSO";
pub const DOMAIN_SID: &str = "S-1-5-21-1004336348-1177238915-682003330";

/// Install a fmt subscriber driven by `RUST_LOG`
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn domain_sid() -> Sid {
    Sid::parse(DOMAIN_SID).expect("valid domain SID")
}

pub fn server_config() -> PolicyServerConfig {
    PolicyServerConfig::new(DOMAIN, domain_sid())
        .with_account("alice", 1104, SidNameUse::USER)
        .with_account("bob", 1105, SidNameUse::USER)
        .with_account("Domain Admins", 512, SidNameUse::GROUP)
        .with_account("WS01$", 1201, SidNameUse::COMPUTER)
}

/// Server plus a loopback client bound to it
pub fn policy_fixture_with(config: PolicyServerConfig) -> (Arc<PolicyServer>, PolicyClient<Loopback>) {
    init_tracing();
    let server = Arc::new(PolicyServer::new(config));
    let transport = Loopback::new(server.dispatcher());
    (server, PolicyClient::new(Client::new(transport)))
}

pub fn policy_fixture() -> (Arc<PolicyServer>, PolicyClient<Loopback>) {
    policy_fixture_with(server_config())
}
