//! Skip wiremock-backed tests where localhost sockets cannot be bound.
//!
//! Some sandboxes forbid binding even `127.0.0.1:0`. Those tests are skipped
//! with a note on stderr, unless `MODEL_FETCHER_REQUIRE_SOCKET_TESTS` is set,
//! in which case they fail loudly instead.

use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

const REQUIRE_SOCKET_TESTS_VAR: &str = "MODEL_FETCHER_REQUIRE_SOCKET_TESTS";

/// True when `MODEL_FETCHER_REQUIRE_SOCKET_TESTS` is `1`, `true` or `yes`.
#[must_use]
pub fn socket_tests_required() -> bool {
    std::env::var(REQUIRE_SOCKET_TESTS_VAR)
        .is_ok_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Probes localhost; returns true when the calling test should return early.
#[track_caller]
#[must_use]
pub fn should_skip_socket_bound_test() -> bool {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return false;
    }

    let caller = Location::caller();
    let message = format!(
        "[socket-bound-test] {}:{} needs a localhost socket and none can be bound here",
        caller.file(),
        caller.line()
    );
    assert!(
        !socket_tests_required(),
        "{message}; unset {REQUIRE_SOCKET_TESTS_VAR} to skip instead"
    );

    eprintln!("{message}; skipping (set {REQUIRE_SOCKET_TESTS_VAR}=1 to fail instead)");
    true
}

/// Starts a mock asset host, or `None` when the test must be skipped.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if should_skip_socket_bound_test() {
        return None;
    }
    Some(MockServer::start().await)
}
