// ABOUTME: Test support utilities.
// ABOUTME: Provides an in-process SSH server for integration tests.

// Each test binary only uses some of these modules, so allow dead_code.
#[allow(dead_code)]
pub mod ssh_server;
