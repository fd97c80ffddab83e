// ABOUTME: Integration tests for the ssh-connect CLI.
// ABOUTME: Validates --help output, setup guidance, exit codes, and commands against a test server.

mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use support::ssh_server::{self, TestServer};

const SSH_VARS: [&str; 5] = [
    "SSH_HOST",
    "SSH_USER",
    "SSH_PASSWORD",
    "SSH_KEY_PATH",
    "SSH_PORT",
];

fn ssh_connect_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ssh-connect"));
    cmd.current_dir(dir);
    // Keep the user's known_hosts out of host key checks
    cmd.env("HOME", dir);
    cmd.env_remove("RUST_LOG");
    for var in SSH_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// A localhost port with nothing listening on it.
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn help_describes_usage() {
    let dir = tempfile::tempdir().unwrap();
    ssh_connect_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--env-file"))
        .stdout(predicate::str::contains("COMMAND"));
}

#[test]
fn missing_configuration_prints_template() {
    let dir = tempfile::tempdir().unwrap();
    let env_file = dir.path().join("empty.env");
    fs::write(&env_file, "").unwrap();

    ssh_connect_cmd(dir.path())
        .arg("--env-file")
        .arg(&env_file)
        .args(["uptime"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "Configuration error: SSH_HOST not set",
        ))
        .stdout(predicate::str::contains("Create a .env file with:"))
        .stdout(predicate::str::contains("SSH_KEY_PATH=~/.ssh/id_rsa"));
}

#[test]
fn invalid_port_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".env"),
        "SSH_HOST=127.0.0.1\nSSH_USER=u\nSSH_PASSWORD=p\nSSH_PORT=twenty-two\n",
    )
    .unwrap();

    ssh_connect_cmd(dir.path())
        .args(["--env-file", ".env", "uptime"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Configuration error"))
        .stdout(predicate::str::contains("twenty-two"));
}

#[test]
fn refused_connection_reports_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let port = closed_port();
    fs::write(
        dir.path().join(".env"),
        format!("SSH_HOST=127.0.0.1\nSSH_USER=u\nSSH_PASSWORD=p\nSSH_PORT={port}\n"),
    )
    .unwrap();

    ssh_connect_cmd(dir.path())
        .args(["--env-file", ".env", "echo", "hello"])
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("Connection error:"));
}

#[test]
fn missing_key_file_is_reported_without_template() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".env"),
        "SSH_HOST=127.0.0.1\nSSH_USER=u\nSSH_KEY_PATH=./no_such_key\n",
    )
    .unwrap();

    ssh_connect_cmd(dir.path())
        .args(["--env-file", ".env", "true"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("failed to load key"))
        .stdout(predicate::str::contains("Create a .env file").not());
}

#[test]
fn json_mode_reports_error_kind() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(".env"), "SSH_HOST=h\n").unwrap();

    ssh_connect_cmd(dir.path())
        .args(["--json", "--env-file", ".env", "ls"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(r#""event":"error""#))
        .stdout(predicate::str::contains(r#""kind":"configuration""#));
}

#[test]
fn override_flags_take_priority_over_file() {
    let dir = tempfile::tempdir().unwrap();
    let port = closed_port();
    fs::write(
        dir.path().join(".env"),
        "SSH_HOST=unresolvable.invalid\nSSH_USER=u\nSSH_PASSWORD=p\nSSH_PORT=nonsense\n",
    )
    .unwrap();

    // Valid overrides replace both bad values, so the failure is a refused connection
    ssh_connect_cmd(dir.path())
        .args(["--host", "127.0.0.1", "--port", &port.to_string(), "uptime"])
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("Connection error:"));
}

#[test]
fn non_numeric_port_flag_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".env"),
        "SSH_HOST=127.0.0.1\nSSH_USER=u\nSSH_PASSWORD=p\n",
    )
    .unwrap();

    ssh_connect_cmd(dir.path())
        .args(["--env-file", ".env", "--port", "ssh", "uptime"])
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("Configuration error:"))
        .stdout(predicate::str::contains("\"ssh\""));
}

/// Settings file pointing at `server` with valid credentials.
fn write_server_settings(dir: &Path, server: &TestServer) {
    fs::write(
        dir.join(".env"),
        format!(
            "SSH_HOST=127.0.0.1\nSSH_USER={}\nSSH_PASSWORD={}\nSSH_PORT={}\n",
            ssh_server::USER,
            ssh_server::PASSWORD,
            server.port()
        ),
    )
    .unwrap();
}

#[test]
fn command_output_is_printed_merged() {
    let server = TestServer::start();
    let dir = tempfile::tempdir().unwrap();
    write_server_settings(dir.path(), &server);

    ssh_connect_cmd(dir.path())
        .args(["--env-file", ".env", ssh_server::BOTH_STREAMS])
        .assert()
        .success()
        .stdout("out\nerr\n");
}

#[test]
fn nonzero_exit_status_is_a_warning_only() {
    let server = TestServer::start();
    let dir = tempfile::tempdir().unwrap();
    write_server_settings(dir.path(), &server);

    ssh_connect_cmd(dir.path())
        .args(["--env-file", ".env", ssh_server::FAILING])
        .assert()
        .success()
        .stdout("partial\n")
        .stderr(predicate::str::contains("exited with status 3"));
}

#[test]
fn json_mode_reports_exit_status() {
    let server = TestServer::start();
    let dir = tempfile::tempdir().unwrap();
    write_server_settings(dir.path(), &server);

    ssh_connect_cmd(dir.path())
        .args(["--json", "--env-file", ".env", ssh_server::FAILING])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""event":"success""#))
        .stdout(predicate::str::contains(r#""exit_status":3"#));
}
