//! End-to-end behaviour of the chatline binary on piped input.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

/// A scratch working directory outside the source tree so no `.env` is
/// picked up. Removed when dropped.
struct ScratchDir(PathBuf);

impl ScratchDir {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("chatline-cli-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn run_chatline(name: &str, env: &[(&str, &str)], args: &[&str], input: &str) -> Output {
    let scratch = ScratchDir::new(name);
    let mut child = Command::new(env!("CARGO_BIN_EXE_chatline"))
        .args(args)
        .args(["--no-color"])
        .env_clear()
        .envs(env.iter().copied())
        .current_dir(&scratch.0)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn scratch_dir_is_removed_after_use() {
    let scratch = ScratchDir::new("cleanup");
    let path = scratch.0.clone();
    assert!(path.is_dir());
    drop(scratch);
    assert!(!path.exists());
}

const SERVICE: &[(&str, &str)] = &[
    ("OPENAI_ENDPOINT", "https://example.openai.azure.com/"),
    ("OPENAI_KEY", "not-a-real-key"),
];

#[test]
fn end_of_input_exits_cleanly() {
    let output = run_chatline("eof", SERVICE, &[], "");
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("gpt-35-turbo"));
    assert!(stdout.contains("Goodbye!"));
}

#[test]
fn quit_command_exits_cleanly() {
    let output = run_chatline("quit", SERVICE, &["--deployment", "gpt-4"], "/help\n/q\n");
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("gpt-4"));
    assert!(stdout.contains("/search on|off"));
}

#[test]
fn failed_request_is_reported_and_the_loop_continues() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    let output = run_chatline(
        "unreachable",
        &[("OPENAI_ENDPOINT", endpoint.as_str()), ("OPENAI_KEY", "not-a-real-key")],
        &[],
        "hello\n/stats\n",
    );
    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Turns: 1"));
}

#[test]
fn missing_key_is_fatal() {
    let output = run_chatline(
        "nokey",
        &[("OPENAI_ENDPOINT", "https://example.openai.azure.com/")],
        &[],
        "",
    );
    assert_ne!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stderr).contains("OPENAI_KEY"));
}

#[test]
fn search_index_without_service_is_fatal() {
    let output = run_chatline("noservice", SERVICE, &["--search-index", "docs"], "");
    assert_ne!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stderr).contains("AZURE_SEARCH_ENDPOINT"));
}
