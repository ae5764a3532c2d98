use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Binary isolated from the developer's config, .env file and API key
fn transcriptor(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("social-transcriptor").expect("binary should build");
    cmd.current_dir(workdir.path())
        .env("XDG_CONFIG_HOME", workdir.path())
        .env("HOME", workdir.path())
        .env_remove("ASSEMBLYAI_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn responses(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout must only carry JSON-RPC"))
        .collect()
}

#[test]
fn test_serve_handshake_and_tool_listing() {
    let workdir = TempDir::new().unwrap();
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"it","version":"0"}}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        "\n",
    );

    let output = transcriptor(&workdir)
        .arg("serve")
        .write_stdin(input)
        .assert()
        .success()
        .stderr(predicate::str::contains("Social MCP Server is now running"))
        .get_output()
        .stdout
        .clone();

    let responses = responses(&output);
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "social");
    assert_eq!(
        responses[1]["result"]["tools"][0]["name"],
        "get_instagram_transcript"
    );
}

#[test]
fn test_serve_invalid_url_returns_failure_text() {
    let workdir = TempDir::new().unwrap();
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":"t","method":"tools/call","params":{"name":"get_instagram_transcript","arguments":{"url":"https://example.com/watch"}}}"#,
        "\n",
    );

    let output = transcriptor(&workdir)
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let responses = responses(&output);
    assert_eq!(responses.len(), 1);
    let text = responses[0]["result"]["content"][0]["text"].as_str().unwrap();
    assert_eq!(
        text,
        "❌ Error processing Instagram content: Invalid Instagram URL format: https://example.com/watch"
    );
}

#[test]
fn test_serve_unknown_method() {
    let workdir = TempDir::new().unwrap();

    transcriptor(&workdir)
        .arg("serve")
        .write_stdin("{\"jsonrpc\":\"2.0\",\"id\":5,\"method\":\"prompts/list\"}\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("-32601"));
}

#[test]
fn test_transcribe_invalid_url_exits_with_failure() {
    let workdir = TempDir::new().unwrap();

    transcriptor(&workdir)
        .args(["transcribe", "https://example.com/p/ABC/"])
        .assert()
        .failure()
        .stdout(predicate::str::starts_with("❌ Error processing Instagram content"));
}

#[test]
fn test_platforms_lists_formats() {
    let workdir = TempDir::new().unwrap();

    transcriptor(&workdir)
        .arg("platforms")
        .assert()
        .success()
        .stdout(predicate::str::contains("Instagram posts, reels"))
        .stdout(predicate::str::contains("instagram.com/reel/"));
}

#[test]
fn test_config_masks_key() {
    let workdir = TempDir::new().unwrap();

    transcriptor(&workdir)
        .arg("config")
        .env("ASSEMBLYAI_API_KEY", "supersecretkey1234")
        .assert()
        .success()
        .stdout(predicate::str::contains("**************1234"))
        .stdout(predicate::str::contains("supersecret").not());
}
