use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `gist` binary isolated from the caller's environment, config and `.env`
fn gist(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gist").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("GOOGLE_API_KEY")
        .env_remove("VIDEO_GIST_CONFIG")
        .env("RUST_LOG", "off")
        .arg("--config")
        .arg(dir.path().join("config.yaml"));
    cmd
}

#[test]
fn test_video_id_prints_identifier() {
    let dir = TempDir::new().unwrap();
    gist(&dir)
        .args(["video-id", "https://www.youtube.com/watch?v=xyz789"])
        .assert()
        .success()
        .stdout("xyz789\n");
}

#[test]
fn test_video_id_rejects_other_hosts() {
    let dir = TempDir::new().unwrap();
    gist(&dir)
        .args(["video-id", "https://example.com/foo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No YouTube video id found"));
}

#[test]
fn test_summarize_without_api_key_fails_fast() {
    let dir = TempDir::new().unwrap();
    gist(&dir)
        .args(["--quiet", "summarize", "https://youtu.be/abc123"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GOOGLE_API_KEY"));
}

#[test]
fn test_ask_without_api_key_fails_fast() {
    let dir = TempDir::new().unwrap();
    gist(&dir)
        .args(["--quiet", "ask", "https://youtu.be/abc123", "What is it about?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key is missing"));
}

#[test]
fn test_config_show_writes_default_file() {
    let dir = TempDir::new().unwrap();
    gist(&dir)
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gemma-3-12b-it"))
        .stdout(predicate::str::contains("en, en-US, en-GB"));

    assert!(dir.path().join("config.yaml").exists());
}

#[test]
fn test_interactive_quits_on_command() {
    let dir = TempDir::new().unwrap();
    gist(&dir)
        .args(["--quiet", "interactive"])
        .write_stdin(":help\n:transcript\n:quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(":ask <question>"))
        .stderr(predicate::str::contains("No transcript loaded yet"));
}
