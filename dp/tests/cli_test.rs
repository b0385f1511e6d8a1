//! CLI smoke tests for the `dp` binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `dp` with HOME, XDG dirs and the working directory inside `temp`
fn dp(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dp").unwrap();
    cmd.current_dir(temp.path())
        .env("HOME", temp.path())
        .env("XDG_DATA_HOME", temp.path().join("data"))
        .env("XDG_CONFIG_HOME", temp.path().join("config"))
        .env_remove("OPENAI_API_KEY");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let temp = TempDir::new().unwrap();
    dp(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("prompt"));
}

#[test]
fn test_prompt_prints_payload() {
    let temp = TempDir::new().unwrap();
    dp(&temp)
        .args(["prompt", "open notepad"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexed entries: 0"))
        .stdout(predicate::str::contains("```json"))
        .stdout(predicate::str::contains("open notepad"));
}

#[test]
fn test_prompt_uses_override_dir_from_config() {
    let temp = TempDir::new().unwrap();
    let prompts = temp.path().join("prompts");
    std::fs::create_dir(&prompts).unwrap();
    std::fs::write(prompts.join("operating.pmt"), "Custom operating block").unwrap();
    std::fs::write(temp.path().join(".deskpilot.yml"), "prompts-dir: prompts\n").unwrap();

    dp(&temp)
        .args(["prompt", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Custom operating block"));
}

#[test]
fn test_plan_without_key_fails() {
    let temp = TempDir::new().unwrap();
    dp(&temp)
        .args(["plan", "open notepad"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}
