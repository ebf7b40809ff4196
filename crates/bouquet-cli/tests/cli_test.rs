//! Integration tests for the `bouquet` binary.
//!
//! None of these need a database: they cover `init`, and the two ways
//! `serve` refuses to start.

use std::path::Path;
use std::process::{Command, Output};

fn bouquet(config_home: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bouquet"));
    cmd.args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env("NO_COLOR", "1")
        .env_remove("GROQ_API_KEY")
        .env_remove("BOUQUET_DATABASE_URL")
        .env_remove("BOUQUET_LLM_MODEL")
        .env_remove("BOUQUET_LLM_BASE_URL")
        .env_remove("BOUQUET_LLM_TIMEOUT_SECS")
        .env_remove("FRONTEND_URL")
        .env_remove("PORT");
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("failed to run bouquet binary")
}

fn combined(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn test_init_writes_config_file() {
    let dir = tempfile::tempdir().unwrap();

    let output = run(&mut bouquet(
        dir.path(),
        &[
            "init",
            "--db-url",
            "postgresql://db.example:5432/weddings",
            "--frontend-url",
            "https://plans.example",
            "--port",
            "6000",
        ],
    ));
    assert!(output.status.success(), "init failed: {}", combined(&output));

    let path = dir.path().join("bouquet").join("config.toml");
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("postgresql://db.example:5432/weddings"));
    assert!(contents.contains("https://plans.example"));
    assert!(contents.contains("6000"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn test_init_refuses_to_overwrite_without_force() {
    let dir = tempfile::tempdir().unwrap();

    let first = run(&mut bouquet(dir.path(), &["init"]));
    assert!(first.status.success(), "{}", combined(&first));

    let second = run(&mut bouquet(dir.path(), &["init"]));
    assert!(!second.status.success());
    assert!(combined(&second).contains("--force"));

    let forced = run(&mut bouquet(
        dir.path(),
        &["init", "--force", "--db-url", "postgresql://other:5432/bouquet"],
    ));
    assert!(forced.status.success(), "{}", combined(&forced));
    let contents =
        std::fs::read_to_string(dir.path().join("bouquet").join("config.toml")).unwrap();
    assert!(contents.contains("postgresql://other:5432/bouquet"));
}

#[test]
fn test_serve_without_api_key_fails_fast() {
    let dir = tempfile::tempdir().unwrap();

    let output = run(&mut bouquet(dir.path(), &["serve", "--port", "0"]));
    assert!(!output.status.success());
    assert!(
        combined(&output).contains("GROQ_API_KEY"),
        "unexpected output: {}",
        combined(&output)
    );
}

#[test]
fn test_serve_exits_when_database_unreachable() {
    let dir = tempfile::tempdir().unwrap();

    let output = run(bouquet(dir.path(), &["serve", "--bind", "127.0.0.1", "--port", "0"])
        .env("GROQ_API_KEY", "test-key")
        .env("BOUQUET_DATABASE_URL", "postgresql://127.0.0.1:1/bouquet"));

    assert!(!output.status.success());
    let text = combined(&output);
    assert!(text.contains("database connection failed"), "unexpected output: {text}");
    assert!(!text.contains("listening"), "must not listen: {text}");
    assert!(!text.contains("test-key"), "API key leaked: {text}");
}
