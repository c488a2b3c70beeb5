use std::io::Write;
use std::process::{Command, Output, Stdio};

fn majlis() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_majlis"));
    cmd.env_remove("RUST_LOG")
        .env_remove("MAJLIS_LOG_LEVEL")
        .env_remove("MAJLIS_SEED")
        .env_remove("MAJLIS_MESSAGE_SPEED")
        .env_remove("MAJLIS_CONVERSATION_TYPE")
        .env("MAJLIS_LOG_LEVEL", "error");
    cmd
}

fn run_majlis(args: &[&str]) -> Output {
    majlis()
        .args(args)
        .output()
        .expect("Failed to execute majlis command")
}

fn run_majlis_with_env(args: &[&str], env_vars: Vec<(&str, &str)>) -> Output {
    let mut cmd = majlis();
    cmd.args(args);
    for (key, value) in env_vars {
        cmd.env(key, value);
    }
    cmd.output().expect("Failed to execute majlis command")
}

fn run_majlis_with_stdin(args: &[&str], env_vars: Vec<(&str, &str)>, input: &str) -> Output {
    let mut cmd = majlis();
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in env_vars {
        cmd.env(key, value);
    }

    let mut child = cmd.spawn().expect("Failed to spawn majlis");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");
    child.wait_with_output().expect("Failed to wait for majlis")
}

fn output_to_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_to_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

mod version_command_tests {
    use super::*;

    #[test]
    fn test_version_command_basic() {
        let output = run_majlis(&["version"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "version command should succeed");
        assert!(stdout.contains("majlis"), "output should contain 'majlis'");
        assert!(
            stdout.contains(env!("CARGO_PKG_VERSION")),
            "output should contain version number"
        );
    }

    #[test]
    fn test_version_command_detailed() {
        let output = run_majlis(&["version", "--detailed"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "version --detailed should succeed");
        assert!(stdout.contains("Version"));
        assert!(stdout.contains("Apache-2.0"));
        assert!(
            stdout.contains("technical"),
            "output should list personalities"
        );
    }
}

mod help_command_tests {
    use super::*;

    #[test]
    fn test_help_lists_commands() {
        let output = run_majlis(&["--help"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "--help should succeed");
        for command in ["simulate", "chat", "participants", "respond", "patterns", "config"] {
            assert!(stdout.contains(command), "help should mention {}", command);
        }
    }

    #[test]
    fn test_simulate_help() {
        let output = run_majlis(&["simulate", "--help"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        assert!(stdout.contains("--speed"));
        assert!(stdout.contains("--duration"));
    }
}

mod patterns_command_tests {
    use super::*;

    #[test]
    fn test_patterns_json_covers_every_personality() {
        let output = run_majlis(&["patterns", "--format", "json"]);
        assert!(output.status.success());

        let parsed: serde_json::Value =
            serde_json::from_str(&output_to_string(&output)).expect("valid JSON");
        let entries = parsed.as_array().expect("array of personalities");
        assert_eq!(entries.len(), 5);
        assert!(entries
            .iter()
            .all(|e| !e["generic_responses"].as_array().unwrap().is_empty()));
    }

    #[test]
    fn test_patterns_single_personality() {
        let output = run_majlis(&["patterns", "--personality", "technical", "--format", "json"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        assert!(stdout.contains("كود"));
        assert!(!stdout.contains("\"professional\""));
    }

    #[test]
    fn test_patterns_text_table() {
        let output = run_majlis(&["patterns"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        assert!(stdout.contains("Message Patterns"));
        assert!(stdout.contains("manager"));
    }
}

mod respond_command_tests {
    use super::*;

    #[test]
    fn test_respond_uses_matching_pattern() {
        let output = run_majlis(&[
            "respond",
            "الكود لا يعمل",
            "--personality",
            "technical",
            "--seed",
            "1",
            "--format",
            "json",
        ]);
        assert!(output.status.success(), "{}", stderr_to_string(&output));

        let parsed: serde_json::Value =
            serde_json::from_str(&output_to_string(&output)).expect("valid JSON");
        assert_eq!(parsed["source"], "pattern");
        assert_eq!(parsed["personality"], "technical");
        assert!(parsed["relevance"]["technical"].as_u64().unwrap() >= 3);
        assert_eq!(parsed["relevance"]["friendly"], 0);
    }

    #[test]
    fn test_respond_is_reproducible_with_seed() {
        let args = [
            "respond", "zzz", "--personality", "creative", "--seed", "42", "--format", "json",
        ];
        let first = output_to_string(&run_majlis(&args));
        let second = output_to_string(&run_majlis(&args));
        assert_eq!(first, second);
    }

    #[test]
    fn test_respond_unknown_personality() {
        let output = run_majlis(&["respond", "مرحبا", "--personality", "poet"]);

        assert!(!output.status.success());
        assert!(stderr_to_string(&output).contains("E2002"));
    }
}

mod participants_command_tests {
    use super::*;

    #[test]
    fn test_participants_json() {
        let output = run_majlis(&[
            "participants",
            "--participants",
            "4",
            "--seed",
            "7",
            "--format",
            "json",
        ]);
        assert!(output.status.success());

        let parsed: serde_json::Value =
            serde_json::from_str(&output_to_string(&output)).expect("valid JSON");
        let list = parsed.as_array().unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(list[0]["personality"], "professional");
        assert_eq!(list[2]["personality"], "technical");
    }

    #[test]
    fn test_participants_seeded_pool_repeats() {
        let args = [
            "participants", "--participants", "12", "--seed", "5", "--format", "json",
        ];
        let roster = |output: Output| -> Vec<(String, String)> {
            let parsed: serde_json::Value =
                serde_json::from_str(&output_to_string(&output)).unwrap();
            parsed
                .as_array()
                .unwrap()
                .iter()
                .map(|p| {
                    (
                        p["id"].as_str().unwrap().to_string(),
                        p["status"].as_str().unwrap().to_string(),
                    )
                })
                .collect()
        };
        assert_eq!(roster(run_majlis(&args)), roster(run_majlis(&args)));
    }

    #[test]
    fn test_participants_zero_rejected() {
        let output = run_majlis(&["participants", "--participants", "0"]);

        assert!(!output.status.success());
        assert!(stderr_to_string(&output).contains("E1003"));
    }
}

mod config_command_tests {
    use super::*;

    #[test]
    fn test_config_json_reflects_env() {
        let output = run_majlis_with_env(
            &["config", "--format", "json"],
            vec![
                ("MAJLIS_MESSAGE_SPEED", "fast"),
                ("MAJLIS_CONVERSATION_TYPE", "technical"),
            ],
        );
        assert!(output.status.success(), "{}", stderr_to_string(&output));

        let parsed: serde_json::Value =
            serde_json::from_str(&output_to_string(&output)).expect("valid JSON");
        assert_eq!(parsed["simulation"]["message_speed"], "fast");
        assert_eq!(parsed["simulation"]["conversation_type"], "technical");
    }

    #[test]
    fn test_config_toml() {
        let output = run_majlis(&["config", "--format", "toml"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        assert!(stdout.contains("[simulation]"));
        assert!(stdout.contains("[timing]"));
    }

    #[test]
    fn test_invalid_env_var_fails() {
        let output = run_majlis_with_env(&["config"], vec![("MAJLIS_SEED", "not-a-number")]);

        assert!(!output.status.success());
        assert!(stderr_to_string(&output).contains("E1001"));
    }

    #[test]
    fn test_missing_config_file_fails() {
        let output = run_majlis(&["--config", "/no/such/majlis.toml", "config"]);

        assert!(!output.status.success());
        assert!(stderr_to_string(&output).contains("not found"));
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("majlis.toml");
        std::fs::write(
            &path,
            "[simulation]\nparticipant_count = 9\nwelcome_limit = 2\n",
        )
        .unwrap();

        let output = run_majlis(&[
            "--config",
            path.to_str().unwrap(),
            "config",
            "--format",
            "json",
        ]);
        assert!(output.status.success(), "{}", stderr_to_string(&output));

        let parsed: serde_json::Value =
            serde_json::from_str(&output_to_string(&output)).unwrap();
        assert_eq!(parsed["simulation"]["participant_count"], 9);
        assert_eq!(parsed["simulation"]["welcome_limit"], 2);
    }
}

mod conversation_command_tests {
    use super::*;

    #[test]
    fn test_simulate_emits_welcome_messages() {
        let output = run_majlis_with_env(
            &[
                "simulate",
                "--duration",
                "3",
                "--speed",
                "fast",
                "--seed",
                "3",
                "--format",
                "json",
            ],
            vec![("MAJLIS_SIMULATION__ACTIVE_RATIO", "1.0")],
        );
        assert!(output.status.success(), "{}", stderr_to_string(&output));

        let events = json_lines(&output_to_string(&output));
        assert!(events
            .iter()
            .any(|e| e["type"] == "message" && e["kind"] == "welcome"));
        assert!(events.iter().all(|e| e["meeting_id"] == events[0]["meeting_id"]));
    }

    #[test]
    fn test_simulate_log_format_writes_events_to_stderr() {
        let output = run_majlis_with_env(
            &[
                "simulate", "--duration", "3", "--speed", "fast", "--seed", "3", "--format", "log",
            ],
            vec![
                ("MAJLIS_SIMULATION__ACTIVE_RATIO", "1.0"),
                ("MAJLIS_LOG_LEVEL", "info"),
            ],
        );
        assert!(output.status.success(), "{}", stderr_to_string(&output));

        let stderr = stderr_to_string(&output);
        assert!(
            majlis_core::WELCOME_MESSAGES
                .iter()
                .any(|text| stderr.contains(text)),
            "{}",
            stderr
        );
        assert!(stderr.contains("Meeting closed"));
        assert!(output_to_string(&output).trim().is_empty());
    }

    #[test]
    fn test_chat_accepts_stdin_triggers() {
        let output = run_majlis_with_stdin(
            &["chat", "--speed", "fast", "--linger", "0", "--format", "json"],
            vec![("MAJLIS_SIMULATION__ACTIVE_RATIO", "1.0")],
            "هل يمكننا مراجعة الكود؟\n/stats\n/quit\n",
        );
        assert!(output.status.success(), "{}", stderr_to_string(&output));

        let lines = json_lines(&output_to_string(&output));
        assert!(lines.iter().any(|e| e["type"] == "typing"));
        let stats = lines
            .iter()
            .find(|e| e.get("triggers_received").is_some())
            .expect("stats line");
        assert_eq!(stats["triggers_accepted"], 1);
    }
}
