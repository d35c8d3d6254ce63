use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn qsmith_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("qsmith");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = r#"[chunking]
max_chars = 120
min_chars = 20
overlap = 10

[source]
excerpt_chars = 40

[logging]
level = "warn"
"#;
    let config_path = config_dir.join("qsmith.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_qsmith(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = qsmith_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run qsmith binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn parse_json(stdout: &str) -> Value {
    serde_json::from_str(stdout).unwrap_or_else(|e| panic!("invalid JSON ({}): {}", e, stdout))
}

#[test]
fn test_ingest_manual_topic() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_qsmith(
        &config_path,
        &["ingest", "manual", "--topic", "Photosynthesis", "--progress", "off"],
    );
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);

    let out = parse_json(&stdout);
    let source = &out["source"];
    assert_eq!(source["sourceType"], "manual");
    assert_eq!(source["title"], "Photosynthesis");
    assert_eq!(source["text"], "Photosynthesis");
    assert_eq!(source["wordCount"], 1);
    assert_eq!(source["chunks"].as_array().unwrap().len(), 1);
    assert!(out.get("summary").is_none());
}

#[test]
fn test_ingest_selection_is_cleaned_and_chunked() {
    let (tmp, config_path) = setup_test_env();
    let path = tmp.path().join("selection.txt");
    let paragraph = "Mitochondria   produce energy for the cell through respiration.";
    fs::write(
        &path,
        format!("{p}\r\n\r\n\r\n{p}\n\n  {p}  \n\n{p}", p = paragraph),
    )
    .unwrap();

    let (stdout, stderr, success) = run_qsmith(
        &config_path,
        &[
            "ingest",
            "selection",
            path.to_str().unwrap(),
            "--url",
            "https://www.biology.example/cells",
            "--progress",
            "off",
        ],
    );
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);

    let source = &parse_json(&stdout)["source"];
    let text = source["text"].as_str().unwrap();
    assert!(!text.contains('\r'));
    assert!(!text.contains("   "));
    assert!(!text.contains("\n\n\n"));
    assert_eq!(source["domain"], "biology.example");
    assert_eq!(source["title"], "Untitled");
    assert!(source["excerpt"].as_str().unwrap().ends_with('…'));

    let chunks = source["chunks"].as_array().unwrap();
    assert!(chunks.len() > 1, "expected several chunks: {}", stdout);
    for chunk in chunks {
        assert!(chunk["text"].as_str().unwrap().chars().count() <= 120);
    }
    assert_eq!(chunks.last().unwrap()["end"], text.chars().count());
}

#[test]
fn test_ingest_page_falls_back_to_body_text() {
    let (tmp, config_path) = setup_test_env();
    let path = tmp.path().join("page.html");
    fs::write(
        &path,
        r#"<html><head><title>Volcanoes</title><script>track()</script></head>
        <body><h1>Volcanoes</h1><p>Magma rises through the crust.</p></body></html>"#,
    )
    .unwrap();

    let (stdout, stderr, success) = run_qsmith(
        &config_path,
        &["ingest", "page", path.to_str().unwrap(), "--progress", "off"],
    );
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);

    let source = &parse_json(&stdout)["source"];
    assert_eq!(source["sourceType"], "page");
    assert_eq!(source["title"], "Volcanoes");
    assert_eq!(source["text"], "Volcanoes\n\nMagma rises through the crust.");
    assert_eq!(source["meta"]["extraction"], "body");
}

#[test]
fn test_ingest_json_progress_goes_to_stderr() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_qsmith(
        &config_path,
        &["ingest", "manual", "--topic", "Tides", "--progress", "json"],
    );
    assert!(success, "ingest failed: stderr={}", stderr);
    parse_json(&stdout);

    let progress: Value = stderr
        .lines()
        .find_map(|l| serde_json::from_str::<Value>(l).ok())
        .unwrap_or_else(|| panic!("no JSON progress on stderr: {}", stderr));
    assert_eq!(progress["event"], "progress");
    assert_eq!(progress["phase"], "extracted");
    assert_eq!(progress["sourceType"], "manual");
}

#[test]
fn test_ingest_empty_selection_fails() {
    let (tmp, config_path) = setup_test_env();
    let path = tmp.path().join("empty.txt");
    fs::write(&path, " \n\u{200B}\n\t").unwrap();

    let (_, stderr, success) = run_qsmith(
        &config_path,
        &["ingest", "selection", path.to_str().unwrap(), "--progress", "off"],
    );
    assert!(!success);
    assert!(stderr.contains("No readable text"), "stderr={}", stderr);
}

#[test]
fn test_ingest_summarize_requires_llm() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_qsmith(
        &config_path,
        &["ingest", "manual", "--topic", "Tides", "--summarize"],
    );
    assert!(!success);
    assert!(stderr.contains("No LLM configured"), "stderr={}", stderr);
}

#[test]
fn test_repair_fenced_completion() {
    let (tmp, config_path) = setup_test_env();
    let path = tmp.path().join("completion.txt");
    fs::write(
        &path,
        r#"Sure! Here is your quiz:

```json
{
  "questions": [
    {"type": "multiple choice", "question": "Capital of France?",
     "options": ["London", "Berlin", "Paris", "Rome"], "answer": "Paris"},
    {"type": "tf", "question": "The sun is a star.", "answer": "True"},
    {"type": "fill in the blank", "question": "Water boils at ___ C.", "blanks": ["100"]}
  ]
}
```
Let me know if you need more."#,
    )
    .unwrap();

    let (stdout, stderr, success) =
        run_qsmith(&config_path, &["repair", path.to_str().unwrap()]);
    assert!(success, "repair failed: stdout={}, stderr={}", stdout, stderr);

    let quiz = parse_json(&stdout);
    let questions = quiz["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0]["type"], "MCQ");
    assert_eq!(questions[0]["options"][2]["isCorrect"], true);
    assert_eq!(questions[1]["type"], "True/False");
    assert_eq!(questions[1]["options"][0]["text"], "True");
    assert_eq!(questions[1]["options"][0]["isCorrect"], true);
    assert_eq!(questions[2]["type"], "Fill in Blank");
}

#[test]
fn test_repair_unrecoverable_completion_fails() {
    let (tmp, config_path) = setup_test_env();
    let path = tmp.path().join("completion.txt");
    fs::write(&path, "I'm sorry, I can't produce a quiz for this page.").unwrap();

    let (stdout, stderr, success) =
        run_qsmith(&config_path, &["repair", path.to_str().unwrap()]);
    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("no valid JSON"), "stderr={}", stderr);
}

#[test]
fn test_missing_config_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");

    let (stdout, stderr, success) = run_qsmith(
        &missing,
        &["ingest", "manual", "--topic", "Defaults", "--progress", "off"],
    );
    assert!(success, "stderr={}", stderr);
    assert_eq!(parse_json(&stdout)["source"]["title"], "Defaults");
}

#[test]
fn test_invalid_config_is_rejected() {
    let (tmp, _) = setup_test_env();
    let bad = tmp.path().join("bad.toml");
    fs::write(&bad, "[chunking]\nmax_chars = 100\nmin_chars = 10\noverlap = 500\n").unwrap();

    let (_, stderr, success) = run_qsmith(
        &bad,
        &["ingest", "manual", "--topic", "x", "--progress", "off"],
    );
    assert!(!success);
    assert!(stderr.contains("overlap"), "stderr={}", stderr);
}

#[test]
fn test_completions() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) = run_qsmith(&config_path, &["completions", "bash"]);
    assert!(success);
    assert!(stdout.contains("qsmith"));
}
