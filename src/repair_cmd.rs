//! `qsmith repair`: turn a raw model completion into a validated quiz.
//!
//! Recovery → schema repair → validation. The quiz is printed as JSON on
//! stdout; the recovery stage is logged.

use anyhow::{Context, Result};
use quizsmith_core::quiz::{is_quiz_shaped, validate_quiz, Quiz};
use quizsmith_core::recover::{recover, JsonRepairer, RecoveryStage};
use quizsmith_core::repair::transform;
use std::io::Read;
use std::path::Path;

use crate::config::Config;
use crate::llm::{ChatClient, ChatRepairer};

pub async fn run_repair(config: &Config, path: &Path, llm_repair: bool) -> Result<()> {
    let raw = read_completion(path)?;
    let repairer = if llm_repair {
        Some(ChatRepairer::new(ChatClient::from_config(&config.llm)?))
    } else {
        None
    };

    let (quiz, stage) = repair_completion(&raw, repairer.as_ref().map(|r| r as &dyn JsonRepairer)).await?;
    tracing::info!(stage = ?stage, questions = quiz.questions.len(), "quiz repaired");
    println!("{}", serde_json::to_string_pretty(&quiz)?);
    Ok(())
}

/// Recover, transform, and validate one completion.
pub async fn repair_completion(
    raw: &str,
    repairer: Option<&dyn JsonRepairer>,
) -> Result<(Quiz, RecoveryStage)> {
    let recovered = recover(raw, is_quiz_shaped, repairer).await?;
    let repaired = transform(&recovered.value);
    let quiz = validate_quiz(&repaired).context("Repaired quiz failed validation")?;
    Ok((quiz, recovered.stage))
}

/// `-` reads stdin.
fn read_completion(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read completion from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read completion file: {}", path.display()))
}
