//! Subcommand implementations

use anyhow::{bail, Context};
use skillflow_core::DirectoryCatalog;
use skillflow_foundation::{Error, SkillEventKind, SkillflowConfig};
use skillflow_runtime::{InstanceHandle, SkillRuntime};
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

/// `skillflow skills`
pub fn list_skills(config: &SkillflowConfig) -> anyhow::Result<()> {
    let catalog = DirectoryCatalog::from_config(config);
    let skills = catalog.list();

    if skills.is_empty() {
        println!("No skills found in {}", catalog.root().display());
        return Ok(());
    }

    println!("\nSkills in {}\n", catalog.root().display());
    println!("{:<24} {}", "NAME", "DESCRIPTION");
    println!("{}", "-".repeat(72));
    for skill in skills {
        println!("{:<24} {}", skill.name, truncate(&skill.description, 46));
    }
    println!();
    Ok(())
}

/// `skillflow show <name>`
pub fn show_skill(config: &SkillflowConfig, name: &str) -> anyhow::Result<()> {
    let catalog = DirectoryCatalog::from_config(config);
    let Some(skill) = catalog.select_skill(name) else {
        bail!("No skill named '{}'", name);
    };

    println!("# {}\n\n{}\n", skill.name, skill.description);
    println!("{}", catalog.load_full_instructions(&skill)?);
    Ok(())
}

/// `skillflow add <dir> --name --description --body`
pub fn add_skill(
    config: &SkillflowConfig,
    dir: &str,
    name: &str,
    description: &str,
    body: &Path,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(body)
        .with_context(|| format!("Failed to read {}", body.display()))?;

    let catalog = DirectoryCatalog::from_config(config);
    let skill = catalog.add_skill(dir, name, description, &text)?;
    println!("✓ Added '{}' at {}", skill.name, skill.location.display());
    Ok(())
}

/// `skillflow match <input>`
pub async fn match_skill(config: SkillflowConfig, input: &str) -> anyhow::Result<()> {
    let runtime = SkillRuntime::from_config(config)?;
    match runtime.match_skills(input).await.first() {
        Some(name) => println!("{}", name),
        None => println!("(no skill)"),
    }
    Ok(())
}

/// `skillflow run <input> [--skill <name>]`
pub async fn run(config: SkillflowConfig, input: &str, skill: Option<&str>) -> anyhow::Result<()> {
    let runtime = SkillRuntime::from_config(config)?;

    let instance = match skill {
        Some(name) => runtime.execute_skill(name, input).await?,
        None => match runtime.run(input).await? {
            Some(instance) => instance,
            None => {
                println!("No skill matches this request.");
                return Ok(());
            }
        },
    };

    drive(instance).await
}

/// Print events and answer human tasks from stdin until the instance ends
async fn drive(mut instance: InstanceHandle) -> anyhow::Result<()> {
    let mut events = instance.subscribe();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nInterrupted");
                instance.cancel();
                continue;
            }
        };

        let event = match event {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Skipped {} events", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        match event.kind {
            SkillEventKind::Log { text } => println!("· {}", text),
            SkillEventKind::HumanTask(task) => {
                println!("\n? {}", task.hint);
                if !task.current_input_text.is_empty() {
                    println!("  ({})", truncate(&task.current_input_text, 70));
                }
                print!("> ");
                std::io::stdout().flush()?;

                let answer = tokio::select! {
                    line = stdin.next_line() => line?.unwrap_or_default(),
                    _ = tokio::signal::ctrl_c() => {
                        eprintln!("\nInterrupted");
                        instance.cancel();
                        continue;
                    }
                };
                if let Err(e) = instance.feedback(task.activity_id.as_str(), answer.trim()).await {
                    eprintln!("✗ {}", e);
                }
            }
            SkillEventKind::Finished { error } => {
                if let Some(error) = error {
                    eprintln!("✗ {}", error);
                }
                break;
            }
        }
    }

    match finished(instance.wait().await)? {
        Some(summary) => println!(
            "\n{} · {} activities · run {}",
            summary.state,
            summary.completed.len(),
            summary.run_id
        ),
        None => println!("\nInterrupted · run cancelled"),
    }
    Ok(())
}

/// Outcome of `wait`; `None` when the run was cancelled
fn finished<T>(result: skillflow_foundation::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(summary) => Ok(Some(summary)),
        Err(Error::Cancelled) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Truncate a string for display
fn truncate(s: &str, max_chars: usize) -> String {
    let single_line = s.replace('\n', " ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let cut: String = single_line.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("line one\nline two", 40), "line one line two");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
        assert_eq!(truncate("환불 요청을 처리합니다", 5), "환불...");
    }

    #[test]
    fn test_cancelled_run_is_not_an_error() {
        assert!(finished::<()>(Err(Error::Cancelled)).unwrap().is_none());
        assert_eq!(finished(Ok(3)).unwrap(), Some(3));
        assert!(finished::<()>(Err(Error::Engine("boom".into()))).is_err());
    }
}
