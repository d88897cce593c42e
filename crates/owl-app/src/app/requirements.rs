use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use owl_requirements::{AgentCoordinator, ClarificationRequest, PromptTemplates, WorkflowOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::{requirements_clients, OwlConfig};

/// Coordinator wired to the configured model, templates and output directory
pub fn build_coordinator(config: &OwlConfig, output: Option<PathBuf>) -> Result<AgentCoordinator> {
    let templates = PromptTemplates::load(config.requirements.templates_dir.as_deref())?;
    let (client, quality_client) = requirements_clients(config)?;
    Ok(
        AgentCoordinator::from_clients(client, quality_client, &templates, config.requirements.max_retries)
            .with_output_dir(output.unwrap_or_else(|| config.output_dir.clone())),
    )
}

/// Question text shown to the user, with numbered options when there are any
pub fn format_clarification(clarification: &ClarificationRequest) -> String {
    let mut text = clarification.question.clone();
    if let Some(context) = clarification.context.as_deref().filter(|c| !c.is_empty()) {
        text.push_str(&format!("\n({})", context));
    }
    for (i, option) in clarification.options.iter().flatten().enumerate() {
        text.push_str(&format!("\n  {}. {}", i + 1, option));
    }
    text
}

fn print_complete(outcome: &WorkflowOutcome) {
    let WorkflowOutcome::Complete {
        requirements,
        quality,
        saved_to,
        ..
    } = outcome
    else {
        return;
    };

    println!();
    println!("{}", "Requirements:".bright_green().bold());
    for req in requirements {
        println!(
            "  [{}] {} ({}, {})",
            req.id,
            req.title,
            req.priority.as_str(),
            req.requirement_type.as_str()
        );
    }
    println!(
        "{}",
        format!(
            "Quality: requirements {:.0}, analysis {:.0}",
            quality.requirements_quality.score, quality.analysis_quality.score
        )
        .bright_black()
    );
    for issue in &quality.issues {
        println!("  {} {}", "•".yellow(), issue);
    }
    if let Some(path) = saved_to {
        println!("{}", format!("Document saved to {}", path.display()).green());
    }
}

/// Interactive requirements dialogue on stdin/stdout
pub async fn run_requirements_cli(coordinator: AgentCoordinator, input: Option<String>) -> Result<()> {
    println!("{}", "🦉 OWL - Requirements Analysis".bright_cyan().bold());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut text = match input {
        Some(text) => text,
        None => {
            println!("Describe your requirements (empty line to quit):");
            match lines.next_line().await? {
                Some(line) if !line.trim().is_empty() => line,
                _ => return Ok(()),
            }
        }
    };

    let session = coordinator.create_session().await;
    loop {
        match coordinator.process_input(&session, &text).await? {
            WorkflowOutcome::NeedsClarification { clarification, .. } => {
                println!();
                println!("{}", format_clarification(&clarification).bright_yellow());
                match lines.next_line().await? {
                    Some(line) if !line.trim().is_empty() => text = line,
                    _ => {
                        println!("{}", "Stopped before the requirements were complete".yellow());
                        return Ok(());
                    }
                }
            }
            outcome @ WorkflowOutcome::Complete { .. } => {
                print_complete(&outcome);
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clarification() {
        let clarification = ClarificationRequest {
            question: "Which platforms?".to_string(),
            options: Some(vec!["Web".to_string(), "Mobile".to_string()]),
            context: Some("Affects the UI stack".to_string()),
        };
        assert_eq!(
            format_clarification(&clarification),
            "Which platforms?\n(Affects the UI stack)\n  1. Web\n  2. Mobile"
        );
        assert_eq!(format_clarification(&ClarificationRequest::new("Why?")), "Why?");
    }
}
