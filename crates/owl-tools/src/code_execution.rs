use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use owl_toolcore::{param, ParameterDefinition, Tool, ToolContext, ToolParameters, ToolRegistry, ToolResult};
use tokio::process::Command as AsyncCommand;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const DANGEROUS_PATTERNS: &[&str] = &["rm -rf /", "sudo rm", ":(){ :|:& };:", "chmod -R 777 /", "dd if=", "mkfs"];

/// Register the code execution toolkit
pub fn register_code_execution_tools(registry: &mut ToolRegistry) {
    registry.register_with_categories(ExecuteCodeTool::default(), vec!["code".to_string()]);
}

/// Runs Python or shell snippets in a subprocess inside the work dir
pub struct ExecuteCodeTool {
    timeout: Duration,
    python: String,
}

impl Default for ExecuteCodeTool {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            python: std::env::var("OWL_PYTHON").unwrap_or_else(|_| "python3".to_string()),
        }
    }
}

impl ExecuteCodeTool {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command_for(&self, language: &str, code: &str) -> Result<AsyncCommand, String> {
        match language {
            "python" | "python3" | "py" => {
                let mut cmd = AsyncCommand::new(&self.python);
                cmd.args(["-c", code]);
                Ok(cmd)
            }
            "bash" | "sh" | "shell" => {
                if let Some(pattern) = DANGEROUS_PATTERNS.iter().find(|p| code.contains(*p)) {
                    return Err(format!(
                        "Command blocked for security reasons: contains dangerous pattern '{}'",
                        pattern
                    ));
                }
                let mut cmd = AsyncCommand::new("bash");
                cmd.args(["-c", code]);
                Ok(cmd)
            }
            other => Err(format!(
                "Unsupported language '{}'. Supported languages: python, bash",
                other
            )),
        }
    }
}

#[async_trait]
impl Tool for ExecuteCodeTool {
    fn name(&self) -> &str {
        "execute_code"
    }

    fn description(&self) -> &str {
        "Execute a given code snippet (python or bash) and return the stdout, stderr and exit code."
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([
            param!("code", "string", "The input code to execute.", required),
            param!("language", "string", "The language of the code: python or bash.", optional, "python"),
        ])
    }

    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult {
        let code = match params.get_required::<String>("code") {
            Ok(code) => code,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let language = params
            .get_optional::<String>("language")
            .unwrap_or(None)
            .unwrap_or_else(|| "python".to_string())
            .to_lowercase();

        let mut command = match self.command_for(&language, &code) {
            Ok(command) => command,
            Err(e) => return ToolResult::error(e),
        };

        if let Err(e) = std::fs::create_dir_all(&context.work_dir) {
            return ToolResult::error(format!("Failed to prepare work dir: {}", e));
        }
        command
            .current_dir(&context.work_dir)
            .envs(&context.environment)
            .kill_on_drop(true);

        log::info!("executing {} code ({} bytes)", language, code.len());

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return ToolResult::error(format!("Failed to execute code: {}", e)),
            Err(_) => {
                return ToolResult::error(format!("Code execution timed out after {:?}", self.timeout))
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut result = format!(
            "Executed the code below:\n```{}\n{}\n```\n> Executed Results:\nExit code: {}\nSTDOUT:\n{}",
            language,
            code,
            output.status.code().unwrap_or(-1),
            stdout
        );
        if !stderr.is_empty() {
            result.push_str(&format!("\nSTDERR:\n{}", stderr));
        }

        ToolResult::success(result)
    }
}
