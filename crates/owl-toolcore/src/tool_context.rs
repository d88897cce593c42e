use std::collections::HashMap;
use std::path::PathBuf;

/// Tool execution context
///
/// Carries the working directory tools resolve relative paths against, the
/// session identifier and extra environment handed to subprocesses.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub work_dir: PathBuf,
    pub session_id: String,
    pub environment: HashMap<String, String>,
}

impl ToolContext {
    pub fn new(work_dir: PathBuf, session_id: String) -> Self {
        Self {
            work_dir,
            session_id,
            environment: HashMap::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// Look up a value in the context environment, then the process environment
    pub fn env_var(&self, key: &str) -> Option<String> {
        self.environment
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
            .filter(|v| !v.is_empty())
    }

    /// Resolve `path` against the working directory unless it is absolute
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let candidate = PathBuf::from(path);
        if candidate.is_absolute() {
            candidate
        } else {
            self.work_dir.join(candidate)
        }
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        Self::new(PathBuf::from("."), "default".to_string())
    }
}
