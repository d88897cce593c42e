use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// CLI arguments for owl
#[derive(Parser, Debug)]
#[command(name = "owl")]
#[command(about = "OWL - multi-agent task automation with role-playing LLM agents")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: owl.yaml, owl.yml, owl.json or owl.toml in the current directory)
    #[arg(long, value_name = "PATH", env = "OWL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve a task with a user/assistant agent pair
    Run {
        /// The task to solve
        #[arg(long)]
        task: String,

        /// Model spec for both agents, e.g. "gpt-4o" or "deepseek-chat@deepseek"
        #[arg(long, value_name = "SPEC")]
        model: Option<String>,

        /// Separate model spec for the user agent
        #[arg(long, value_name = "SPEC")]
        user_model: Option<String>,

        /// Maximum number of user/assistant rounds
        #[arg(long, value_name = "N")]
        round_limit: Option<usize>,

        /// Language both agents answer in
        #[arg(long)]
        language: Option<String>,

        /// Comma-separated toolkits (search, document, excel, code, file_write, sec)
        #[arg(long, value_delimiter = ',')]
        toolkits: Option<Vec<String>>,

        /// Directory for written files and run artifacts
        #[arg(long, value_name = "PATH")]
        output_dir: Option<PathBuf>,
    },

    /// Solve a task with tools served by MCP servers
    Mcp {
        /// MCP servers config (JSON with mcpServers / mcpWebServers)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// The task to solve
        #[arg(long)]
        task: String,

        #[arg(long, value_name = "N")]
        round_limit: Option<usize>,

        /// Also register the built-in toolkits from the config
        #[arg(long)]
        with_toolkits: bool,
    },

    /// Turn free-form requirements into an analysed requirements document
    Requirements {
        #[arg(long, value_enum, default_value_t = RequirementsMode::Cli)]
        mode: RequirementsMode,

        /// Requirements text; prompts on stdin when omitted
        #[arg(long)]
        input: Option<String>,

        /// Web server bind address (web mode)
        #[arg(long)]
        host: Option<String>,

        /// Web server port (web mode)
        #[arg(long)]
        port: Option<u16>,

        /// Directory the finished document is written to
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Write an investment analysis report for a company
    Stock {
        #[arg(long, default_value = "Google")]
        company: String,

        #[arg(long, value_name = "N", default_value_t = 5)]
        round_limit: usize,
    },

    /// Serve the web UI
    Web {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// List the available tools
    Tools {
        /// Include tools from this MCP servers config
        #[arg(long, value_name = "PATH")]
        mcp_config: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequirementsMode {
    Cli,
    Web,
}
