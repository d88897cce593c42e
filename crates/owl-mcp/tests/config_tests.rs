use std::time::Duration;

use owl_mcp::{McpConfig, McpError, McpToolkitManager, ServerTransport};
use pretty_assertions::assert_eq;

const SAMPLE: &str = r#"{
    "mcpServers": {
        "playwright": {
            "command": "npx",
            "args": ["-y", "@executeautomation/playwright-mcp-server"],
            "env": {"DISPLAY": ":1"}
        },
        "filesystem": {
            "command": "npx",
            "args": ["-y", "@modelcontextprotocol/server-filesystem", "/tmp"],
            "timeout": 30
        }
    },
    "mcpWebServers": {
        "remote": {"url": "http://localhost:8931/mcp", "timeout": 2.5}
    }
}"#;

#[test]
fn test_parse_stdio_and_web_servers() {
    let config = McpConfig::parse(SAMPLE).unwrap();
    let servers = config.servers().unwrap();
    let names: Vec<&str> = servers.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["filesystem", "playwright", "remote"]);

    match &servers[1].transport {
        ServerTransport::Stdio { command, args, env } => {
            assert_eq!(command, "npx");
            assert_eq!(args.len(), 2);
            assert_eq!(env.get("DISPLAY").map(String::as_str), Some(":1"));
        }
        other => panic!("unexpected transport {:?}", other),
    }
    assert_eq!(servers[0].timeout, Some(Duration::from_secs(30)));
    assert_eq!(servers[1].timeout, None);
    assert_eq!(
        servers[2].transport,
        ServerTransport::Http { url: "http://localhost:8931/mcp".to_string() }
    );
    assert_eq!(servers[2].timeout, Some(Duration::from_millis(2500)));
}

#[test]
fn test_empty_config_has_no_servers() {
    let config = McpConfig::parse("{}").unwrap();
    assert!(config.servers().unwrap().is_empty());
}

#[test]
fn test_missing_command_is_invalid() {
    let config = McpConfig::parse(r#"{"mcpServers": {"broken": {"args": ["x"]}}}"#).unwrap();
    let err = config.servers().unwrap_err();
    assert!(matches!(err, McpError::InvalidConfig(ref msg) if msg.contains("broken")));
}

#[test]
fn test_missing_url_is_invalid() {
    let config = McpConfig::parse(r#"{"mcpWebServers": {"web": {"url": "  "}}}"#).unwrap();
    assert!(matches!(config.servers(), Err(McpError::InvalidConfig(_))));
}

#[test]
fn test_non_positive_timeout_is_invalid() {
    let config = McpConfig::parse(r#"{"mcpServers": {"s": {"command": "x", "timeout": 0}}}"#).unwrap();
    assert!(matches!(config.servers(), Err(McpError::InvalidConfig(_))));
}

#[test]
fn test_malformed_json() {
    assert!(matches!(McpConfig::parse("{not json"), Err(McpError::Parse(_))));
}

#[test]
fn test_manager_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mcp_servers_config.json");
    std::fs::write(&path, SAMPLE).unwrap();

    let manager = McpToolkitManager::from_config(&path).unwrap();
    assert_eq!(manager.servers().len(), 3);
    assert!(!manager.is_connected());
}

#[test]
fn test_manager_from_missing_file() {
    let err = McpToolkitManager::from_config("/nonexistent/mcp.json").unwrap_err();
    assert!(matches!(err, McpError::ReadConfig { .. }));
}
