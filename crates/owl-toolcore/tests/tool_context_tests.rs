mod common;

use std::path::PathBuf;

use common::TestFixtures;
use owl_toolcore::ToolContext;

#[test]
fn test_context_creation() {
    let fixtures = TestFixtures::new();
    let context = fixtures.context();
    assert_eq!(context.work_dir, fixtures.temp_dir.path());
    assert_eq!(context.session_id, "test_session");
    assert!(context.environment.is_empty());
}

#[test]
fn test_context_env_takes_precedence() {
    let context = ToolContext::new(PathBuf::from("/tmp"), "s".to_string())
        .with_env("OWL_TOOLCORE_TEST_ONLY_VAR", "from-context");
    assert_eq!(
        context.env_var("OWL_TOOLCORE_TEST_ONLY_VAR").as_deref(),
        Some("from-context")
    );
    assert_eq!(context.env_var("OWL_TOOLCORE_UNSET_VAR_FOR_TEST"), None);
}

#[test]
fn test_context_empty_env_value_is_none() {
    let context = ToolContext::default().with_env("OWL_TOOLCORE_EMPTY", "");
    assert_eq!(context.env_var("OWL_TOOLCORE_EMPTY"), None);
}

#[test]
fn test_resolve_path() {
    let context = ToolContext::new(PathBuf::from("/work"), "s".to_string());
    assert_eq!(context.resolve_path("data/a.csv"), PathBuf::from("/work/data/a.csv"));
    assert_eq!(context.resolve_path("/abs/b.csv"), PathBuf::from("/abs/b.csv"));
}
