use docpoint::infrastructure::observability::{DEFAULT_FILTER, TracingConfig};

#[test]
fn given_blank_level_when_creating_config_then_uses_default_filter() {
    let config = TracingConfig::new("local", false, "  ");
    assert_eq!(config.default_filter, DEFAULT_FILTER);
    assert_eq!(config.environment, "local");
}

#[test]
fn given_explicit_level_when_creating_config_then_keeps_it() {
    let config = TracingConfig::new("prod", true, "warn,docpoint=info");
    assert_eq!(config.default_filter, "warn,docpoint=info");
    assert!(config.json_format);
}

#[test]
fn given_default_config_when_created_then_environment_is_set() {
    let config = TracingConfig::default();
    assert!(!config.environment.is_empty());
}
