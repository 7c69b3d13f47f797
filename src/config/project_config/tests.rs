use super::*;

#[test]
fn test_defaults() {
    let config = GateConfig::default();
    assert_eq!(
        config.severity.block_on,
        [Severity::Critical, Severity::Error].into_iter().collect()
    );
    assert!(config.severity.warn_on.is_empty());
    assert!(config.roles.use_defaults);
    assert!(config.complexity.conditionals);
    assert!(!config.complexity.nullish_coalescing);
    assert_eq!(config.suppression.prefix, "graphgate-");
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_toml() {
    let toml_src = r#"
workers = 4

[severity]
block_on = ["critical"]
warn_on = ["error", "warning"]

[roles]
patterns = [{ pattern = "src/http/**", role = "controller" }]

[complexity]
nullish_coalescing = true

[rules.complex-function]
severity = "critical"
thresholds = { max_complexity = 15 }

[rules.large-file]
enabled = false

[resolve]
aliases = { "@/" = "src/" }
"#;
    let config: GateConfig = toml::from_str(toml_src).expect("valid toml config");
    assert_eq!(config.workers, 4);
    assert_eq!(
        config.severity.block_on,
        [Severity::Critical].into_iter().collect()
    );
    assert!(config.severity.warn_on.contains(&Severity::Warning));
    assert_eq!(
        config.roles.patterns,
        vec![RolePattern::new("src/http/**", FileRole::Controller)]
    );
    assert!(config.complexity.nullish_coalescing);
    assert!(config.complexity.loops);
    assert_eq!(
        config.rules["complex-function"].severity,
        Some(Severity::Critical)
    );
    assert_eq!(
        config
            .rule_threshold("complex-function", "max_complexity")
            .and_then(|v| v.as_i64()),
        Some(15)
    );
    assert!(!config.rule_enabled("large-file"));
    assert!(config.rule_enabled("circular-dependency"));
    assert_eq!(config.resolve.aliases["@/"], "src/");
    // untouched sections keep their defaults
    assert_eq!(config.resolve.extensions[0], ".ts");
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_camel_case_json() {
    let json_src = r#"{
        "severity": { "blockOn": ["warning"], "warnOn": ["info"] },
        "roles": { "testRoots": ["spec"], "useDefaults": false }
    }"#;
    let config: GateConfig = serde_json::from_str(json_src).expect("valid json config");
    assert_eq!(
        config.severity.block_on,
        [Severity::Warning].into_iter().collect()
    );
    assert_eq!(config.roles.test_roots, vec!["spec".to_string()]);
    assert!(!config.roles.use_defaults);
}

#[test]
fn test_overlapping_severity_sets_are_invalid() {
    let mut config = GateConfig::default();
    config.severity.warn_on.insert(Severity::Error);
    let err = config.validate().expect_err("overlap must be rejected");
    assert!(matches!(err, GateError::InvalidConfig(msg) if msg.contains("error")));
}

#[test]
fn test_bad_extension_is_invalid() {
    let mut config = GateConfig::default();
    config.resolve.extensions = vec!["ts".to_string()];
    assert!(config.validate().is_err());
}

#[test]
fn test_unknown_severity_fails_to_parse() {
    let toml_src = "[severity]\nblock_on = [\"high\"]\n";
    assert!(toml::from_str::<GateConfig>(toml_src).is_err());
}

#[test]
fn test_effective_exclude_patterns() {
    let exclude = ExcludeConfig {
        paths: vec!["generated/".to_string(), "**/dist/**".to_string()],
        skip_defaults: false,
    };
    let patterns = exclude.effective_patterns();
    assert!(patterns.contains(&"generated/".to_string()));
    assert_eq!(
        patterns.iter().filter(|p| p.as_str() == "**/dist/**").count(),
        1
    );

    let only_user = ExcludeConfig {
        paths: vec!["generated/".to_string()],
        skip_defaults: true,
    };
    assert_eq!(only_user.effective_patterns(), vec!["generated/".to_string()]);
}

#[test]
fn test_load_project_config_from_dir() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(
        dir.path().join("graphgate.toml"),
        "[severity]\nblock_on = [\"critical\"]\n",
    )
    .expect("write config");
    let config = load_project_config(dir.path());
    assert_eq!(
        config.severity.block_on,
        [Severity::Critical].into_iter().collect()
    );
}

#[test]
fn test_malformed_project_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("graphgate.toml"), "workers = [").expect("write config");
    let config = load_project_config(dir.path());
    assert_eq!(config.workers, 0);
    assert!(load_config_file(&dir.path().join("graphgate.toml")).is_err());
}
