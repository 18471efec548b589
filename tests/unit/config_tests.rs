use std::io::Write;

use reaction_issues::models::rule::Rule;
use reaction_issues::{config::GlobalConfig, AppError};

fn sample_toml() -> &'static str {
    r#"
success_reaction = "heavy_check_mark"

[github]
api_base_url = "https://github.example.com/api/v3/"
user_agent = "reaction-issues-test"

[[rules]]
reaction_name = "evergreen_tree"
github_repository = "org/handbook"
channel_name = "handbook"

[[rules]]
reaction_name = "evergreen_tree"
github_repository = "org/handbook"

[[rules]]
reaction_name = "smiley"
github_repository = "org/hub"
"#
}

fn with_rules(rules: &str) -> String {
    format!("success_reaction = \"heavy_check_mark\"\n{rules}")
}

#[test]
fn parses_valid_config() {
    let config = GlobalConfig::from_toml_str(sample_toml()).expect("config parses");

    assert_eq!(config.success_reaction, "heavy_check_mark");
    assert_eq!(config.rules.len(), 3);
    assert_eq!(
        config.rules[0],
        Rule::new("evergreen_tree", "org/handbook").in_channel("handbook")
    );
    assert_eq!(config.rules[2], Rule::new("smiley", "org/hub"));
    assert_eq!(
        config.github.api_base_url,
        "https://github.example.com/api/v3",
        "trailing slash is trimmed"
    );
    assert_eq!(config.github.user_agent, "reaction-issues-test");
}

#[test]
fn rule_order_is_preserved() {
    let config = GlobalConfig::from_toml_str(sample_toml()).expect("config parses");
    let reactions: Vec<_> = config
        .rules
        .iter()
        .map(|rule| (rule.reaction_name.as_str(), rule.channel_name.as_deref()))
        .collect();
    assert_eq!(
        reactions,
        vec![
            ("evergreen_tree", Some("handbook")),
            ("evergreen_tree", None),
            ("smiley", None),
        ]
    );
}

#[test]
fn github_defaults_apply_when_section_missing() {
    let toml = with_rules(
        r#"
[[rules]]
reaction_name = "smiley"
github_repository = "org/hub"
"#,
    );
    let config = GlobalConfig::from_toml_str(&toml).expect("config parses");

    assert_eq!(config.github.api_base_url, "https://api.github.com");
    assert!(config.github.user_agent.starts_with("reaction-issues/"));
    assert!(config.github.token.is_empty(), "token is never read from TOML");
    assert!(config.slack.bot_token.is_empty());
}

#[test]
fn colons_and_hashes_are_normalized() {
    let toml = r##"
success_reaction = ":heavy_check_mark:"

[[rules]]
reaction_name = ":smiley:"
github_repository = " org/hub "
channel_name = "#general"
"##;
    let config = GlobalConfig::from_toml_str(toml).expect("config parses");

    assert_eq!(config.success_reaction, "heavy_check_mark");
    assert_eq!(
        config.rules[0],
        Rule::new("smiley", "org/hub").in_channel("general")
    );
}

#[test]
fn rejects_empty_rules() {
    let toml = "success_reaction = \"heavy_check_mark\"\nrules = []\n";
    let err = GlobalConfig::from_toml_str(toml).expect_err("empty rules rejected");
    assert!(matches!(err, AppError::Config(ref msg) if msg.contains("rules must not be empty")));
}

#[test]
fn rejects_missing_rules() {
    let err = GlobalConfig::from_toml_str("success_reaction = \"heavy_check_mark\"\n")
        .expect_err("missing rules rejected");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn rejects_empty_success_reaction() {
    let toml = r#"
success_reaction = "::"

[[rules]]
reaction_name = "smiley"
github_repository = "org/hub"
"#;
    let err = GlobalConfig::from_toml_str(toml).expect_err("empty marker rejected");
    assert!(err.to_string().contains("success_reaction must not be empty"));
}

#[test]
fn rejects_rule_without_reaction_name() {
    let toml = with_rules(
        r#"
[[rules]]
reaction_name = ""
github_repository = "org/hub"
"#,
    );
    let err = GlobalConfig::from_toml_str(&toml).expect_err("empty reaction rejected");
    assert!(err.to_string().contains("rules[0].reaction_name"));
}

#[test]
fn rejects_malformed_repository() {
    for repository in ["hub", "org/", "/hub", "org/hub/extra", "org hub/x"] {
        let toml = with_rules(&format!(
            "[[rules]]\nreaction_name = \"smiley\"\ngithub_repository = \"{repository}\"\n"
        ));
        let err = GlobalConfig::from_toml_str(&toml)
            .expect_err("malformed repository rejected");
        assert!(
            err.to_string().contains("github_repository must be"),
            "unexpected error for {repository}: {err}"
        );
    }
}

#[test]
fn rejects_blank_channel_name() {
    let toml = with_rules(
        r#"
[[rules]]
reaction_name = "smiley"
github_repository = "org/hub"
channel_name = " "
"#,
    );
    let err = GlobalConfig::from_toml_str(&toml).expect_err("blank channel rejected");
    assert!(err.to_string().contains("rules[0].channel_name"));
}

#[test]
fn rejects_duplicate_rules() {
    let toml = with_rules(
        r#"
[[rules]]
reaction_name = "smiley"
github_repository = "org/hub"

[[rules]]
reaction_name = "smiley"
github_repository = "org/other"
"#,
    );
    let err = GlobalConfig::from_toml_str(&toml).expect_err("duplicate rejected");
    assert!(err.to_string().contains("rules[1] duplicates an earlier rule"));
}

#[test]
fn same_reaction_in_different_channels_is_allowed() {
    let toml = with_rules(
        r#"
[[rules]]
reaction_name = "smiley"
github_repository = "org/hub"
channel_name = "general"

[[rules]]
reaction_name = "smiley"
github_repository = "org/other"
channel_name = "random"
"#,
    );
    let config = GlobalConfig::from_toml_str(&toml).expect("config parses");
    assert_eq!(config.rules.len(), 2);
}

#[test]
fn rejects_unknown_keys() {
    let toml = with_rules(
        r#"
[[rules]]
reaction_name = "smiley"
github_repository = "org/hub"
channel = "general"
"#,
    );
    let err = GlobalConfig::from_toml_str(&toml).expect_err("unknown key rejected");
    assert!(err.to_string().starts_with("config: invalid config:"));
}

#[test]
fn rejects_non_http_api_base_url() {
    let toml = with_rules(
        r#"
[github]
api_base_url = "ftp://github.example.com"

[[rules]]
reaction_name = "smiley"
github_repository = "org/hub"
"#,
    );
    let err = GlobalConfig::from_toml_str(&toml).expect_err("bad base url rejected");
    assert!(err.to_string().contains("api_base_url"));
}

#[test]
fn loads_from_path() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(sample_toml().as_bytes()).expect("write config");

    let config = GlobalConfig::load_from_path(file.path()).expect("config loads");
    assert_eq!(config.rules.len(), 3);
}

#[test]
fn missing_file_is_config_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = GlobalConfig::load_from_path(dir.path().join("absent.toml"))
        .expect_err("missing file rejected");
    assert!(matches!(err, AppError::Config(ref msg) if msg.starts_with("failed to read config")));
}
