use jobscout_common::LlmConfig;
use jobscout_config::{JobscoutConfigLoader, TaskKind, WaitConfig};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();

    let file_yaml = r#"
version: "0.1"
llm:
  provider: azure
  api_key: "${JS_TEST_AZURE_KEY}"
  endpoint: "https://example.openai.azure.com"
store:
  path: saved.csv
  dedupe_by_link: true
scroll:
  max_scrolls: 6
  wait:
    strategy: readiness
    poll_ms: 50
agent:
  tasks:
    - kind: ground
      target: "https://www.indeed.com/"
    - kind: apply
"#;
    let p = write_yaml(&tmp, "jobscout.yaml", file_yaml);

    let config = temp_env::with_var("JS_TEST_AZURE_KEY", Some("secret"), || {
        JobscoutConfigLoader::new()
            .with_file(p)
            .load()
            .expect("load system config")
    });

    match &config.llm {
        LlmConfig::Azure {
            api_key, endpoint, ..
        } => {
            assert_eq!(api_key, "secret");
            assert_eq!(endpoint, "https://example.openai.azure.com");
        }
        other => panic!("unexpected llm config: {other:?}"),
    }
    assert!(config.store.dedupe_by_link);
    assert_eq!(config.scroll.max_scrolls, 6);
    assert_eq!(
        config.scroll.wait,
        WaitConfig::Readiness {
            poll_ms: 50,
            timeout_ms: 1000
        }
    );
    assert_eq!(config.agent.tasks.len(), 2);
    assert_eq!(config.agent.tasks[1].kind, TaskKind::Apply);
    assert_eq!(config.agent.tasks[1].target, None);
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "jobscout.yaml", "scroll:\n  max_scrolls: 6\n");

    let config = temp_env::with_var("JSTEST__SCROLL__MAX_SCROLLS", Some("2"), || {
        JobscoutConfigLoader::new()
            .with_env_prefix("JSTEST")
            .with_file(p)
            .load()
            .expect("load config")
    });

    assert_eq!(config.scroll.max_scrolls, 2);
}

#[test]
#[serial]
fn missing_optional_file_yields_defaults() {
    let tmp = TempDir::new().unwrap();

    let config = JobscoutConfigLoader::new()
        .with_env_prefix("JSTEST_EMPTY")
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults load");

    assert_eq!(config.store.path, PathBuf::from("jobs.csv"));
    assert!(!config.store.dedupe_by_link);
    assert_eq!(config.scroll.amount, 300);
    assert_eq!(config.browser.webdriver_url, "http://localhost:9515");
    assert_eq!(config.agent.tasks.len(), 1);
    assert_eq!(config.agent.tasks[0].kind, TaskKind::Ground);
}

#[test]
#[serial]
fn missing_azure_env_gives_empty_credentials() {
    let config = temp_env::with_vars_unset(["AZURE_OPENAI_KEY", "AZURE_OPENAI_ENDPOINT"], || {
        JobscoutConfigLoader::new()
            .with_env_prefix("JSTEST_EMPTY")
            .load()
            .expect("defaults load")
    });

    match config.llm {
        LlmConfig::Azure {
            api_key, endpoint, ..
        } => {
            assert!(api_key.is_empty());
            assert!(endpoint.is_empty());
        }
        other => panic!("unexpected llm config: {other:?}"),
    }
}

#[test]
fn effective_config_renders_as_yaml() {
    let config = JobscoutConfigLoader::new()
        .with_env_prefix("JSTEST_EMPTY")
        .with_yaml_str("llm:\n  provider: none\n")
        .load()
        .unwrap();
    let yaml = config.to_yaml().unwrap();
    assert!(yaml.contains("max_scrolls: 10"));
    assert!(yaml.contains("provider: none"));
}

#[test]
#[serial]
fn azure_credentials_come_from_env_when_yaml_omits_them() {
    let config = temp_env::with_vars(
        [
            ("AZURE_OPENAI_KEY", Some("env-key")),
            ("AZURE_OPENAI_ENDPOINT", Some("https://env.openai.azure.com")),
        ],
        || {
            JobscoutConfigLoader::new()
                .with_env_prefix("JSTEST_EMPTY")
                .with_yaml_str("llm:\n  provider: azure\n  deployment: gpt-4o-mini\n")
                .load()
                .expect("load config")
        },
    );

    match config.llm {
        LlmConfig::Azure {
            api_key,
            endpoint,
            deployment,
            ..
        } => {
            assert_eq!(api_key, "env-key");
            assert_eq!(endpoint, "https://env.openai.azure.com");
            assert_eq!(deployment, "gpt-4o-mini");
        }
        other => panic!("unexpected llm config: {other:?}"),
    }
}

#[test]
#[serial]
fn printed_config_does_not_leak_api_keys() {
    let config = temp_env::with_var("AZURE_OPENAI_KEY", Some("sk-very-secret"), || {
        JobscoutConfigLoader::new()
            .with_env_prefix("JSTEST_EMPTY")
            .load()
            .expect("defaults load")
    });
    let yaml = config.to_yaml().unwrap();
    assert!(!yaml.contains("sk-very-secret"), "{yaml}");
    assert!(yaml.contains("<redacted>"));

    let config = JobscoutConfigLoader::new()
        .with_env_prefix("JSTEST_EMPTY")
        .with_yaml_str("llm:\n  provider: openai\n  model: gpt-4o\n  api_key: sk-inline\n")
        .load()
        .unwrap();
    let yaml = config.to_yaml().unwrap();
    assert!(!yaml.contains("sk-inline"), "{yaml}");
    assert!(yaml.contains("model: gpt-4o"));
}
