//! Loader for `jobscout.yaml` with environment overlays.
//!
//! Sources are merged in order (files, inline YAML, then `JOBSCOUT__*`
//! variables, e.g. `JOBSCOUT__SCROLL__MAX_SCROLLS=5`). After merging, every
//! string is run through `${VAR}` expansion. Every section has defaults, so an
//! empty configuration is valid and reproduces the stock behaviour: Azure
//! credentials from the environment, `new_resume.pdf` and `jobs.csv` in the
//! working directory, ten scroll attempts of 300px with a one second pause.
use config::{Config, Environment, File};
use jobscout_common::LlmConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// LinkedIn search the stock configuration starts from.
pub const DEFAULT_SEARCH_URL: &str = "https://www.linkedin.com/jobs/search/?distance=25&f_AL=true&f_WT=1%2C3&keywords=python%20developer&origin=JOB_SEARCH_PAGE_JOB_FILTER&refresh=true";

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Shape(#[from] serde_json::Error),
    #[error("could not render configuration: {0}")]
    Render(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobscoutConfig {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub resume: ResumeConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for JobscoutConfig {
    fn default() -> Self {
        Self {
            version: None,
            llm: LlmConfig::default(),
            browser: BrowserConfig::default(),
            resume: ResumeConfig::default(),
            store: StoreConfig::default(),
            scroll: ScrollConfig::default(),
            agent: AgentConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl JobscoutConfig {
    /// Render the effective configuration as YAML, API keys redacted.
    pub fn to_yaml(&self) -> Result<String, ConfigLoadError> {
        let shown = Self {
            llm: self.llm.redacted(),
            ..self.clone()
        };
        Ok(serde_yaml::to_string(&shown)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default)]
    pub headless: bool,
    /// Chrome executable to launch instead of the driver's default.
    #[serde(default)]
    pub chrome_binary: Option<String>,
    /// Adds `--disable-web-security`; needed by some application forms.
    #[serde(default)]
    pub disable_security: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: false,
            chrome_binary: None,
            disable_security: false,
        }
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeConfig {
    #[serde(default = "default_resume_path")]
    pub path: PathBuf,
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self {
            path: default_resume_path(),
        }
    }
}

impl ResumeConfig {
    /// Resolve the résumé path against `base` (normally the working directory).
    pub fn absolute_path(&self, base: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            base.join(&self.path)
        }
    }
}

fn default_resume_path() -> PathBuf {
    PathBuf::from("new_resume.pdf")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Skip appends whose link is already in the file.
    #[serde(default)]
    pub dedupe_by_link: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            dedupe_by_link: false,
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("jobs.csv")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    #[serde(default = "default_max_scrolls")]
    pub max_scrolls: u32,
    #[serde(default = "default_scroll_amount")]
    pub amount: i64,
    #[serde(default)]
    pub wait: WaitConfig,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            max_scrolls: default_max_scrolls(),
            amount: default_scroll_amount(),
            wait: WaitConfig::default(),
        }
    }
}

fn default_max_scrolls() -> u32 {
    10
}
fn default_scroll_amount() -> i64 {
    300
}

/// How the discovery loop waits for lazily rendered content after a scroll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum WaitConfig {
    Fixed {
        #[serde(default = "default_delay_ms")]
        delay_ms: u64,
    },
    Backoff {
        #[serde(default = "default_backoff_base_ms")]
        base_ms: u64,
        #[serde(default = "default_backoff_max_ms")]
        max_ms: u64,
        #[serde(default)]
        jitter: bool,
    },
    Readiness {
        #[serde(default = "default_poll_ms")]
        poll_ms: u64,
        #[serde(default = "default_delay_ms")]
        timeout_ms: u64,
    },
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::Fixed {
            delay_ms: default_delay_ms(),
        }
    }
}

fn default_delay_ms() -> u64 {
    1000
}
fn default_backoff_base_ms() -> u64 {
    250
}
fn default_backoff_max_ms() -> u64 {
    4000
}
fn default_poll_ms() -> u64 {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    /// Consecutive unusable model replies tolerated before giving up.
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
    #[serde(default = "default_tasks")]
    pub tasks: Vec<TaskSpec>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_failures: default_max_failures(),
            tasks: default_tasks(),
        }
    }
}

fn default_max_steps() -> u32 {
    100
}
fn default_max_failures() -> u32 {
    3
}
fn default_tasks() -> Vec<TaskSpec> {
    vec![TaskSpec {
        kind: TaskKind::Ground,
        target: Some(DEFAULT_SEARCH_URL.to_string()),
    }]
}

/// One agent to run: which prompt to use and where to point it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub kind: TaskKind,
    /// URL or company name appended to the prompt.
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Search boards for fitting postings and apply.
    Ground,
    /// Apply to the links already in the job store.
    Apply,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_emit_stderr")]
    pub emit_stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: default_log_format(),
            emit_stderr: default_emit_stderr(),
        }
    }
}

fn default_log_format() -> String {
    "text".into()
}
fn default_emit_stderr() -> bool {
    true
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct JobscoutConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: String,
}

impl Default for JobscoutConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl JobscoutConfigLoader {
    /// Start with no files; `JOBSCOUT__` variables are layered on at [`load`](Self::load).
    ///
    /// ```
    /// use jobscout_config::JobscoutConfigLoader;
    ///
    /// let config = JobscoutConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nscroll:\n  max_scrolls: 4")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.scroll.max_scrolls, 4);
    /// assert_eq!(config.scroll.amount, 300);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env_prefix: "JOBSCOUT".into(),
        }
    }

    /// Use a different environment prefix (tests isolate themselves this way).
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Attach a required YAML/TOML/JSON file; format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use jobscout_config::{JobscoutConfigLoader, TaskKind};
    ///
    /// let cfg = JobscoutConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// agent:
    ///   tasks:
    ///     - kind: apply
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.agent.tasks.len(), 1);
    /// assert_eq!(cfg.agent.tasks[0].kind, TaskKind::Apply);
    /// assert_eq!(cfg.agent.max_steps, 100);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// ```
    /// use jobscout_common::LlmConfig;
    /// use jobscout_config::JobscoutConfigLoader;
    ///
    /// unsafe { std::env::set_var("JS_DOC_KEY", "injected-from-env"); }
    ///
    /// let config = JobscoutConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// llm:
    ///   provider: openai
    ///   model: gpt-4o
    ///   api_key: "${JS_DOC_KEY}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// match config.llm {
    ///     LlmConfig::Openai { api_key, model, base_url } => {
    ///         assert_eq!(api_key, "injected-from-env");
    ///         assert_eq!(model, "gpt-4o");
    ///         assert!(base_url.is_none());
    ///     }
    ///     other => panic!("expected OpenAI configuration, got {other:?}"),
    /// }
    ///
    /// unsafe { std::env::remove_var("JS_DOC_KEY"); }
    /// ```
    pub fn load(self) -> Result<JobscoutConfig, ConfigLoadError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        Ok(serde_json::from_value(v)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_nested_sections() {
        temp_env::with_vars(
            [("JS_CITY", Some("Oakdale")), ("JS_STATE", Some("NY"))],
            || {
                let mut v = json!({
                    "agent": { "tasks": [ { "kind": "ground", "target": "${JS_CITY}, ${JS_STATE}" } ] },
                    "scroll": { "max_scrolls": 3 }
                });
                expand_env_in_value(&mut v);
                assert_eq!(v["agent"]["tasks"][0]["target"], json!("Oakdale, NY"));
                assert_eq!(v["scroll"]["max_scrolls"], json!(3));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${JS_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${JS_DOES_NOT_EXIST}"));
    }

    #[test]
    fn wait_config_variants_parse() {
        let fixed: WaitConfig = serde_json::from_value(json!({"strategy": "fixed"})).unwrap();
        assert_eq!(fixed, WaitConfig::Fixed { delay_ms: 1000 });

        let backoff: WaitConfig =
            serde_json::from_value(json!({"strategy": "backoff", "jitter": true})).unwrap();
        assert_eq!(
            backoff,
            WaitConfig::Backoff {
                base_ms: 250,
                max_ms: 4000,
                jitter: true
            }
        );
    }

    #[test]
    fn resume_path_resolves_against_base() {
        let cfg = ResumeConfig::default();
        assert_eq!(
            cfg.absolute_path(Path::new("/home/me")),
            PathBuf::from("/home/me/new_resume.pdf")
        );

        let abs = ResumeConfig {
            path: PathBuf::from("/cv/me.pdf"),
        };
        assert_eq!(abs.absolute_path(Path::new("/ignored")), PathBuf::from("/cv/me.pdf"));
    }
}
