use anyhow::{Context, Result};
use clap::Parser;
use futures::future::join_all;
use jobscout_actions::discover::DiscoverySettings;
use jobscout_actions::{ActionContext, Controller, JobActionDeps, JobStore};
use jobscout_common::observability::{LogConfig, LogFormat, init_logging};
use jobscout_config::{JobscoutConfig, JobscoutConfigLoader, TaskKind, TaskSpec};
use jobscout_drivers::{JobscoutDriver, LaunchOptions};
use jobscout_llm::ensure_llm_ready;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use agent::{AgentDriver, LlmAgent};

mod agent;
mod tasks;

#[derive(Debug, Parser)]
#[command(name = "jobscout", about = "Let an LLM agent search and apply for jobs in a browser")]
struct Args {
    /// YAML config file; missing is fine.
    #[arg(long, default_value = "jobscout.yaml")]
    config: PathBuf,

    /// Agent to run, `ground[=URL or company]` or `apply`. Repeat for several
    /// concurrent agents; replaces `agent.tasks` from the config.
    #[arg(long = "task", value_parser = parse_task_arg)]
    tasks: Vec<TaskSpec>,

    #[arg(long)]
    headless: bool,

    /// Print the effective configuration and exit.
    #[arg(long)]
    print_config: bool,
}

fn parse_task_arg(raw: &str) -> Result<TaskSpec, String> {
    let (kind, target) = match raw.split_once('=') {
        Some((kind, target)) => (kind, Some(target.to_string())),
        None => (raw, None),
    };
    let kind = match kind.trim().to_ascii_lowercase().as_str() {
        "ground" => TaskKind::Ground,
        "apply" => TaskKind::Apply,
        other => return Err(format!("unknown task kind '{other}', expected ground or apply")),
    };
    Ok(TaskSpec { kind, target })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1) Load config (env wins)
    let mut cfg: JobscoutConfig = JobscoutConfigLoader::new()
        .with_optional_file(&args.config)
        .load()
        .with_context(|| format!("loading {}", args.config.display()))?;
    if args.headless {
        cfg.browser.headless = true;
    }
    if !args.tasks.is_empty() {
        cfg.agent.tasks = args.tasks.clone();
    }

    if args.print_config {
        print!("{}", cfg.to_yaml()?);
        return Ok(());
    }

    let log_path = init_logging(LogConfig {
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.emit_stderr,
        format: LogFormat::from_name(&cfg.logging.format),
        ..LogConfig::default()
    })?;
    info!(log = %log_path.display(), tasks = cfg.agent.tasks.len(), "jobscout starting");

    run(cfg).await
}

async fn run(cfg: JobscoutConfig) -> Result<()> {
    let cwd = std::env::current_dir().context("resolving working directory")?;
    let resume_path = cfg.resume.absolute_path(&cwd);
    if !resume_path.is_file() {
        // read_cv and upload_cv report this to the agent; keep going.
        error!(path = %resume_path.display(), "résumé not found");
    }

    let llm = ensure_llm_ready(&cfg.llm)?;
    let store = Arc::new(JobStore::new(&cfg.store.path).with_dedupe_by_link(cfg.store.dedupe_by_link));
    let controller = Controller::with_job_actions(JobActionDeps {
        store,
        resume_path,
        discovery: DiscoverySettings::from(&cfg.scroll),
    });

    let session = JobscoutDriver::connect(&LaunchOptions {
        webdriver_url: cfg.browser.webdriver_url.clone(),
        headless: cfg.browser.headless,
        chrome_binary: cfg.browser.chrome_binary.clone(),
        disable_security: cfg.browser.disable_security,
    })
    .await?;
    let ctx = ActionContext::with_browser(Arc::new(session.clone()));

    let agent = LlmAgent::new(llm)
        .with_max_steps(cfg.agent.max_steps)
        .with_max_failures(cfg.agent.max_failures);

    let prompts: Vec<String> = cfg.agent.tasks.iter().map(tasks::build_task).collect();
    let runs = join_all(
        prompts
            .iter()
            .map(|task| agent.run(task, &controller, &ctx)),
    )
    .await;

    for (i, run) in runs.into_iter().enumerate() {
        match run {
            Ok(run) => info!(
                agent = i,
                steps = run.steps,
                stop = ?run.stop,
                result = run.final_text.as_deref().unwrap_or(""),
                "agent finished"
            ),
            Err(e) => error!(agent = i, error = %format!("{e:#}"), "agent failed"),
        }
    }

    session.close().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_args_parse_kind_and_target() {
        assert_eq!(
            parse_task_arg("ground=Microsoft").unwrap(),
            TaskSpec {
                kind: TaskKind::Ground,
                target: Some("Microsoft".into())
            }
        );
        assert_eq!(parse_task_arg("apply").unwrap().kind, TaskKind::Apply);
        assert!(parse_task_arg("wander").is_err());
    }

    #[test]
    fn cli_collects_repeated_tasks() {
        let args = Args::parse_from([
            "jobscout",
            "--task",
            "apply",
            "--task",
            "ground=https://www.indeed.com/",
            "--headless",
        ]);
        assert_eq!(args.tasks.len(), 2);
        assert!(args.headless);
        assert_eq!(args.config, PathBuf::from("jobscout.yaml"));
    }
}
