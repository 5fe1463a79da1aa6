use crate::browser::{behavioral::BehavioralEngine, page::FantocciniSession};
use anyhow::{Context, Result};
use fantoccini::ClientBuilder;
use serde_json::{json, Map, Value};
use tracing::info;
use webdriver::capabilities::Capabilities;

/// How to reach (and launch) the browser.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// WebDriver endpoint, e.g. Chromedriver on `http://localhost:9515`.
    pub webdriver_url: String,
    pub headless: bool,
    /// Chrome executable; the driver's default when `None`.
    pub chrome_binary: Option<String>,
    pub disable_security: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: false,
            chrome_binary: None,
            disable_security: false,
        }
    }
}

/// Connects to a WebDriver service and hands out the shared session.
pub struct JobscoutDriver;

impl JobscoutDriver {
    /// Open one browser session. The caller owns it and injects it into
    /// every agent that needs browser access.
    pub async fn connect(options: &LaunchOptions) -> Result<FantocciniSession> {
        let mut caps = Capabilities::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            Value::Object(chrome_options(options)),
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&options.webdriver_url)
            .await
            .with_context(|| format!("failed to reach WebDriver at {}", options.webdriver_url))?;
        info!(
            target: "browser.driver",
            url = %options.webdriver_url,
            headless = options.headless,
            "browser session started"
        );

        Ok(FantocciniSession::new(client, BehavioralEngine::new()))
    }
}

/// Chrome command-line arguments for the session.
pub fn chrome_arguments(options: &LaunchOptions) -> Vec<String> {
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--start-maximized".to_string(),
    ];
    if options.disable_security {
        args.push("--disable-web-security".to_string());
        args.push("--disable-site-isolation-trials".to_string());
    }
    if options.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    args
}

fn chrome_options(options: &LaunchOptions) -> Map<String, Value> {
    let mut opts = Map::new();
    opts.insert("args".to_string(), json!(chrome_arguments(options)));
    if let Some(binary) = &options.chrome_binary {
        opts.insert("binary".to_string(), json!(binary));
    }
    opts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_flags_only_when_requested() {
        let plain = chrome_arguments(&LaunchOptions::default());
        assert!(!plain.iter().any(|a| a == "--disable-web-security"));

        let loose = chrome_arguments(&LaunchOptions {
            disable_security: true,
            headless: true,
            ..LaunchOptions::default()
        });
        assert!(loose.iter().any(|a| a == "--disable-web-security"));
        assert!(loose.iter().any(|a| a == "--headless=new"));
    }

    #[test]
    fn binary_is_forwarded() {
        let opts = chrome_options(&LaunchOptions {
            chrome_binary: Some("C:/Program Files/Google/Chrome/Application/chrome.exe".into()),
            ..LaunchOptions::default()
        });
        assert_eq!(
            opts.get("binary").and_then(Value::as_str),
            Some("C:/Program Files/Google/Chrome/Application/chrome.exe")
        );
    }
}
