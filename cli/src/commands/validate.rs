//! `masterless validate`: check the config file and every local path.

use std::error::Error as _;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::validate::validate_paths;
use crate::domain::ConfigError;
use crate::output::json;

/// Run `masterless validate`.
///
/// Every path problem is reported, not just the first.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the config cannot be loaded or any path is
/// invalid.
pub async fn run(app: &AppContext) -> Result<()> {
    let config = app.load_config()?;
    let errors = validate_paths(&app.fs, &config).await;
    let messages: Vec<String> = errors.iter().map(describe).collect();

    if app.is_json() {
        json::print(&serde_json::json!({
            "valid": errors.is_empty(),
            "errors": messages,
        }))?;
    } else {
        for message in &messages {
            app.output.error(message);
        }
    }

    if errors.is_empty() {
        app.output
            .success(&format!("{} is valid", app.config_store.path().display()));
        return Ok(());
    }
    Err(ConfigError::Invalid {
        count: errors.len(),
    }
    .into())
}

/// `error: cause: cause` on one line.
fn describe(err: &ConfigError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
