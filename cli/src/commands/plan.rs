//! `masterless plan`: show what `apply` would do without connecting.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::plan::plan;
use crate::output::json;

/// Run `masterless plan`.
///
/// # Errors
///
/// Returns a [`crate::domain::ConfigError`] if the config is invalid.
pub async fn run(app: &AppContext) -> Result<()> {
    let config = app.load_config()?;
    let plan = plan(&app.fs, &config).await?;

    if app.is_json() {
        json::print(&plan)
    } else {
        app.renderer().render_plan(&plan);
        Ok(())
    }
}
