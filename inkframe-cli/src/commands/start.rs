//! `inkframe start` — run the display daemon in the foreground.

use anyhow::{Context, Result};
use clap::Args;

use inkframe_core::Settings;
use inkframe_daemon::start_blocking;
use inkframe_renderer::{Renderer, TestCardRenderer};

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Renderer surface width in pixels.
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Renderer surface height in pixels.
    #[arg(long, default_value_t = 480)]
    pub height: u32,
}

impl StartArgs {
    pub fn run(self) -> Result<()> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        let settings = Settings::from_env().context("invalid environment settings")?;

        // The built-in test-card engine stands in for the external browsing
        // engine; deployments with a real surface plug their own `Renderer`
        // into `inkframe_daemon::run`.
        let engine: Box<dyn Renderer + Send> =
            Box::new(TestCardRenderer::new(self.width, self.height));

        start_blocking(&home, settings, engine).context("daemon exited with error")?;
        Ok(())
    }
}
