//! Application wiring: configuration, the load machine and the screen.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dyncolor_core::{
    Brightness, ColorScheme, ConfigSource, ContentThemeDeriver, HttpExecutor,
    ImageLoadMachine, LoadState, LoadStateStream, LoadedImage, LoaderConfig,
    RequestExecutor, ThemeDeriver,
};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::prompt::{self, DialogChoice};
use crate::render::{PreviewSize, Renderer};
use crate::screen::Screen;

const SPINNER_INTERVAL: Duration = Duration::from_millis(120);

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub loader: LoaderConfig,
    pub source: ConfigSource,
    pub json: bool,
    pub preview: PreviewSize,
}

impl AppConfig {
    pub fn new(loader: LoaderConfig) -> Self {
        Self {
            loader,
            source: ConfigSource::Default,
            json: false,
            preview: PreviewSize::default(),
        }
    }

    /// Resolve the loader configuration from an explicit file, or from the
    /// environment when none is given.
    pub fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let (loader, source) = match path {
            Some(path) => {
                let loader = LoaderConfig::load_from_file(&path).with_context(
                    || format!("loading config from {}", path.display()),
                )?;
                (loader, ConfigSource::File(path))
            }
            None => LoaderConfig::load_from_env()
                .context("loading config from environment")?,
        };
        Ok(Self {
            source,
            ..Self::new(loader)
        })
    }

    pub fn with_deadline_ms(mut self, deadline_ms: Option<u64>) -> Self {
        if let Some(ms) = deadline_ms {
            self.loader.deadline_ms = ms;
        }
        self
    }

    pub fn with_dark(mut self, dark: bool) -> Self {
        if dark {
            self.loader.brightness = Brightness::Dark;
        }
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn deriver(&self) -> ContentThemeDeriver {
        ContentThemeDeriver::new(self.loader.brightness)
            .with_harmony(self.loader.harmony)
    }
}

/// One line of batch output
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub url: String,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<ColorScheme>,
}

impl LoadReport {
    fn new(url: &str, state: &LoadState, screen: &Screen) -> Self {
        let image = state.image();
        let error = state.error();
        Self {
            url: url.to_string(),
            state: state.label(),
            width: image.map(|image| image.width()),
            height: image.map(|image| image.height()),
            error: error.map(|err| err.kind().to_string()),
            message: error.map(|err| err.user_message()),
            scheme: image.and(screen.scheme),
        }
    }
}

pub struct App {
    machine: ImageLoadMachine,
    stream: LoadStateStream,
    deriver: Arc<dyn ThemeDeriver>,
    screen: Screen,
    renderer: Renderer,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("machine", &self.machine)
            .field("screen", &self.screen)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Build the app with the HTTP executor described by `config`.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let executor = HttpExecutor::new(&config.loader)
            .context("building http executor")?;
        Ok(Self::new(Arc::new(executor), Arc::new(config.deriver()), config))
    }

    pub fn new(
        executor: Arc<dyn RequestExecutor>,
        deriver: Arc<dyn ThemeDeriver>,
        config: &AppConfig,
    ) -> Self {
        let (machine, stream) =
            ImageLoadMachine::spawn(executor, config.loader.deadline_guard());
        Self {
            machine,
            stream,
            deriver,
            screen: Screen::new(),
            renderer: Renderer::new(config.preview),
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Submit `url` and react to every transition until the load settles.
    pub async fn load<W: Write>(
        &mut self,
        url: &str,
        out: &mut W,
    ) -> anyhow::Result<LoadState> {
        self.machine.submit(url);

        let mut spinner = tokio::time::interval(SPINNER_INTERVAL);
        spinner.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let next = tokio::select! {
                biased;
                next = self.stream.next() => next,
                _ = spinner.tick() => {
                    self.renderer.tick(out, &self.screen)?;
                    continue;
                }
            };

            let Some(state) = next else {
                anyhow::bail!("load machine stopped");
            };
            debug!(state = state.label(), "transition");

            let scheme = match state.image() {
                Some(image) => Some(self.derive_scheme(image).await?),
                None => None,
            };
            self.screen.apply(&state, scheme);
            self.renderer.draw(out, &self.screen)?;

            if state.is_terminal() {
                return Ok(state);
            }
        }
    }

    /// Seed extraction walks the pixels, so it runs on the blocking pool.
    async fn derive_scheme(
        &self,
        image: &LoadedImage,
    ) -> anyhow::Result<ColorScheme> {
        let deriver = Arc::clone(&self.deriver);
        let image = image.clone();
        tokio::task::spawn_blocking(move || deriver.derive(&image))
            .await
            .context("theme derivation task failed")
    }

    /// Load each URL in order. With `json` set, one report per line goes to
    /// `out` instead of the rendered screen.
    pub async fn run_batch<W: Write>(
        &mut self,
        urls: &[String],
        json: bool,
        out: &mut W,
    ) -> anyhow::Result<Vec<LoadReport>> {
        let mut reports = Vec::with_capacity(urls.len());
        for url in urls {
            let state = if json {
                self.load(url, &mut io::sink()).await?
            } else {
                self.load(url, out).await?
            };
            let report = LoadReport::new(url, &state, &self.screen);
            if json {
                serde_json::to_writer(&mut *out, &report)?;
                writeln!(out)?;
            }
            reports.push(report);
        }
        out.flush()?;
        Ok(reports)
    }

    /// Prompt for URLs until the user cancels.
    pub async fn run_interactive<W: Write>(
        &mut self,
        out: &mut W,
    ) -> anyhow::Result<()> {
        self.renderer.draw(out, &self.screen)?;

        loop {
            let choice = tokio::task::spawn_blocking(prompt::ask)
                .await
                .context("url dialog task failed")??;

            match choice {
                DialogChoice::Cancel => {
                    info!("dialog cancelled");
                    break;
                }
                DialogChoice::Load(url) => {
                    self.load(&url, out).await?;
                }
            }
        }

        Ok(())
    }

    pub fn shutdown(&self) {
        self.machine.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_apply_on_top_of_loaded_config() {
        let config = AppConfig::new(LoaderConfig::default())
            .with_deadline_ms(Some(2_500))
            .with_dark(true)
            .with_json(true);

        assert_eq!(config.loader.deadline_ms, 2_500);
        assert_eq!(config.loader.brightness, Brightness::Dark);
        assert_eq!(config.deriver().brightness, Brightness::Dark);
        assert!(config.json);
    }

    #[test]
    fn absent_overrides_keep_config() {
        let config = AppConfig::new(LoaderConfig::default())
            .with_deadline_ms(None)
            .with_dark(false);

        assert_eq!(config.loader, LoaderConfig::default());
    }

    #[test]
    fn explicit_config_file_is_recorded_as_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dyncolor.toml");
        std::fs::write(&path, "deadline_ms = 750\n").unwrap();

        let config = AppConfig::load(Some(path.clone())).unwrap();
        assert_eq!(config.loader.deadline_ms, 750);
        assert_eq!(config.source, ConfigSource::File(path));
    }
}
