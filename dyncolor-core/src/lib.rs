//! Core of the dyncolor image loader.
//!
//! A URL submission flows through a small state machine: it is validated,
//! fetched and decoded under a deadline, and the outcome is published as a
//! [`LoadState`] transition to a single observer stream. A loaded image can
//! then be handed to a [`ThemeDeriver`] to produce a content-based
//! [`ColorScheme`].
//!
//! Notes
//! - The UI side is not part of this crate; it only consumes transitions.
//! - [`RequestExecutor`] is the seam for the fetch/decode backend; the
//!   default is [`HttpExecutor`].

pub mod config;
pub mod deadline;
pub mod error;
pub mod fetch;
pub mod machine;
pub mod state;
pub mod theme;

pub use config::{ConfigError, ConfigSource, LoaderConfig};
pub use deadline::{DeadlineGuard, GuardOutcome, with_timeout};
pub use error::{ErrorKind, FetchError, LoadError};
pub use fetch::{HttpExecutor, LoadedImage, RequestExecutor};
pub use machine::ImageLoadMachine;
pub use state::{LoadState, LoadStateStream, StatePublisher};
pub use theme::{
    Brightness, ColorScheme, ContentThemeDeriver, HarmonyMode, Rgb,
    ThemeDeriver,
};
