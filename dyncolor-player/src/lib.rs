//! Terminal front end for dyncolor.
//!
//! The screen reacts to load transitions from `dyncolor-core`: a spinner
//! while loading, the image and a derived palette on success, a broken-image
//! icon and a toast on failure.

pub mod app;
pub mod prompt;
pub mod render;
pub mod screen;

pub use app::{App, AppConfig, LoadReport};
pub use screen::{ActionButton, Placeholder, Screen, Toast};
