//! Screen model driven by load state transitions.
//!
//! The screen holds no transition logic of its own: every change comes from
//! [`Screen::apply`] reacting to a [`LoadState`] published by the core.
//! Deriving the scheme is pixel work, so callers do it off the UI task and
//! hand the result in.

use dyncolor_core::{ColorScheme, LoadState, LoadedImage, Rgb};

const BUTTON_LABEL: &str = "+";

/// Baseline colors used before any image has themed the screen
pub const BASELINE_PRIMARY: Rgb = Rgb([0x67, 0x50, 0xa4]);
pub const BASELINE_ON_PRIMARY: Rgb = Rgb([0xff, 0xff, 0xff]);
pub const BASELINE_SURFACE: Rgb = Rgb([0xfe, 0xf7, 0xff]);
pub const BASELINE_ON_SURFACE: Rgb = Rgb([0x1d, 0x1b, 0x20]);

/// What the image area shows
#[derive(Debug, Clone, Default)]
pub enum Placeholder {
    #[default]
    Empty,
    /// Indeterminate progress indicator
    Progress,
    Image(LoadedImage),
    /// Broken-image icon shown after any failure
    BrokenImage,
}

/// The button that opens the URL dialog.
///
/// It is owned by the screen and rebuilt after every theme change so its
/// colors come from the new scheme; `id` tells instances apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub id: u64,
    pub label: &'static str,
    pub container: Rgb,
    pub content: Rgb,
}

impl ActionButton {
    fn build(id: u64, scheme: Option<&ColorScheme>) -> Self {
        let (container, content) = match scheme {
            Some(scheme) => (scheme.primary, scheme.on_primary),
            None => (BASELINE_PRIMARY, BASELINE_ON_PRIMARY),
        };
        Self {
            id,
            label: BUTTON_LABEL,
            container,
            content,
        }
    }
}

/// Short-lived user message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
}

#[derive(Debug)]
pub struct Screen {
    pub placeholder: Placeholder,
    pub button: ActionButton,
    pub scheme: Option<ColorScheme>,
    pub toast: Option<Toast>,
    next_button_id: u64,
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen {
    pub fn new() -> Self {
        Self {
            placeholder: Placeholder::Empty,
            button: ActionButton::build(0, None),
            scheme: None,
            toast: None,
            next_button_id: 1,
        }
    }

    /// React to a state transition. `scheme` is the scheme derived from
    /// the image of a `Success` state; without one the theme stays as is.
    pub fn apply(&mut self, state: &LoadState, scheme: Option<ColorScheme>) {
        match state {
            LoadState::Idle => {}
            LoadState::Loading => {
                self.toast = None;
                self.placeholder = Placeholder::Progress;
            }
            LoadState::Success(image) => {
                self.toast = None;
                self.placeholder = Placeholder::Image(image.clone());
                if let Some(scheme) = scheme {
                    self.apply_theme(scheme);
                }
            }
            LoadState::Error(err) => {
                tracing::debug!(kind = %err.kind(), "showing error");
                self.placeholder = Placeholder::BrokenImage;
                self.toast = Some(Toast {
                    message: err.user_message().to_string(),
                });
            }
        }
    }

    fn apply_theme(&mut self, scheme: ColorScheme) {
        tracing::debug!(seed = %scheme.seed, "applying color scheme");
        self.scheme = Some(scheme);
        self.recreate_button();
    }

    fn recreate_button(&mut self) {
        let id = self.next_button_id;
        self.next_button_id += 1;
        self.button = ActionButton::build(id, self.scheme.as_ref());
    }

    /// Background and foreground for regular text
    pub fn surface_colors(&self) -> (Rgb, Rgb) {
        match &self.scheme {
            Some(scheme) => (scheme.surface, scheme.on_surface),
            None => (BASELINE_SURFACE, BASELINE_ON_SURFACE),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.placeholder, Placeholder::Progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dyncolor_core::{
        Brightness, ContentThemeDeriver, LoadError, ThemeDeriver,
    };
    use image::{DynamicImage, ImageBuffer, Rgba};

    fn image() -> LoadedImage {
        let px = ImageBuffer::from_pixel(3, 3, Rgba([30u8, 140, 70, 255]));
        LoadedImage::new("mem://img", DynamicImage::ImageRgba8(px), 0)
    }

    #[test]
    fn starts_with_baseline_button() {
        let screen = Screen::new();
        assert_eq!(screen.button.id, 0);
        assert_eq!(screen.button.container, BASELINE_PRIMARY);
        assert!(screen.scheme.is_none());
    }

    fn scheme_for(image: &LoadedImage) -> Option<ColorScheme> {
        Some(ContentThemeDeriver::new(Brightness::Light).derive(image))
    }

    #[test]
    fn idle_changes_nothing() {
        let mut screen = Screen::new();
        screen.apply(&LoadState::Idle, None);

        assert!(matches!(screen.placeholder, Placeholder::Empty));
        assert!(screen.toast.is_none());
    }

    #[test]
    fn loading_clears_previous_toast() {
        let mut screen = Screen::new();
        screen.apply(&LoadState::Error(LoadError::EmptyInput), None);
        screen.apply(&LoadState::Loading, None);

        assert!(screen.is_loading());
        assert!(screen.toast.is_none());
    }

    #[test]
    fn error_keeps_current_theme() {
        let loaded = image();
        let mut screen = Screen::new();
        screen.apply(&LoadState::Success(loaded.clone()), scheme_for(&loaded));
        let themed = screen.button.clone();

        screen.apply(&LoadState::Error(LoadError::EmptyInput), None);
        assert_eq!(screen.button, themed);
        assert!(screen.scheme.is_some());
    }

    #[test]
    fn success_recreates_button_in_scheme_colors() {
        let loaded = image();
        let scheme = scheme_for(&loaded);
        let mut screen = Screen::new();
        screen.apply(&LoadState::Success(loaded), scheme);

        let scheme = scheme.unwrap();
        assert_eq!(screen.button.id, 1);
        assert_eq!(screen.button.container, scheme.primary);
        assert_eq!(screen.button.content, scheme.on_primary);
        assert_eq!(
            screen.surface_colors(),
            (scheme.surface, scheme.on_surface)
        );
    }

    #[test]
    fn success_without_scheme_keeps_button() {
        let mut screen = Screen::new();
        screen.apply(&LoadState::Success(image()), None);

        assert!(matches!(screen.placeholder, Placeholder::Image(_)));
        assert_eq!(screen.button.id, 0);
        assert!(screen.scheme.is_none());
    }
}
