//! Terminal rendering of the screen model

use std::io::{self, Write};

use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use dyncolor_core::{ColorScheme, LoadedImage, Rgb};
use image::imageops::FilterType;

use crate::screen::{Placeholder, Screen};

const SPINNER: [char; 8] = ['⣾', '⣽', '⣻', '⢿', '⡿', '⣟', '⣯', '⣷'];
const BROKEN_IMAGE: &str = "[ broken image ]";

/// Preview size in terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewSize {
    pub columns: u32,
    pub rows: u32,
}

impl Default for PreviewSize {
    fn default() -> Self {
        Self {
            columns: 48,
            rows: 16,
        }
    }
}

fn term_color(color: Rgb) -> Color {
    let [r, g, b] = color.0;
    Color::Rgb { r, g, b }
}

/// Black or white, whichever reads better on `background`
fn ink_for(background: Rgb) -> Rgb {
    if background.contrast_ratio(Rgb::BLACK)
        >= background.contrast_ratio(Rgb::WHITE)
    {
        Rgb::BLACK
    } else {
        Rgb::WHITE
    }
}

/// Draws the screen to any writer
#[derive(Debug, Default)]
pub struct Renderer {
    pub preview: PreviewSize,
    frame: usize,
}

impl Renderer {
    pub fn new(preview: PreviewSize) -> Self {
        Self { preview, frame: 0 }
    }

    /// Full redraw of image area, palette, toast and button.
    pub fn draw<W: Write>(
        &mut self,
        out: &mut W,
        screen: &Screen,
    ) -> io::Result<()> {
        let (surface, on_surface) = screen.surface_colors();

        queue!(out, Print("\r\n"))?;
        match &screen.placeholder {
            Placeholder::Empty => {}
            Placeholder::Progress => self.draw_spinner(out, screen)?,
            Placeholder::Image(image) => self.draw_image(out, image)?,
            Placeholder::BrokenImage => {
                queue!(
                    out,
                    SetBackgroundColor(term_color(surface)),
                    SetForegroundColor(term_color(on_surface)),
                    Print(BROKEN_IMAGE),
                    ResetColor,
                    Print("\r\n"),
                )?;
            }
        }

        if let (Placeholder::Image(_), Some(scheme)) =
            (&screen.placeholder, &screen.scheme)
        {
            draw_palette(out, scheme)?;
        }

        if let Some(toast) = &screen.toast {
            queue!(
                out,
                SetBackgroundColor(term_color(on_surface)),
                SetForegroundColor(term_color(surface)),
                Print(format!(" {} ", toast.message)),
                ResetColor,
                Print("\r\n"),
            )?;
        }

        if !screen.is_loading() {
            draw_button(out, screen)?;
        }

        out.flush()
    }

    /// Redraw only the spinner line in place.
    pub fn tick<W: Write>(
        &mut self,
        out: &mut W,
        screen: &Screen,
    ) -> io::Result<()> {
        if !screen.is_loading() {
            return Ok(());
        }
        queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        self.draw_spinner(out, screen)?;
        out.flush()
    }

    fn draw_spinner<W: Write>(
        &mut self,
        out: &mut W,
        screen: &Screen,
    ) -> io::Result<()> {
        let (_, on_surface) = screen.surface_colors();
        let accent = screen
            .scheme
            .as_ref()
            .map(|scheme| scheme.primary)
            .unwrap_or(on_surface);
        let glyph = SPINNER[self.frame % SPINNER.len()];
        self.frame = self.frame.wrapping_add(1);

        queue!(
            out,
            SetForegroundColor(term_color(accent)),
            Print(format!("{glyph} loading…")),
            ResetColor,
        )
    }

    fn draw_image<W: Write>(
        &self,
        out: &mut W,
        image: &LoadedImage,
    ) -> io::Result<()> {
        for line in half_block_rows(image, self.preview) {
            for (top, bottom) in line {
                queue!(
                    out,
                    SetForegroundColor(term_color(top)),
                    SetBackgroundColor(term_color(bottom)),
                    Print('▀'),
                )?;
            }
            queue!(out, ResetColor, Print("\r\n"))?;
        }

        let (width, height) = image.dimensions();
        queue!(
            out,
            Print(format!("{} ({width}x{height})\r\n", image.source)),
        )
    }
}

/// Downscale an image to fit `size` and pair up pixel rows, one terminal
/// cell per (top, bottom) pair. Transparent pixels come out black.
pub fn half_block_rows(
    image: &LoadedImage,
    size: PreviewSize,
) -> Vec<Vec<(Rgb, Rgb)>> {
    let fitted = image
        .pixels
        .resize(size.columns, size.rows * 2, FilterType::Triangle)
        .to_rgba8();

    let pixel = |x: u32, y: u32| {
        if y >= fitted.height() {
            return Rgb::BLACK;
        }
        let [r, g, b, a] = fitted.get_pixel(x, y).0;
        let scale = |c: u8| ((c as u16 * a as u16) / 255) as u8;
        Rgb([scale(r), scale(g), scale(b)])
    };

    (0..fitted.height())
        .step_by(2)
        .map(|y| {
            (0..fitted.width())
                .map(|x| (pixel(x, y), pixel(x, y + 1)))
                .collect()
        })
        .collect()
}

fn draw_palette<W: Write>(out: &mut W, scheme: &ColorScheme) -> io::Result<()> {
    for (name, color) in scheme.roles() {
        queue!(
            out,
            SetBackgroundColor(term_color(color)),
            SetForegroundColor(term_color(ink_for(color))),
            Print(format!(" {color} ")),
            ResetColor,
            Print(format!(" {name}\r\n")),
        )?;
    }
    Ok(())
}

fn draw_button<W: Write>(out: &mut W, screen: &Screen) -> io::Result<()> {
    let button = &screen.button;
    queue!(
        out,
        Print("\r\n"),
        SetBackgroundColor(term_color(button.container)),
        SetForegroundColor(term_color(button.content)),
        Print(format!("  {}  ", button.label)),
        ResetColor,
        Print("\r\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dyncolor_core::{
        Brightness, ContentThemeDeriver, LoadError, LoadState, ThemeDeriver,
    };
    use image::{DynamicImage, ImageBuffer, Rgba};

    fn loaded(width: u32, height: u32) -> LoadedImage {
        let px = ImageBuffer::from_fn(width, height, |_, y| {
            if y < height / 2 {
                Rgba([255u8, 0, 0, 255])
            } else {
                Rgba([0u8, 0, 255, 255])
            }
        });
        LoadedImage::new("mem://split", DynamicImage::ImageRgba8(px), 0)
    }

    fn render(screen: &Screen) -> String {
        let mut out = Vec::new();
        Renderer::default().draw(&mut out, screen).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn half_blocks_pair_rows() {
        let size = PreviewSize {
            columns: 4,
            rows: 2,
        };
        let rows = half_block_rows(&loaded(4, 4), size);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 4);
        assert_eq!(rows[0][0].0, Rgb([255, 0, 0]));
        assert_eq!(rows[1][0].1, Rgb([0, 0, 255]));
    }

    #[test]
    fn swatch_ink_follows_contrast() {
        assert_eq!(ink_for(Rgb([250, 250, 240])), Rgb::BLACK);
        assert_eq!(ink_for(Rgb([20, 20, 60])), Rgb::WHITE);
    }

    #[test]
    fn error_screen_shows_icon_and_toast() {
        let mut screen = Screen::new();
        screen.apply(&LoadState::Error(LoadError::EmptyInput), None);

        let text = render(&screen);
        assert!(text.contains(BROKEN_IMAGE));
        assert!(text.contains("URL cannot be empty"));
        assert!(text.contains(" + "));
    }

    #[test]
    fn success_screen_lists_palette() {
        let image = loaded(8, 8);
        let scheme = ContentThemeDeriver::new(Brightness::Light).derive(&image);
        let mut screen = Screen::new();
        screen.apply(&LoadState::Success(image), Some(scheme));

        let text = render(&screen);
        assert!(text.contains("mem://split (8x8)"));
        assert!(text.contains("primary"));
        assert!(text.contains(&scheme.primary.to_string()));
    }

    #[test]
    fn loading_screen_hides_button() {
        let mut screen = Screen::new();
        screen.apply(&LoadState::Loading, None);

        let text = render(&screen);
        assert!(text.contains("loading"));
        assert!(!text.contains(" + "));
    }

    #[test]
    fn tick_is_noop_when_not_loading() {
        let mut out = Vec::new();
        Renderer::default().tick(&mut out, &Screen::new()).unwrap();
        assert!(out.is_empty());
    }
}
