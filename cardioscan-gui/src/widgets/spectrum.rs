//! # Spectrum Widget
//!
//! Draws the power spectral density of the revealed signal as a bar chart.
//! The display is restricted to 0-500 Hz; the estimate it receives is the
//! full one-sided spectrum.
//!
//! ## Features
//! - Logarithmic power scaling
//! - Bars positioned by frequency, not by bin index
//! - Peak frequency caption

use cardioscan_core::SpectralEstimate;
use iced::widget::canvas::{self, Geometry, Path, Text};
use iced::widget::container;
use iced::{Color, Element, Point, Rectangle, Renderer, Size, Theme, mouse};

/// Upper edge of the displayed frequency range in Hz.
pub const DISPLAY_MAX_HZ: f64 = 500.0;

/// Small epsilon value to prevent log(0) errors in power calculations.
const EPSILON: f64 = 1e-12;

/// Dynamic range shown below the strongest bin, in decades.
const DECADES: f64 = 6.0;

/// Spectrum widget for displaying the latest Welch estimate.
pub struct Spectrum {
    estimate: SpectralEstimate,
}

impl Spectrum {
    /// Creates the widget from a full estimate, keeping only the display range.
    pub fn new(estimate: &SpectralEstimate) -> Self {
        Self {
            estimate: estimate.clipped(DISPLAY_MAX_HZ),
        }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fill),
        )
        .into()
    }
}

/// Maps a power value to a bar height fraction in `[0, 1]`.
fn log_height(power: f64, max_power: f64) -> f64 {
    let floor = (max_power + EPSILON).log10() - DECADES;
    (((power + EPSILON).log10() - floor) / DECADES).clamp(0.0, 1.0)
}

impl<Message> canvas::Program<Message> for Spectrum {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        if !bounds.width.is_finite() || !bounds.height.is_finite() || self.estimate.is_empty() {
            return vec![frame.into_geometry()];
        }

        let max_power = self.estimate.power.iter().fold(0.0f64, |max, &p| p.max(max));
        if max_power <= 0.0 {
            return vec![frame.into_geometry()];
        }

        let bin_width_hz = if self.estimate.len() > 1 {
            self.estimate.frequencies[1] - self.estimate.frequencies[0]
        } else {
            DISPLAY_MAX_HZ
        };
        let bar_width = ((bin_width_hz / DISPLAY_MAX_HZ) as f32 * bounds.width * 0.8).max(1.0);

        for (&freq, &power) in self.estimate.frequencies.iter().zip(&self.estimate.power) {
            let height = log_height(power, max_power) as f32 * (bounds.height - 20.0);
            if height.is_finite() && height > 0.0 {
                let x = (freq / DISPLAY_MAX_HZ) as f32 * bounds.width;
                let bar = Path::rectangle(
                    Point::new(x - bar_width / 2.0, bounds.height - height),
                    Size::new(bar_width, height),
                );
                frame.fill(&bar, Color::from_rgb8(0x34, 0x98, 0xDB));
            }
        }

        if let Some((peak_hz, _)) = self.estimate.peak() {
            frame.fill_text(Text {
                content: format!("peak {:.0} Hz  |  0-{:.0} Hz", peak_hz, DISPLAY_MAX_HZ),
                position: Point::new(bounds.width - 8.0, 4.0),
                color: theme.palette().text,
                size: 13.0.into(),
                horizontal_alignment: iced::alignment::Horizontal::Right,
                vertical_alignment: iced::alignment::Vertical::Top,
                ..Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}
