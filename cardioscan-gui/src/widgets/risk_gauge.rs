//! # Risk Gauge Widget
//!
//! Horizontal gauge for the LVNC risk score with colour-coded zones and a
//! needle at the current score.

use cardioscan_core::risk::GAUGE_ZONES;
use iced::widget::canvas::{self, Geometry, Path, Stroke, Text};
use iced::widget::container;
use iced::{Color, Element, Point, Rectangle, Renderer, Size, Theme, mouse};

/// Full scale of the gauge.
const GAUGE_MAX: f32 = 100.0;

/// Risk gauge widget.
pub struct RiskGauge {
    /// Score to indicate (None before a scan completes)
    score: Option<u8>,
}

impl RiskGauge {
    pub fn new(score: Option<u8>) -> Self {
        Self { score }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fixed(80.0)),
        )
        .into()
    }
}

fn zone_color(label: &str) -> Color {
    match label {
        "low" => Color::from_rgb8(0x90, 0xEE, 0x90),
        "moderate" => Color::from_rgb8(0xFF, 0xA5, 0x00),
        _ => Color::from_rgb8(0xE7, 0x4C, 0x3C),
    }
}

impl<Message> canvas::Program<Message> for RiskGauge {
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
        let bar_height = bounds.height * 0.5;

        for (low, high, label) in GAUGE_ZONES {
            let x = low as f32 / GAUGE_MAX * bounds.width;
            let width = (high - low) as f32 / GAUGE_MAX * bounds.width;
            let zone = Path::rectangle(Point::new(x, 0.0), Size::new(width, bar_height));
            frame.fill(&zone, zone_color(label));
        }

        if let Some(score) = self.score {
            let needle_x = score.min(100) as f32 / GAUGE_MAX * bounds.width;
            let needle = Path::line(Point::new(needle_x, 0.0), Point::new(needle_x, bar_height));
            frame.stroke(
                &needle,
                Stroke::default().with_width(4.0).with_color(Color::BLACK),
            );

            frame.fill_text(Text {
                content: score.to_string(),
                position: Point::new(needle_x.clamp(12.0, bounds.width - 12.0), bar_height + 4.0),
                color: theme.palette().text,
                size: 20.0.into(),
                horizontal_alignment: iced::alignment::Horizontal::Center,
                vertical_alignment: iced::alignment::Vertical::Top,
                ..Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}
