//! # Waveform Widget
//!
//! Real-time phonocardiogram trace. The x axis spans the whole recording so
//! the trace grows from left to right as more of the signal is revealed.

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{Color, Element, Point, Rectangle, Renderer, Theme, mouse};

/// Maximum number of points kept for drawing one trace.
pub const MAX_TRACE_POINTS: usize = 2000;

/// Amplitude shown at the top and bottom edges.
const AMPLITUDE_RANGE: f32 = 1.2;

/// A decimated `(time, amplitude)` polyline ready for drawing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveformTrace {
    pub points: Vec<(f32, f32)>,
    /// Length of the full recording in seconds.
    pub duration: f32,
}

impl WaveformTrace {
    /// Reduces a revealed prefix to at most `max_points` points.
    ///
    /// Each bucket contributes its minimum and maximum, in time order, so
    /// peaks survive the decimation.
    pub fn from_window(times: &[f64], samples: &[f64], duration: f64, max_points: usize) -> Self {
        let len = times.len().min(samples.len());
        let buckets = (max_points / 2).max(1);

        let points = if len <= max_points {
            times[..len]
                .iter()
                .zip(&samples[..len])
                .map(|(&t, &s)| (t as f32, s as f32))
                .collect()
        } else {
            let bucket_len = len.div_ceil(buckets);
            let mut points = Vec::with_capacity(buckets * 2);
            for start in (0..len).step_by(bucket_len) {
                let end = (start + bucket_len).min(len);
                let bucket = &samples[start..end];
                let (mut lo, mut hi) = (start, start);
                for (offset, &s) in bucket.iter().enumerate() {
                    if s < samples[lo] {
                        lo = start + offset;
                    }
                    if s > samples[hi] {
                        hi = start + offset;
                    }
                }
                let (first, second) = if lo <= hi { (lo, hi) } else { (hi, lo) };
                points.push((times[first] as f32, samples[first] as f32));
                if second != first {
                    points.push((times[second] as f32, samples[second] as f32));
                }
            }
            points
        };

        Self {
            points,
            duration: duration as f32,
        }
    }
}

/// Canvas program drawing one `WaveformTrace`.
pub struct Waveform {
    trace: WaveformTrace,
}

impl Waveform {
    pub fn new(trace: WaveformTrace) -> Self {
        Self { trace }
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

impl<Message> canvas::Program<Message> for Waveform {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        let mid_y = bounds.height / 2.0;
        let axis = Path::line(Point::new(0.0, mid_y), Point::new(bounds.width, mid_y));
        frame.stroke(
            &axis,
            Stroke::default()
                .with_width(1.0)
                .with_color(Color::from_rgb8(0x60, 0x60, 0x60)),
        );

        if self.trace.points.len() < 2 || self.trace.duration <= 0.0 {
            return vec![frame.into_geometry()];
        }

        let to_point = |(t, a): (f32, f32)| {
            let x = t / self.trace.duration * bounds.width;
            let y = mid_y - (a / AMPLITUDE_RANGE).clamp(-1.0, 1.0) * mid_y;
            Point::new(x, y)
        };

        let trace = Path::new(|builder| {
            let mut points = self.trace.points.iter().copied().map(to_point);
            if let Some(first) = points.next() {
                builder.move_to(first);
                for point in points {
                    builder.line_to(point);
                }
            }
        });
        frame.stroke(
            &trace,
            Stroke::default()
                .with_width(1.5)
                .with_color(Color::from_rgb8(0xE7, 0x4C, 0x3C)),
        );

        vec![frame.into_geometry()]
    }
}
