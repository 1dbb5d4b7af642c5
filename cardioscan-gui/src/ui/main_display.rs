//! # Main Display Module
//!
//! This module contains the main display components and layout logic
//! for the CardioScan LVNC analysis application.

use std::time::Duration;

use cardioscan_core::config::SCAN_DURATION_OPTIONS;
use cardioscan_core::{Recommendation, RiskBand, ScanOutcome};
use iced::widget::{
    Space, button, column, container, horizontal_space, pick_list, progress_bar, row, scrollable,
    slider, text, text_input,
};
use iced::{Alignment, Color, Element, Length};

use crate::widgets::risk_gauge::RiskGauge;
use crate::widgets::spectrum::Spectrum;
use crate::widgets::waveform::Waveform;
use crate::{AppDisplayData, DeviceStatus, Message, ScanPhase};

const RED: Color = Color::from_rgb(0.86, 0.21, 0.27);
const ORANGE: Color = Color::from_rgb(0.95, 0.55, 0.1);
const GREEN: Color = Color::from_rgb(0.16, 0.65, 0.27);
const MUTED: Color = Color::from_rgb(0.45, 0.45, 0.45);

/// Configuration for a single button in the settings sidebar
#[derive(Debug, Clone)]
struct ButtonConfig {
    label: &'static str,
    message: Message,
    button_type: ButtonType,
}

/// Different types of buttons with their styling requirements
#[derive(Debug, Clone)]
enum ButtonType {
    /// Always available
    Standard,
    /// Only available once a scan has completed
    NeedsResults,
}

const PROGRAM_BUTTONS: &[ButtonConfig] = &[
    ButtonConfig { label: "Save Settings", message: Message::SaveSettings, button_type: ButtonType::Standard },
    ButtonConfig { label: "Load Settings", message: Message::LoadSettings, button_type: ButtonType::Standard },
    ButtonConfig { label: "Save Report", message: Message::SaveReport, button_type: ButtonType::NeedsResults },
];

/// Creates the complete main application view
pub fn create_main_view(data: &AppDisplayData) -> Element<'_, Message> {
    if !data.worker_active {
        return container(text("Scan worker unavailable").size(40))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into();
    }

    let header = column![
        text("LVNC Cardiac Analysis System").size(28),
        text("Left Ventricular Non-Compaction Detection via Acoustic Analysis")
            .size(14)
            .color(MUTED),
    ]
    .spacing(4);

    let mut content = column![
        header,
        Space::with_height(10),
        create_overview_row(data),
        create_scan_control(data),
    ]
    .spacing(10);

    if data.phase != ScanPhase::Idle || !data.waveform.points.is_empty() {
        content = content.push(
            row![create_waveform_panel(data), Space::with_width(10), create_spectrum_panel(data)]
                .align_y(Alignment::Start),
        );
    }

    if let Some(outcome) = &data.outcome {
        content = content.push(create_results_panel(outcome));
    }

    content = content.push(
        text(
            "Disclaimer: This system is for research purposes only. \
             Consult a qualified cardiologist for medical diagnosis.",
        )
        .size(12)
        .color(MUTED),
    );

    let main_content = row![
        create_sidebar(data),
        Space::with_width(10),
        scrollable(content.width(Length::Fill).padding(10)).width(Length::Fill),
    ]
    .align_y(Alignment::Start)
    .padding(20);

    container(main_content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// Start button, progress bar and status line.
fn create_scan_control(data: &AppDisplayData) -> Element<'_, Message> {
    let connected = data.device_status == DeviceStatus::Connected;
    let acquiring = matches!(data.phase, ScanPhase::Starting | ScanPhase::Acquiring);
    // A second start is only accepted once the worker has answered the first.
    let can_start = connected && data.phase != ScanPhase::Starting;

    let start = button(text("Start Cardiac Scan").size(16))
        .padding([8, 16])
        .on_press_maybe(can_start.then_some(Message::StartScan));
    let cancel = button(text("Cancel").size(16))
        .padding([8, 16])
        .on_press_maybe(acquiring.then_some(Message::CancelScan));

    let (status, color) = match &data.phase {
        ScanPhase::Idle if !connected => ("Connect the device to start scanning".to_string(), MUTED),
        ScanPhase::Idle => ("Ready to scan".to_string(), MUTED),
        ScanPhase::Starting => ("Preparing scan...".to_string(), MUTED),
        ScanPhase::Acquiring => (format!("Scanning... {}% complete", data.progress), MUTED),
        ScanPhase::Completed => ("Scan Complete - Analyzing Results...".to_string(), GREEN),
        ScanPhase::Failed(reason) => (format!("Scan failed: {}", reason), RED),
    };

    let mut panel = column![
        row![start, Space::with_width(10), cancel].align_y(Alignment::Center),
        progress_bar(0.0..=100.0, f32::from(data.progress)).height(Length::Fixed(12.0)),
        text(status).size(14).color(color),
    ]
    .spacing(8);

    if let Some(notice) = &data.notice {
        panel = panel.push(text(notice).size(13).color(MUTED));
    }

    panel.into()
}

/// Formats the time since the last completed scan.
fn format_last_scan(elapsed: Option<Duration>) -> String {
    match elapsed {
        None => "--".to_string(),
        Some(elapsed) if elapsed.as_secs() < 60 => "just now".to_string(),
        Some(elapsed) => format!("{} min ago", elapsed.as_secs() / 60),
    }
}

/// Device summary cards shown above the scan controls.
fn create_overview_row(data: &AppDisplayData) -> Element<'static, Message> {
    let scanning = matches!(data.phase, ScanPhase::Starting | ScanPhase::Acquiring);
    let (last_scan_note, last_scan_color) = if data.last_completed.is_some() {
        ("Complete", GREEN)
    } else {
        ("No scans yet", MUTED)
    };

    row![
        metric_card(
            "Scan Duration",
            format!("{} sec", data.scan_duration),
            if scanning { "Scanning" } else { "Ready" },
            GREEN,
        ),
        metric_card("Signal Quality", "92%".to_string(), "Excellent", GREEN),
        metric_card(
            "Last Scan",
            format_last_scan(data.last_completed.map(|t| t.elapsed())),
            last_scan_note,
            last_scan_color,
        ),
    ]
    .spacing(10)
    .into()
}

/// Creates the phonocardiogram panel.
fn create_waveform_panel(data: &AppDisplayData) -> Element<'static, Message> {
    let panel = container(
        column![
            text("Real-time Phonocardiogram").size(18),
            Space::with_height(10),
            container(Waveform::new(data.waveform.clone()).view())
                .width(Length::Fill)
                .height(Length::Fill),
        ]
        .spacing(5)
        .padding(15),
    )
    .style(container::bordered_box)
    .width(Length::Fill)
    .height(Length::Fixed(250.0));

    panel.into()
}

/// Creates the spectrum panel. Stays empty until the first estimate arrives.
fn create_spectrum_panel(data: &AppDisplayData) -> Element<'static, Message> {
    let content: Element<'static, Message> = match &data.spectrum {
        Some(estimate) => Spectrum::new(estimate).view(),
        None => container(text("Waiting for spectrum...").size(14).color(MUTED))
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into(),
    };

    let panel = container(
        column![
            text("Frequency Spectrum Analysis").size(18),
            Space::with_height(10),
            content,
        ]
        .spacing(5)
        .padding(15),
    )
    .style(container::bordered_box)
    .width(Length::Fill)
    .height(Length::Fixed(250.0));

    panel.into()
}

fn band_color(band: RiskBand) -> Color {
    match band {
        RiskBand::High => RED,
        RiskBand::Moderate => ORANGE,
        RiskBand::Low => GREEN,
    }
}

/// A single labelled value with a coloured annotation underneath.
fn metric_card(
    title: &'static str,
    value: String,
    note: &'static str,
    note_color: Color,
) -> Element<'static, Message> {
    container(
        column![
            text(title).size(14).color(MUTED),
            text(value).size(26),
            text(note).size(13).color(note_color),
        ]
        .spacing(4),
    )
    .style(container::bordered_box)
    .padding(12)
    .width(Length::Fill)
    .into()
}

/// Biomarker cards, risk gauge and clinical recommendation.
fn create_results_panel(outcome: &ScanOutcome) -> Element<'static, Message> {
    let markers = &outcome.biomarkers;
    let advisories = &outcome.advisories;
    let assessment = &outcome.assessment;
    let advisory_color = |note: &str| if note.starts_with("Normal") { GREEN } else { ORANGE };

    let cards = row![
        metric_card(
            "NC Ratio",
            markers.nc_ratio_display(),
            advisories.nc_ratio,
            advisory_color(advisories.nc_ratio),
        ),
        metric_card(
            "Ejection Fraction",
            markers.ejection_fraction_display(),
            advisories.ejection_fraction,
            advisory_color(advisories.ejection_fraction),
        ),
        metric_card(
            "Trabeculation Score",
            markers.trabeculation_display(),
            advisories.trabeculation_score,
            advisory_color(advisories.trabeculation_score),
        ),
        metric_card(
            "LVNC Risk Score",
            assessment.score_display(),
            assessment.band.label(),
            band_color(assessment.band),
        ),
    ]
    .spacing(10);

    let gauge = container(
        column![
            text("LVNC Risk Assessment").size(18),
            Space::with_height(10),
            RiskGauge::new(Some(assessment.score)).view(),
        ]
        .spacing(5)
        .padding(15),
    )
    .style(container::bordered_box)
    .width(Length::Fill);

    column![
        text("Analysis Results").size(22),
        cards,
        gauge,
        create_recommendation_panel(assessment.recommendation),
    ]
    .spacing(10)
    .into()
}

fn create_recommendation_panel(recommendation: Recommendation) -> Element<'static, Message> {
    let color = match recommendation {
        Recommendation::UrgentReferral => RED,
        Recommendation::ModerateSuspicion => ORANGE,
        Recommendation::LowProbability => GREEN,
    };

    let mut actions = column![].spacing(4);
    for action in recommendation.actions() {
        actions = actions.push(text(format!("- {}", action)).size(14));
    }

    container(
        column![
            text("Clinical Recommendation").size(18),
            text(recommendation.headline()).size(16).color(color),
            actions,
        ]
        .spacing(8)
        .padding(15),
    )
    .style(container::bordered_box)
    .width(Length::Fill)
    .into()
}

/// Creates the device and patient sidebar.
///
/// Device settings and patient fields are only shown while the device is
/// connected; the program buttons are always available.
fn create_sidebar(data: &AppDisplayData) -> Element<'_, Message> {
    let mut sections = column![
        text("CardioScan Pro").size(22),
        text("Device Status").size(16),
        pick_list(
            &DeviceStatus::ALL[..],
            Some(data.device_status),
            Message::DeviceStatusSelected,
        )
        .width(Length::Fill),
    ]
    .spacing(10);

    if data.device_status == DeviceStatus::Connected {
        sections = sections
            .push(text("Device connected").size(14).color(GREEN))
            .push(Space::with_height(10))
            .push(text("Device Settings").size(16))
            .push(
                row![
                    text("Sensitivity").size(14),
                    horizontal_space(),
                    text(data.sensitivity.to_string()).size(14),
                ]
                .align_y(Alignment::Center),
            )
            .push(slider(1..=100, data.sensitivity, Message::SensitivityChanged))
            .push(text("Scan Duration (sec)").size(14))
            .push(
                pick_list(
                    &SCAN_DURATION_OPTIONS[..],
                    Some(data.scan_duration),
                    Message::ScanDurationSelected,
                )
                .width(Length::Fill),
            )
            .push(Space::with_height(10))
            .push(text("Patient Information").size(16))
            .push(
                text_input("Patient ID", &data.patient.patient_id)
                    .on_input(Message::PatientIdChanged),
            )
            .push(text_input("Age", &data.age_input).on_input(Message::AgeChanged));
    } else {
        sections = sections.push(
            text("Please connect CardioScan hardware")
                .size(14)
                .color(RED),
        );
    }

    sections = sections
        .push(Space::with_height(10))
        .push(text("Instructions").size(16))
        .push(
            text(
                "1. Place the sensor on the chest\n\
                 2. Keep the patient still\n\
                 3. Press Start Cardiac Scan\n\
                 4. Review the results",
            )
            .size(13)
            .color(MUTED),
        )
        .push(Space::with_height(10))
        .push(text("Program").size(16));

    let has_results = data.outcome.is_some();
    for config in PROGRAM_BUTTONS {
        sections = sections.push(make_button(config, has_results));
    }

    container(sections.padding(15))
        .width(Length::Fixed(260.0))
        .height(Length::Fill)
        .into()
}

/// Creates a sidebar button, greyed out when its action is unavailable.
fn make_button(config: &ButtonConfig, has_results: bool) -> Element<'static, Message> {
    let enabled = match config.button_type {
        ButtonType::Standard => true,
        ButtonType::NeedsResults => has_results,
    };

    let mut button = button(text(config.label).size(14).width(Length::Fill)).padding([6, 10]);
    if enabled {
        button = button.on_press(config.message.clone());
    } else {
        button = button.style(|_theme, _status| {
            use iced::widget::button;
            button::Style {
                background: Some(iced::Background::Color(Color::from_rgb(0.85, 0.85, 0.85))),
                text_color: Color::from_rgb(0.6, 0.6, 0.6),
                ..button::Style::default()
            }
        });
    }
    button.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_scan_is_shown_in_minutes() {
        assert_eq!(format_last_scan(None), "--");
        assert_eq!(format_last_scan(Some(Duration::from_secs(12))), "just now");
        assert_eq!(format_last_scan(Some(Duration::from_secs(150))), "2 min ago");
    }
}
