//! Immediate-mode UI helpers for the Macroquad rendering backend.
//!
//! This module hosts all uses of `macroquad::ui` so the rest of the adapter can
//! remain agnostic of Macroquad's UI types.

use macroquad::{
    color::{Color, WHITE},
    math::{RectOffset, Vec2},
    ui::{hash, Ui},
};
use traffic_viewer_core::{ConfigRequest, SignalMode};

const LIGHT_CYCLE_RANGE: std::ops::Range<f32> = 1.0..60.0;
const SPAWN_SCALE_RANGE: std::ops::Range<f32> = 0.0..3.0;

/// Values edited in the control panel before they are applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ControlPanelDraft {
    signal_mode: SignalMode,
    light_cycle: f32,
    spawn_scale: f32,
}

impl ControlPanelDraft {
    pub(crate) fn from_request(request: ConfigRequest) -> Self {
        Self {
            signal_mode: request.signal_mode,
            light_cycle: request.light_cycle as f32,
            spawn_scale: request.base_spawn_scale,
        }
    }

    pub(crate) fn to_request(self) -> ConfigRequest {
        let light_cycle = self.light_cycle.round().max(1.0) as u32;
        ConfigRequest::new(self.signal_mode, light_cycle, self.spawn_scale)
    }
}

/// Outcome of rendering the control panel UI during the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ControlPanelUiResult {
    /// Whether the apply button was pressed.
    pub apply_pressed: bool,
    /// Whether the reset button was pressed.
    pub reset_pressed: bool,
    /// Whether the baseline button was pressed.
    pub baseline_pressed: bool,
}

/// Snapshot of the control panel's UI layout and data for the current frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ControlPanelUiContext<'a> {
    /// Top-left corner of the panel in screen coordinates.
    pub origin: Vec2,
    /// Panel dimensions in screen space.
    pub size: Vec2,
    /// Background colour applied to the window skin so the UI matches the
    /// adapter's solid rectangle.
    pub background: Color,
    /// Fill colour of buttons.
    pub button: Color,
    /// Metrics readout supplied by the scene.
    pub status_lines: &'a [String],
}

/// Renders the control panel's interactive elements for the current frame.
pub(crate) fn draw_control_panel_ui(
    ui: &mut Ui,
    context: ControlPanelUiContext<'_>,
    draft: &mut ControlPanelDraft,
) -> ControlPanelUiResult {
    let mut skin = ui.default_skin();
    skin.margin = 0.0;

    let window_style = ui
        .style_builder()
        .color(context.background)
        .color_hovered(context.background)
        .color_clicked(context.background)
        .color_selected(context.background)
        .color_selected_hovered(context.background)
        .color_inactive(context.background)
        .text_color(WHITE)
        .margin(RectOffset::new(16.0, 16.0, 16.0, 16.0))
        .build();
    skin.window_style = window_style;

    let label_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(0.0, 0.0, 4.0, 4.0))
        .build();
    skin.label_style = label_style;

    let button_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .color(context.button)
        .color_hovered(Color::from_rgba(96, 96, 96, 255))
        .color_clicked(Color::from_rgba(56, 56, 56, 255))
        .margin(RectOffset::new(0.0, 0.0, 8.0, 8.0))
        .build();
    skin.button_style = button_style;

    ui.push_skin(&skin);

    let mut result = ControlPanelUiResult::default();
    let _ = ui.window(hash!("control_panel"), context.origin, context.size, |ui| {
        for line in context.status_lines {
            ui.label(None, line);
        }
        ui.separator();

        let mode_label = format!("Signals: {} (click to switch)", draft.signal_mode.as_str());
        if ui.button(None, mode_label.as_str()) {
            draft.signal_mode = draft.signal_mode.toggled();
        }
        ui.slider(
            hash!("light_cycle"),
            "Cycle (ticks)",
            LIGHT_CYCLE_RANGE,
            &mut draft.light_cycle,
        );
        ui.slider(
            hash!("spawn_scale"),
            "Spawn scale",
            SPAWN_SCALE_RANGE,
            &mut draft.spawn_scale,
        );

        result.apply_pressed = ui.button(None, "Apply configuration");
        ui.separator();
        result.baseline_pressed = ui.button(None, "Capture baseline (B)");
        result.reset_pressed = ui.button(None, "Reset simulation (R)");
        ui.label(None, "Q or Esc quits.");
    });

    ui.pop_skin();
    result
}
