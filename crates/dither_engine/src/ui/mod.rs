//! Debug UI Module
//!
//! Defines the interface to an immediate-mode debug UI. The engine never
//! draws UI itself; it describes windows and widgets through [`DebugUi`] and
//! a backend (an ImGui binding, a headless script) decides what that means.
//!
//! Widgets are only valid between [`DebugUi::begin_frame`] and
//! [`DebugUi::end_frame`], inside a window opened with
//! [`DebugUi::begin_window`]. [`frame`] and [`window`] scope closures so the
//! matching end call is never forgotten.

use crate::core::config::DitherSettings;
use crate::foundation::math::Vec3;

/// Immediate-mode debug UI backend
pub trait DebugUi {
    /// Start a UI frame
    fn begin_frame(&mut self);

    /// Finish the UI frame
    fn end_frame(&mut self);

    /// Open a named window; returns false when it is collapsed
    fn begin_window(&mut self, name: &str) -> bool;

    /// Close the current window
    fn end_window(&mut self);

    /// Float slider; returns whether the value changed
    fn slider_float(&mut self, label: &str, value: &mut f32, min: f32, max: f32) -> bool;

    /// Three-component drag widget; returns whether the value changed
    fn drag_float3(&mut self, label: &str, value: &mut Vec3, speed: f32) -> bool;

    /// Read-only text
    fn label(&mut self, text: &str);
}

/// Run `body` inside a UI frame
pub fn frame<U: DebugUi + ?Sized, R>(ui: &mut U, body: impl FnOnce(&mut U) -> R) -> R {
    ui.begin_frame();
    let result = body(ui);
    ui.end_frame();
    result
}

/// Run `body` inside a named window if it is open
///
/// The window is ended either way, as immediate-mode backends expect.
pub fn window<U: DebugUi + ?Sized, R>(ui: &mut U, name: &str, body: impl FnOnce(&mut U) -> R) -> Option<R> {
    let result = if ui.begin_window(name) { Some(body(ui)) } else { None };
    ui.end_window();
    result
}

impl DitherSettings {
    /// Title of the settings window
    pub const WINDOW_NAME: &'static str = "Dither Settings";

    /// Sliders for the three tunables; returns whether any changed
    pub fn draw_gui(&mut self, ui: &mut (impl DebugUi + ?Sized)) -> bool {
        let mut changed = false;
        changed |= ui.slider_float(
            "Dither Threshold",
            &mut self.threshold,
            Self::THRESHOLD_RANGE.0,
            Self::THRESHOLD_RANGE.1,
        );
        changed |= ui.slider_float("Dither Scale", &mut self.scale, Self::SCALE_RANGE.0, Self::SCALE_RANGE.1);
        changed |= ui.slider_float(
            "Mario Dither Amount",
            &mut self.amount,
            Self::AMOUNT_RANGE.0,
            Self::AMOUNT_RANGE.1,
        );
        changed
    }
}
