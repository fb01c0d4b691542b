//! Headless debug UI
//!
//! Stands in for an interactive UI: slider edits are scheduled up front and
//! applied on the frame they are due, and window contents are logged.

use dither_engine::foundation::math::Vec3;
use dither_engine::ui::DebugUi;

/// A slider edit applied on a given frame
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEdit {
    /// Frame the edit lands on
    pub frame: u64,
    /// Widget label
    pub label: String,
    /// New value, clamped to the slider range when applied
    pub value: f32,
}

/// Debug UI driven by a schedule instead of input
#[derive(Debug, Default)]
pub struct ScriptedUi {
    frame: u64,
    schedule: Vec<ScheduledEdit>,
    window: Option<String>,
    lines: Vec<String>,
}

impl ScriptedUi {
    /// UI with no scheduled edits
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `label` to become `value` on `frame`
    #[must_use]
    pub fn with_edit(mut self, frame: u64, label: impl Into<String>, value: f32) -> Self {
        self.schedule.push(ScheduledEdit {
            frame,
            label: label.into(),
            value,
        });
        self
    }

    /// Frames started so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Lines written during the last frame
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Remove and return the edit due now for `label`
    fn take_edit(&mut self, label: &str) -> Option<f32> {
        let current = self.frame;
        let index = self
            .schedule
            .iter()
            .position(|edit| edit.frame == current && edit.label == label)?;
        Some(self.schedule.remove(index).value)
    }
}

impl DebugUi for ScriptedUi {
    fn begin_frame(&mut self) {
        self.frame += 1;
        self.lines.clear();
    }

    fn end_frame(&mut self) {
        for line in &self.lines {
            log::debug!("[ui frame {}] {}", self.frame, line);
        }
    }

    fn begin_window(&mut self, name: &str) -> bool {
        self.window = Some(name.to_string());
        self.lines.push(format!("== {} ==", name));
        true
    }

    fn end_window(&mut self) {
        self.window = None;
    }

    fn slider_float(&mut self, label: &str, value: &mut f32, min: f32, max: f32) -> bool {
        let changed = match self.take_edit(label) {
            Some(next) => {
                let next = next.clamp(min, max);
                log::info!("Scripted edit on frame {}: '{}' {} -> {}", self.frame, label, value, next);
                let changed = (next - *value).abs() > f32::EPSILON;
                *value = next;
                changed
            }
            None => false,
        };
        self.lines.push(format!("{}: {:.3} [{}, {}]", label, value, min, max));
        changed
    }

    fn drag_float3(&mut self, label: &str, value: &mut Vec3, _speed: f32) -> bool {
        self.lines
            .push(format!("{}: ({:.2}, {:.2}, {:.2})", label, value.x, value.y, value.z));
        false
    }

    fn label(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }
}
