//! Seam between the transfer coordinator and the widget that shows progress.

/// Rendering mode of a progress control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlState {
    #[default]
    Idle,
    Loading,
    Completed,
    Failed,
}

/// Anything the coordinator can drive. Every call is an explicit transition;
/// implementations must clamp instead of rejecting input.
pub trait ProgressControl {
    fn set_state(&mut self, state: ControlState);

    /// Percent complete, meaningful only while `Loading`.
    fn set_progress(&mut self, percent: f32);

    fn set_label(&mut self, text: &str);
}
