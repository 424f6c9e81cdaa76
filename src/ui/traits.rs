use crate::core::transfer::NotificationPayload;
use crate::workers::app::{App, Mode};
use crossterm::event::KeyCode;
use ratatui::{Frame, layout::Rect};

/// Core trait for UI components that can be rendered
pub trait Component {
    fn render(&mut self, f: &mut Frame, app: &App, area: Rect);

    /// Called when this component gains focus
    fn on_focus(&mut self, _app: &mut App) {}

    /// Called when this component loses focus
    fn on_blur(&mut self, _app: &mut App) {}
}

/// Trait for components that handle keyboard input
pub trait Handler {
    fn handle_key(&mut self, app: &mut App, key: KeyCode) -> Option<Action>;
}

/// Actions that can be returned from handlers
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SwitchMode(Mode),
    StartDownload,
    CancelDownload,
    /// Open the result view for an activated alert.
    OpenResult(NotificationPayload),
    CycleTheme,
    Quit,
    None,
}
