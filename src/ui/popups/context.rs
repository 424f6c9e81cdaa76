use crate::workers::app::Mode;

/// Which popup sits on top of the current window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UIPopup {
    None,
    Result,
}

/// Tracks the current window and popup state.
#[derive(Debug, Clone)]
pub struct UIContext {
    pub current_mode: Mode,
    pub active_popup: UIPopup,
}

impl UIContext {
    pub fn new() -> Self {
        Self {
            current_mode: Mode::Download,
            active_popup: UIPopup::None,
        }
    }

    pub fn has_popup(&self) -> bool {
        self.active_popup != UIPopup::None
    }

    /// Change the mode. Open popups stay attached to the app, not the window.
    pub fn switch_mode(&mut self, new_mode: Mode) {
        self.current_mode = new_mode;
    }
}

impl Default for UIContext {
    fn default() -> Self {
        Self::new()
    }
}
