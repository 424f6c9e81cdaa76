pub mod alert_tray;
pub mod executer;
pub mod helpers;
pub mod notify;
pub mod panels;
pub mod popups;
pub mod traits;
pub mod widgets;

pub use executer::run;
