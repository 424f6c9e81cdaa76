pub mod progress_button;

pub use progress_button::{ButtonStyle, ProgressButton};
