pub mod context;
pub mod result;

pub use context::{UIContext, UIPopup};
pub use result::{ResultTick, ResultView};
