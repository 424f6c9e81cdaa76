pub mod banner;
pub mod formatters;

pub use banner::{BANNER_HEIGHT, render_banner};
pub use formatters::truncate_text;
