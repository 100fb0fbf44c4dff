pub mod models;
pub mod style;

pub use models::{Order, Tag};
pub use style::Style;
