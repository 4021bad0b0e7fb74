pub mod icons;
pub mod render;

pub use render::{render_notice, render_view};
