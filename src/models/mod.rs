pub mod common;
pub mod elements;
pub mod image;
pub mod prompt;
pub mod text;

pub use common::*;
pub use elements::*;
pub use image::*;
pub use prompt::*;
pub use text::*;
