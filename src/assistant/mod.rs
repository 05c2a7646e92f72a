//! Math solver and image studio.

pub mod math;
pub mod vision;

pub use math::{ImageAttachment, MathTutor};
pub use vision::{ImageStyle, VisionStudio};
