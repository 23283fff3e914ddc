mod progressive_image;

pub use progressive_image::{ImageState, Outcome, ProgressiveImage, ProgressiveOptions};
