//! Domain entity definitions.

mod asset;
mod device;
mod loaded_image;
mod transform;
mod viewport;

pub use asset::{AssetCatalog, Dimensions, ImageCategory, ImageDescriptor};
pub use device::{DeviceSignals, EffectiveConnectionType};
pub use loaded_image::{ImageSource, LoadState, LoadedImage};
pub use transform::{CropMode, Gravity, ImageFormat, ProgressiveUrlSet, Tier, TransformRequest};
pub use viewport::Rect;
