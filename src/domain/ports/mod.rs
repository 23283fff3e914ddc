mod image_fetch_port;
mod signal_source_port;

pub use image_fetch_port::ImageFetchPort;
pub use signal_source_port::{FixedSignals, SignalSourcePort};
