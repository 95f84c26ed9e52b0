// Watermarker Library
// Decode an image, burn in a text watermark, export PNG

pub mod config;
pub mod decoder;
pub mod logging;
pub mod status;
pub mod watermark;
