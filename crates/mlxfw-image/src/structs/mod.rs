//! Packed structures of FS4/FS5 images.

mod hw_pointers;
mod image_info;
mod info;
mod security;
mod toc;

pub use hw_pointers::*;
pub use image_info::*;
pub use info::*;
pub use security::*;
pub use toc::*;
