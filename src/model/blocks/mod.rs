pub mod conv;
pub mod spp;
pub mod stacks;
pub mod upsample;

pub use conv::{same_padding, ConvBlock};
pub use spp::SpatialPyramidPooling;
pub use stacks::ConvStack;
pub use upsample::{upsample_nearest, Upsample};
