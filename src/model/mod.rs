pub mod attention;
pub mod backbone;
pub mod blocks;
pub mod head;
pub mod neck;
pub mod yolo;

pub use attention::{Attention, AttentionKind, InjectedAttention};
pub use backbone::{Backbone, CspDarknet53, FeatureMaps};
pub use head::YoloHead;
pub use neck::{Neck, PyramidFeatures};
pub use yolo::{YoloBody, YoloOutput};
