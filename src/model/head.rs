use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::prelude::*;

use crate::model::blocks::ConvBlock;

/// Per-scale detection head: 3x3 conv block, then a biased 1x1 projection to
/// `num_anchors * (5 + num_classes)` raw channels laid out per anchor as
/// `[x, y, w, h, objectness, classes...]`.
#[derive(Module, Debug)]
pub struct YoloHead<B: Backend> {
    conv: ConvBlock<B>,
    pred: Conv2d<B>,
}

impl<B: Backend> YoloHead<B> {
    /// `filters` is `[mid_channels, output_channels]`.
    pub fn new(device: &B::Device, filters: [usize; 2], in_channels: usize) -> Self {
        let [mid, out] = filters;
        Self {
            conv: ConvBlock::new(device, in_channels, mid, 3, 1),
            pred: Conv2dConfig::new([mid, out], [1, 1]).init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        self.pred.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray;

    #[test]
    fn projects_to_anchor_channels() {
        let device = Default::default();
        let head = YoloHead::<TestBackend>::new(&device, [32, 3 * (5 + 20)], 16);
        let x = Tensor::<TestBackend, 4>::random([2, 16, 7, 7], Distribution::Default, &device);
        assert_eq!(head.forward(x).dims(), [2, 75, 7, 7]);
    }

    #[test]
    fn only_the_projection_has_bias() {
        let device = Default::default();
        let head = YoloHead::<TestBackend>::new(&device, [8, 255], 4);
        assert!(head.pred.bias.is_some());
        assert_eq!(head.pred.weight.dims(), [255, 8, 1, 1]);
    }
}
