use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{GroupNorm, GroupNormConfig, PaddingConfig2d};
use burn::prelude::*;
use burn::tensor::activation;

const FACTOR: usize = 32;

/// Largest group count `<= FACTOR` that divides `channels`.
fn group_count(channels: usize) -> usize {
    (1..=FACTOR.min(channels))
        .rev()
        .find(|g| channels % g == 0)
        .unwrap_or(1)
}

/// Efficient multi-scale attention.
///
/// Channels are folded into groups which are processed as extra batch
/// entries. A 1x1 branch encodes directional (H and W) context, a 3x3
/// branch encodes local context, and each branch's pooled descriptor
/// weights the other's spatial map through a softmax.
#[derive(Module, Debug)]
pub struct EmaBlock<B: Backend> {
    groups: usize,
    conv1x1: Conv2d<B>,
    conv3x3: Conv2d<B>,
    gn: GroupNorm<B>,
}

impl<B: Backend> EmaBlock<B> {
    pub fn new(device: &B::Device, channels: usize) -> Self {
        let groups = group_count(channels);
        let group_channels = channels / groups;

        Self {
            groups,
            conv1x1: Conv2dConfig::new([group_channels, group_channels], [1, 1]).init(device),
            conv3x3: Conv2dConfig::new([group_channels, group_channels], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            gn: GroupNormConfig::new(group_channels, group_channels).init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, channels, height, width] = x.dims();
        let bg = batch * self.groups;
        let cg = channels / self.groups;

        let group_x = x.reshape([bg, cg, height, width]);

        // [bg, cg, h, 1] and [bg, cg, w, 1]
        let x_h = group_x.clone().mean_dim(3);
        let x_w = group_x.clone().mean_dim(2).swap_dims(2, 3);
        let hw = self.conv1x1.forward(Tensor::cat(vec![x_h, x_w], 2));
        let x_h = hw.clone().slice([0..bg, 0..cg, 0..height, 0..1]);
        let x_w = hw
            .slice([0..bg, 0..cg, height..height + width, 0..1])
            .swap_dims(2, 3);

        let x1 = self.gn.forward(
            group_x.clone() * activation::sigmoid(x_h) * activation::sigmoid(x_w),
        );
        let x2 = self.conv3x3.forward(group_x.clone());

        let x11 = Self::pooled_softmax(x1.clone());
        let x12 = x2.clone().reshape([bg, cg, height * width]);
        let x21 = Self::pooled_softmax(x2);
        let x22 = x1.reshape([bg, cg, height * width]);

        let weights = (x11.matmul(x12) + x21.matmul(x22)).reshape([bg, 1, height, width]);

        (group_x * activation::sigmoid(weights)).reshape([batch, channels, height, width])
    }

    /// Global average pool to `[bg, 1, cg]` followed by a softmax over channels.
    fn pooled_softmax(x: Tensor<B, 4>) -> Tensor<B, 3> {
        let [bg, cg, _, _] = x.dims();
        let pooled = x.mean_dim(2).mean_dim(3).reshape([bg, 1, cg]);
        activation::softmax(pooled, 2)
    }
}
