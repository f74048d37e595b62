use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::PaddingConfig2d;
use burn::prelude::*;
use burn::tensor::activation;

const RATIO: usize = 8;
const SPATIAL_KERNEL: usize = 7;

#[derive(Module, Debug)]
pub struct ChannelAttention<B: Backend> {
    fc1: Conv2d<B>,
    fc2: Conv2d<B>,
}

impl<B: Backend> ChannelAttention<B> {
    pub fn new(device: &B::Device, channels: usize) -> Self {
        let hidden = (channels / RATIO).max(1);
        Self {
            fc1: Conv2dConfig::new([channels, hidden], [1, 1])
                .with_bias(false)
                .init(device),
            fc2: Conv2dConfig::new([hidden, channels], [1, 1])
                .with_bias(false)
                .init(device),
        }
    }

    fn mlp(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.fc2.forward(activation::relu(self.fc1.forward(x)))
    }

    /// Returns the `[B, C, 1, 1]` gate.
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let avg = x.clone().mean_dim(2).mean_dim(3);
        let max = x.max_dim(2).max_dim(3);
        activation::sigmoid(self.mlp(avg) + self.mlp(max))
    }
}

#[derive(Module, Debug)]
pub struct SpatialAttention<B: Backend> {
    conv: Conv2d<B>,
}

impl<B: Backend> SpatialAttention<B> {
    pub fn new(device: &B::Device) -> Self {
        let padding = SPATIAL_KERNEL / 2;
        Self {
            conv: Conv2dConfig::new([2, 1], [SPATIAL_KERNEL, SPATIAL_KERNEL])
                .with_padding(PaddingConfig2d::Explicit(padding, padding))
                .with_bias(false)
                .init(device),
        }
    }

    /// Returns the `[B, 1, H, W]` gate.
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let avg = x.clone().mean_dim(1);
        let max = x.max_dim(1);
        let y = Tensor::cat(vec![avg, max], 1);
        activation::sigmoid(self.conv.forward(y))
    }
}

/// Convolutional block attention: channel gate, then spatial gate.
#[derive(Module, Debug)]
pub struct CbamBlock<B: Backend> {
    channel: ChannelAttention<B>,
    spatial: SpatialAttention<B>,
}

impl<B: Backend> CbamBlock<B> {
    pub fn new(device: &B::Device, channels: usize) -> Self {
        Self {
            channel: ChannelAttention::new(device, channels),
            spatial: SpatialAttention::new(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = x.clone() * self.channel.forward(x);
        x.clone() * self.spatial.forward(x)
    }
}
