use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig};
use burn::prelude::*;
use burn::tensor::activation;

const REDUCTION: usize = 16;

/// Coordinate attention: separate gates along height and width.
#[derive(Module, Debug)]
pub struct CoordAttention<B: Backend> {
    conv_1x1: Conv2d<B>,
    bn: BatchNorm<B>,
    f_h: Conv2d<B>,
    f_w: Conv2d<B>,
}

impl<B: Backend> CoordAttention<B> {
    pub fn new(device: &B::Device, channels: usize) -> Self {
        let hidden = (channels / REDUCTION).max(1);
        let conv = |c_in: usize, c_out: usize| {
            Conv2dConfig::new([c_in, c_out], [1, 1])
                .with_bias(false)
                .init(device)
        };

        Self {
            conv_1x1: conv(channels, hidden),
            bn: BatchNormConfig::new(hidden).init(device),
            f_h: conv(hidden, channels),
            f_w: conv(hidden, channels),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, _, height, width] = x.dims();

        // [b, c, 1, h] and [b, c, 1, w]
        let x_h = x.clone().mean_dim(3).swap_dims(2, 3);
        let x_w = x.clone().mean_dim(2);

        let y = self.conv_1x1.forward(Tensor::cat(vec![x_h, x_w], 3));
        let y = activation::relu(self.bn.forward(y));
        let [_, hidden, _, _] = y.dims();

        let s_h = y
            .clone()
            .slice([0..batch, 0..hidden, 0..1, 0..height])
            .swap_dims(2, 3);
        let s_w = y.slice([0..batch, 0..hidden, 0..1, height..height + width]);

        let gate_h = activation::sigmoid(self.f_h.forward(s_h));
        let gate_w = activation::sigmoid(self.f_w.forward(s_w));

        x * gate_h * gate_w
    }
}
