use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation;
use burn::tensor::module::adaptive_avg_pool2d;

const RATIO: usize = 16;

/// Squeeze-and-excitation: global average pool, bottleneck MLP, sigmoid channel gate.
#[derive(Module, Debug)]
pub struct SeBlock<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
}

impl<B: Backend> SeBlock<B> {
    pub fn new(device: &B::Device, channels: usize) -> Self {
        let hidden = (channels / RATIO).max(1);
        Self {
            fc1: LinearConfig::new(channels, hidden)
                .with_bias(false)
                .init(device),
            fc2: LinearConfig::new(hidden, channels)
                .with_bias(false)
                .init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, channels, _, _] = x.dims();

        let y = adaptive_avg_pool2d(x.clone(), [1, 1]).reshape([batch, channels]);
        let y = activation::relu(self.fc1.forward(y));
        let y = activation::sigmoid(self.fc2.forward(y));

        x * y.reshape([batch, channels, 1, 1])
    }
}
