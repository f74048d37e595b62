use burn::nn::conv::{Conv1d, Conv1dConfig};
use burn::nn::PaddingConfig1d;
use burn::prelude::*;
use burn::tensor::activation;
use burn::tensor::module::adaptive_avg_pool2d;

const B_OFFSET: f64 = 1.0;
const GAMMA: f64 = 2.0;

/// Adaptive 1D kernel size for ECA: `|(log2(c) + b) / gamma|`, forced odd.
pub fn kernel_size(channels: usize) -> usize {
    let k = (((channels as f64).log2() + B_OFFSET) / GAMMA).abs() as usize;
    if k % 2 == 1 {
        k
    } else {
        k + 1
    }
}

/// Efficient channel attention: a 1D conv across the pooled channel descriptor.
#[derive(Module, Debug)]
pub struct EcaBlock<B: Backend> {
    conv: Conv1d<B>,
}

impl<B: Backend> EcaBlock<B> {
    pub fn new(device: &B::Device, channels: usize) -> Self {
        let k = kernel_size(channels);
        Self {
            conv: Conv1dConfig::new(1, 1, k)
                .with_padding(PaddingConfig1d::Explicit((k - 1) / 2))
                .with_bias(false)
                .init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, channels, _, _] = x.dims();

        let y = adaptive_avg_pool2d(x.clone(), [1, 1]).reshape([batch, 1, channels]);
        let y = activation::sigmoid(self.conv.forward(y));

        x * y.reshape([batch, channels, 1, 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_grows_with_channels_and_stays_odd() {
        assert_eq!(kernel_size(128), 5);
        assert_eq!(kernel_size(256), 5);
        assert_eq!(kernel_size(512), 5);
        assert_eq!(kernel_size(1024), 5);
        assert_eq!(kernel_size(16), 3);
        assert_eq!(kernel_size(4096), 7);
    }
}
