use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, PaddingConfig2d};
use burn::prelude::*;
use burn::tensor::activation;

const LEAKY_SLOPE: f64 = 0.1;

/// Padding that keeps the spatial size for odd kernels at stride 1.
/// A zero-sized kernel gets no padding.
pub fn same_padding(kernel_size: usize) -> usize {
    if kernel_size > 0 {
        (kernel_size - 1) / 2
    } else {
        0
    }
}

/// Conv (no bias) -> BatchNorm -> LeakyReLU(0.1)
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B>,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(
        device: &B::Device,
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
    ) -> Self {
        let padding = same_padding(kernel_size);

        Self {
            conv: Conv2dConfig::new([in_channels, out_channels], [kernel_size, kernel_size])
                .with_stride([stride, stride])
                .with_padding(PaddingConfig2d::Explicit(padding, padding))
                .with_bias(false)
                .init(device),
            bn: BatchNormConfig::new(out_channels).init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        activation::leaky_relu(x, LEAKY_SLOPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray;

    #[test]
    fn padding_rule() {
        assert_eq!(same_padding(1), 0);
        assert_eq!(same_padding(3), 1);
        assert_eq!(same_padding(7), 3);
        assert_eq!(same_padding(0), 0);
    }

    #[test]
    fn keeps_spatial_size_at_stride_one() {
        let device = Default::default();
        let block = ConvBlock::<TestBackend>::new(&device, 8, 16, 3, 1);
        let x = Tensor::<TestBackend, 4>::random([2, 8, 10, 10], Distribution::Default, &device);
        assert_eq!(block.forward(x).dims(), [2, 16, 10, 10]);
    }

    #[test]
    fn stride_two_halves_spatial_size() {
        let device = Default::default();
        let block = ConvBlock::<TestBackend>::new(&device, 8, 16, 3, 2);
        let x = Tensor::<TestBackend, 4>::random([1, 8, 12, 12], Distribution::Default, &device);
        assert_eq!(block.forward(x).dims(), [1, 16, 6, 6]);
    }

    #[test]
    fn convolution_has_no_bias() {
        let device = Default::default();
        let block = ConvBlock::<TestBackend>::new(&device, 4, 6, 1, 1);
        assert!(block.conv.bias.is_none());
        assert_eq!(block.conv.weight.dims(), [6, 4, 1, 1]);
    }
}
