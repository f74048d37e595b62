use burn::prelude::*;
use burn::tensor::module::interpolate;
use burn::tensor::ops::{InterpolateMode, InterpolateOptions};

use super::ConvBlock;

/// Nearest-neighbour resize of `[B, C, H, W]` to `[B, C, H*scale, W*scale]`.
pub fn upsample_nearest<B: Backend>(x: Tensor<B, 4>, scale: usize) -> Tensor<B, 4> {
    let [_, _, height, width] = x.dims();
    interpolate(
        x,
        [height * scale, width * scale],
        InterpolateOptions::new(InterpolateMode::Nearest),
    )
}

/// 1x1 conv block followed by a 2x nearest upsample.
#[derive(Module, Debug)]
pub struct Upsample<B: Backend> {
    conv: ConvBlock<B>,
}

impl<B: Backend> Upsample<B> {
    pub fn new(device: &B::Device, in_channels: usize, out_channels: usize) -> Self {
        Self {
            conv: ConvBlock::new(device, in_channels, out_channels, 1, 1),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        upsample_nearest(self.conv.forward(x), 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::{Distribution, ElementConversion};

    type TestBackend = NdArray;

    #[test]
    fn nearest_repeats_each_pixel() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 1>::from_floats([1.0, 2.0, 3.0, 4.0], &device)
            .reshape([1, 1, 2, 2]);

        let out = upsample_nearest(x, 2);
        let expected = Tensor::<TestBackend, 1>::from_floats(
            [
                1.0, 1.0, 2.0, 2.0, //
                1.0, 1.0, 2.0, 2.0, //
                3.0, 3.0, 4.0, 4.0, //
                3.0, 3.0, 4.0, 4.0,
            ],
            &device,
        )
        .reshape([1, 1, 4, 4]);

        let diff: f32 = (out - expected).abs().max().into_scalar().elem();
        assert_eq!(diff, 0.0);
    }

    #[test]
    fn upsample_block_shape() {
        let device = Default::default();
        let block = Upsample::<TestBackend>::new(&device, 32, 16);
        let x = Tensor::<TestBackend, 4>::random([2, 32, 5, 7], Distribution::Default, &device);
        assert_eq!(block.forward(x).dims(), [2, 16, 10, 14]);
    }
}
