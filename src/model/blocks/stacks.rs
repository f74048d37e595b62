use burn::prelude::*;

use super::ConvBlock;

/// Sequential conv blocks alternating 1x1 and 3x3 kernels between two widths,
/// always starting and ending on a 1x1 into `filters[0]`.
#[derive(Module, Debug)]
pub struct ConvStack<B: Backend> {
    blocks: Vec<ConvBlock<B>>,
}

impl<B: Backend> ConvStack<B> {
    /// 1x1 -> 3x3 -> 1x1
    pub fn three(device: &B::Device, filters: [usize; 2], in_channels: usize) -> Self {
        Self::alternating(device, filters, in_channels, 3)
    }

    /// 1x1 -> 3x3 -> 1x1 -> 3x3 -> 1x1
    pub fn five(device: &B::Device, filters: [usize; 2], in_channels: usize) -> Self {
        Self::alternating(device, filters, in_channels, 5)
    }

    fn alternating(device: &B::Device, filters: [usize; 2], in_channels: usize, depth: usize) -> Self {
        let mut blocks = Vec::with_capacity(depth);
        let mut channels = in_channels;
        for i in 0..depth {
            let (out, kernel) = if i % 2 == 0 { (filters[0], 1) } else { (filters[1], 3) };
            blocks.push(ConvBlock::new(device, channels, out, kernel, 1));
            channels = out;
        }

        Self { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.blocks.iter().fold(x, |x, block| block.forward(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray;

    fn conv_params(c_in: usize, c_out: usize, k: usize) -> usize {
        ConvBlock::<TestBackend>::new(&Default::default(), c_in, c_out, k, 1).num_params()
    }

    #[test]
    fn three_conv_returns_to_first_width() {
        let device = Default::default();
        let stack = ConvStack::<TestBackend>::three(&device, [8, 16], 32);
        assert_eq!(stack.len(), 3);

        let x = Tensor::<TestBackend, 4>::random([1, 32, 6, 6], Distribution::Default, &device);
        assert_eq!(stack.forward(x).dims(), [1, 8, 6, 6]);
        assert_eq!(
            stack.num_params(),
            conv_params(32, 8, 1) + conv_params(8, 16, 3) + conv_params(16, 8, 1)
        );
    }

    #[test]
    fn five_conv_alternates_kernels() {
        let device = Default::default();
        let stack = ConvStack::<TestBackend>::five(&device, [4, 8], 8);
        assert_eq!(stack.len(), 5);

        let x = Tensor::<TestBackend, 4>::random([2, 8, 5, 5], Distribution::Default, &device);
        assert_eq!(stack.forward(x).dims(), [2, 4, 5, 5]);
        assert_eq!(
            stack.num_params(),
            conv_params(8, 4, 1)
                + conv_params(4, 8, 3)
                + conv_params(8, 4, 1)
                + conv_params(4, 8, 3)
                + conv_params(8, 4, 1)
        );
    }
}
