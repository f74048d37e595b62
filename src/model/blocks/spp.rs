use burn::prelude::*;
use burn::tensor::module::max_pool2d;

pub const POOL_SIZES: [usize; 3] = [5, 9, 13];

/// Largest useful odd kernel along an axis of length `len`. Wider windows
/// only add padding, so the pooled values are unchanged.
pub fn effective_kernel(kernel_size: usize, len: usize) -> usize {
    kernel_size.min(2 * len.max(1) - 1)
}

/// Spatial pyramid pooling: `[pool13, pool9, pool5, x]` along channels.
#[derive(Module, Debug, Clone)]
pub struct SpatialPyramidPooling {
    pool_sizes: Vec<usize>,
}

impl SpatialPyramidPooling {
    pub fn new() -> Self {
        Self::with_pool_sizes(&POOL_SIZES)
    }

    pub fn with_pool_sizes(pool_sizes: &[usize]) -> Self {
        Self {
            pool_sizes: pool_sizes.to_vec(),
        }
    }

    pub fn forward<B: Backend>(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [_, _, height, width] = x.dims();

        let mut features: Vec<Tensor<B, 4>> = self
            .pool_sizes
            .iter()
            .rev()
            .map(|&k| {
                let kh = effective_kernel(k, height);
                let kw = effective_kernel(k, width);
                if kh == 1 && kw == 1 {
                    // 1x1 window: max over a single pixel
                    return x.clone();
                }
                max_pool2d(x.clone(), [kh, kw], [1, 1], [kh / 2, kw / 2], [1, 1], false)
            })
            .collect();
        features.push(x);

        Tensor::cat(features, 1)
    }
}

impl Default for SpatialPyramidPooling {
    fn default() -> Self {
        Self::new()
    }
}
