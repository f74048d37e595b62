use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, PaddingConfig2d};
use burn::prelude::*;
use burn::tensor::activation;

/// Multi-scale backbone features, shallow to deep.
#[derive(Debug, Clone)]
pub struct FeatureMaps<B: Backend> {
    /// stride 8
    pub shallow: Tensor<B, 4>,
    /// stride 16
    pub mid: Tensor<B, 4>,
    /// stride 32
    pub deep: Tensor<B, 4>,
}

/// A trunk that turns a `[B, 3, H, W]` image into three feature maps at
/// strides 8, 16 and 32.
pub trait Backbone<B: Backend> {
    fn forward(&self, x: Tensor<B, 4>) -> FeatureMaps<B>;

    /// Channels of `[shallow, mid, deep]`.
    fn out_channels(&self) -> [usize; 3];
}

/// Conv (no bias) -> BatchNorm -> Mish
#[derive(Module, Debug)]
pub struct BasicConv<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B>,
}

impl<B: Backend> BasicConv<B> {
    pub fn new(
        device: &B::Device,
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
    ) -> Self {
        let padding = kernel_size / 2;
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
        activation::mish(x)
    }
}

#[derive(Module, Debug)]
pub struct Resblock<B: Backend> {
    cv1: BasicConv<B>,
    cv2: BasicConv<B>,
}

impl<B: Backend> Resblock<B> {
    pub fn new(device: &B::Device, channels: usize, hidden: usize) -> Self {
        Self {
            cv1: BasicConv::new(device, channels, hidden, 1, 1),
            cv2: BasicConv::new(device, hidden, channels, 3, 1),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let y = self.cv1.forward(x.clone());
        x + self.cv2.forward(y)
    }
}

/// One CSP stage: stride-2 downsample, then a split where one branch runs
/// through residual blocks and the other is carried across.
#[derive(Module, Debug)]
pub struct ResblockBody<B: Backend> {
    downsample: BasicConv<B>,
    split0: BasicConv<B>,
    split1: BasicConv<B>,
    blocks: Vec<Resblock<B>>,
    blocks_out: BasicConv<B>,
    concat_conv: BasicConv<B>,
}

impl<B: Backend> ResblockBody<B> {
    pub fn new(
        device: &B::Device,
        in_channels: usize,
        out_channels: usize,
        num_blocks: usize,
        first: bool,
    ) -> Self {
        let downsample = BasicConv::new(device, in_channels, out_channels, 3, 2);

        // The first stage keeps full width in both branches.
        let branch = if first { out_channels } else { out_channels / 2 };
        let hidden = if first { out_channels / 2 } else { branch };

        let blocks = (0..num_blocks)
            .map(|_| Resblock::new(device, branch, hidden))
            .collect();

        Self {
            downsample,
            split0: BasicConv::new(device, out_channels, branch, 1, 1),
            split1: BasicConv::new(device, out_channels, branch, 1, 1),
            blocks,
            blocks_out: BasicConv::new(device, branch, branch, 1, 1),
            concat_conv: BasicConv::new(device, branch * 2, out_channels, 1, 1),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.downsample.forward(x);

        let x0 = self.split0.forward(x.clone());
        let x1 = self.split1.forward(x);
        let x1 = self.blocks.iter().fold(x1, |x, block| block.forward(x));
        let x1 = self.blocks_out.forward(x1);

        self.concat_conv.forward(Tensor::cat(vec![x1, x0], 1))
    }
}

#[derive(Module, Debug)]
pub struct CspDarknet53<B: Backend> {
    stem: BasicConv<B>,
    stage1: ResblockBody<B>,
    stage2: ResblockBody<B>,
    stage3: ResblockBody<B>,
    stage4: ResblockBody<B>,
    stage5: ResblockBody<B>,
}

impl<B: Backend> CspDarknet53<B> {
    pub fn new(device: &B::Device) -> Self {
        Self {
            stem: BasicConv::new(device, 3, 32, 3, 1),              // 416
            stage1: ResblockBody::new(device, 32, 64, 1, true),     // 416 -> 208
            stage2: ResblockBody::new(device, 64, 128, 2, false),   // 208 -> 104
            stage3: ResblockBody::new(device, 128, 256, 8, false),  // 104 -> 52
            stage4: ResblockBody::new(device, 256, 512, 8, false),  // 52 -> 26
            stage5: ResblockBody::new(device, 512, 1024, 4, false), // 26 -> 13
        }
    }
}

impl<B: Backend> Backbone<B> for CspDarknet53<B> {
    fn forward(&self, x: Tensor<B, 4>) -> FeatureMaps<B> {
        let x = self.stem.forward(x);
        let x = self.stage1.forward(x);
        let x = self.stage2.forward(x);

        let shallow = self.stage3.forward(x);
        let mid = self.stage4.forward(shallow.clone());
        let deep = self.stage5.forward(mid.clone());

        FeatureMaps { shallow, mid, deep }
    }

    fn out_channels(&self) -> [usize; 3] {
        [256, 512, 1024]
    }
}
