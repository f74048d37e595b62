use burn::prelude::*;

use crate::model::attention::InjectedAttention;
use crate::model::backbone::FeatureMaps;
use crate::model::blocks::{ConvBlock, ConvStack, SpatialPyramidPooling, Upsample};

/// Fused maps handed to the heads.
#[derive(Debug, Clone)]
pub struct PyramidFeatures<B: Backend> {
    /// 128 channels, stride 8
    pub p3: Tensor<B, 4>,
    /// 256 channels, stride 16
    pub p4: Tensor<B, 4>,
    /// 512 channels, stride 32
    pub p5: Tensor<B, 4>,
}

/// SPP + PANet: a top-down pass with two upsample fusions followed by a
/// bottom-up pass with two stride-2 fusions.
#[derive(Module, Debug)]
pub struct Neck<B: Backend> {
    conv1: ConvStack<B>,
    spp: SpatialPyramidPooling,
    conv2: ConvStack<B>,

    // Top-down
    upsample1: Upsample<B>,
    conv_for_p4: ConvBlock<B>,
    make_five_conv1: ConvStack<B>,

    upsample2: Upsample<B>,
    conv_for_p3: ConvBlock<B>,
    make_five_conv2: ConvStack<B>,

    // Bottom-up
    down_sample1: ConvBlock<B>,
    make_five_conv3: ConvStack<B>,

    down_sample2: ConvBlock<B>,
    make_five_conv4: ConvStack<B>,
}

impl<B: Backend> Neck<B> {
    pub fn new(device: &B::Device) -> Self {
        Self {
            conv1: ConvStack::three(device, [512, 1024], 1024),
            spp: SpatialPyramidPooling::new(),
            conv2: ConvStack::three(device, [512, 1024], 2048),

            upsample1: Upsample::new(device, 512, 256),
            conv_for_p4: ConvBlock::new(device, 512, 256, 1, 1),
            make_five_conv1: ConvStack::five(device, [256, 512], 512),

            upsample2: Upsample::new(device, 256, 128),
            conv_for_p3: ConvBlock::new(device, 256, 128, 1, 1),
            make_five_conv2: ConvStack::five(device, [128, 256], 256),

            down_sample1: ConvBlock::new(device, 128, 256, 3, 2),
            make_five_conv3: ConvStack::five(device, [256, 512], 512),

            down_sample2: ConvBlock::new(device, 256, 512, 3, 2),
            make_five_conv4: ConvStack::five(device, [512, 1024], 1024),
        }
    }

    /// Widths seen by the two post-upsample attention points.
    pub fn upsample_channels(&self) -> [usize; 2] {
        [256, 128]
    }

    /// Runs the pyramid. `attention` re-weights the two upsampled maps; the
    /// backbone maps are expected to be re-weighted already.
    pub fn forward(
        &self,
        features: FeatureMaps<B>,
        attention: Option<&InjectedAttention<B>>,
    ) -> PyramidFeatures<B> {
        let FeatureMaps {
            shallow: x2,
            mid: x1,
            deep: x0,
        } = features;

        // -------- SPP on the deepest map --------
        let p5 = self.conv1.forward(x0);
        let p5 = self.spp.forward(p5);
        let p5 = self.conv2.forward(p5); // [B, 512, H/32, W/32]

        // -------- Top-down --------
        let p5_upsample = self.upsample1.forward(p5.clone());
        let p5_upsample = match attention {
            Some(att) => att.upsample1.forward(p5_upsample),
            None => p5_upsample,
        };

        let p4 = self.conv_for_p4.forward(x1);
        let p4 = Tensor::cat(vec![p4, p5_upsample], 1);
        let p4 = self.make_five_conv1.forward(p4); // [B, 256, H/16, W/16]

        let p4_upsample = self.upsample2.forward(p4.clone());
        let p4_upsample = match attention {
            Some(att) => att.upsample2.forward(p4_upsample),
            None => p4_upsample,
        };

        let p3 = self.conv_for_p3.forward(x2);
        let p3 = Tensor::cat(vec![p3, p4_upsample], 1);
        let p3 = self.make_five_conv2.forward(p3); // [B, 128, H/8, W/8]

        // -------- Bottom-up --------
        let p3_downsample = self.down_sample1.forward(p3.clone());
        let p4 = Tensor::cat(vec![p3_downsample, p4], 1);
        let p4 = self.make_five_conv3.forward(p4); // [B, 256, H/16, W/16]

        let p4_downsample = self.down_sample2.forward(p4.clone());
        let p5 = Tensor::cat(vec![p4_downsample, p5], 1);
        let p5 = self.make_five_conv4.forward(p5); // [B, 512, H/32, W/32]

        log::debug!(
            "neck out: p3={:?} p4={:?} p5={:?}",
            p3.dims(),
            p4.dims(),
            p5.dims()
        );

        PyramidFeatures { p3, p4, p5 }
    }
}
