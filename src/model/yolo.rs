use burn::prelude::*;

use super::attention::{AttentionKind, InjectedAttention};
use super::backbone::{Backbone, CspDarknet53, FeatureMaps};
use super::head::YoloHead;
use super::neck::{Neck, PyramidFeatures};

/// Raw head outputs, deepest first: `(out0, out1, out2)` at strides 32, 16, 8.
/// Anchor decoding downstream relies on this order.
pub type YoloOutput<B> = (Tensor<B, 4>, Tensor<B, 4>, Tensor<B, 4>);

#[derive(Module, Debug)]
pub struct YoloBody<B: Backend> {
    pub backbone: CspDarknet53<B>,
    pub attention: Option<InjectedAttention<B>>,
    pub neck: Neck<B>,
    pub yolo_head3: YoloHead<B>,
    pub yolo_head2: YoloHead<B>,
    pub yolo_head1: YoloHead<B>,
    num_anchors: usize,
    num_classes: usize,
}

impl<B: Backend> YoloBody<B> {
    pub fn new(
        device: &B::Device,
        num_anchors: usize,
        num_classes: usize,
        attention: Option<AttentionKind>,
    ) -> Self {
        let final_out_filter = num_anchors * (5 + num_classes);

        let backbone = CspDarknet53::new(device);
        let neck = Neck::new(device);

        let attention = attention.map(|kind| {
            let [x2, x1, x0] = backbone.out_channels();
            let [up1, up2] = neck.upsample_channels();
            InjectedAttention::new(device, kind, [x0, x1, x2, up1, up2])
        });

        let body = Self {
            backbone,
            attention,
            neck,
            yolo_head3: YoloHead::new(device, [256, final_out_filter], 128),
            yolo_head2: YoloHead::new(device, [512, final_out_filter], 256),
            yolo_head1: YoloHead::new(device, [1024, final_out_filter], 512),
            num_anchors,
            num_classes,
        };

        log::info!(
            "YoloBody init: num_anchors={} num_classes={} out_channels={} attention={} params={}",
            num_anchors,
            num_classes,
            final_out_filter,
            body.attention_kind()
                .map_or_else(|| "none".to_string(), |kind| kind.to_string()),
            body.num_params()
        );

        body
    }

    pub fn num_anchors(&self) -> usize {
        self.num_anchors
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn output_channels(&self) -> usize {
        self.num_anchors * (5 + self.num_classes)
    }

    pub fn attention_kind(&self) -> Option<AttentionKind> {
        self.attention.as_ref().map(InjectedAttention::kind)
    }

    /// `[B, 3, H, W]` with `H` and `W` divisible by 32.
    pub fn forward(&self, x: Tensor<B, 4>) -> YoloOutput<B> {
        let features = self.backbone.forward(x);
        let features = match &self.attention {
            Some(att) => FeatureMaps {
                shallow: att.x2.forward(features.shallow),
                mid: att.x1.forward(features.mid),
                deep: att.x0.forward(features.deep),
            },
            None => features,
        };

        let PyramidFeatures { p3, p4, p5 } =
            self.neck.forward(features, self.attention.as_ref());

        let out2 = self.yolo_head3.forward(p3);
        let out1 = self.yolo_head2.forward(p4);
        let out0 = self.yolo_head1.forward(p5);

        log::debug!(
            "YoloBody out: out0={:?} out1={:?} out2={:?}",
            out0.dims(),
            out1.dims(),
            out2.dims()
        );

        (out0, out1, out2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::{Distribution, ElementConversion};

    type TestBackend = NdArray;

    fn max_abs_diff(a: Tensor<TestBackend, 4>, b: Tensor<TestBackend, 4>) -> f32 {
        (a - b).abs().max().into_scalar().elem()
    }

    #[test]
    fn outputs_are_deepest_first() {
        let device = Default::default();
        let body = YoloBody::<TestBackend>::new(&device, 3, 20, None);
        let x = Tensor::<TestBackend, 4>::random([1, 3, 64, 96], Distribution::Default, &device);

        let (out0, out1, out2) = body.forward(x);
        assert_eq!(out0.dims(), [1, 75, 2, 3]);
        assert_eq!(out1.dims(), [1, 75, 4, 6]);
        assert_eq!(out2.dims(), [1, 75, 8, 12]);
    }

    #[test]
    fn no_attention_allocates_nothing() {
        let device = Default::default();
        let body = YoloBody::<TestBackend>::new(&device, 3, 80, None);
        assert!(body.attention.is_none());
        assert_eq!(body.attention_kind(), None);
        assert_eq!(body.output_channels(), 255);
    }

    #[test]
    fn attention_adds_parameters_for_every_variant() {
        let device = Default::default();
        let plain = YoloBody::<TestBackend>::new(&device, 3, 80, None).num_params();

        for kind in AttentionKind::ALL {
            let body = YoloBody::<TestBackend>::new(&device, 3, 80, Some(kind));
            assert_eq!(body.attention_kind(), Some(kind));
            assert!(body.num_params() > plain, "{kind} added no parameters");
        }
    }

    #[test]
    fn attention_changes_values_not_shapes() {
        let device = Default::default();
        let body = YoloBody::<TestBackend>::new(&device, 3, 80, Some(AttentionKind::Eca));
        let plain = YoloBody {
            attention: None,
            ..body.clone()
        };

        let x = Tensor::<TestBackend, 4>::random([1, 3, 32, 32], Distribution::Default, &device);
        let (a0, a1, a2) = body.forward(x.clone());
        let (b0, b1, b2) = plain.forward(x);

        assert_eq!(a0.dims(), b0.dims());
        assert_eq!(a1.dims(), b1.dims());
        assert_eq!(a2.dims(), b2.dims());
        assert!(max_abs_diff(a2, b2) > 0.0);
    }

    #[test]
    fn forward_is_deterministic() {
        let device = Default::default();
        let body = YoloBody::<TestBackend>::new(&device, 1, 1, Some(AttentionKind::Se));
        let x = Tensor::<TestBackend, 4>::random([1, 3, 32, 32], Distribution::Default, &device);

        let (first, _, _) = body.forward(x.clone());
        let (second, _, _) = body.forward(x);
        assert_eq!(max_abs_diff(first, second), 0.0);
    }
}
