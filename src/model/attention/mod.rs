//! Shape-preserving attention modules and their injection into the body.
//!
//! The variant is chosen once at construction. A body built without
//! attention carries no attention parameters at all.

pub mod cbam;
pub mod coord;
pub mod eca;
pub mod ema;
pub mod se;

use std::fmt;
use std::str::FromStr;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use cbam::CbamBlock;
pub use coord::CoordAttention;
pub use eca::EcaBlock;
pub use ema::EmaBlock;
pub use se::SeBlock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionKind {
    Se,
    Cbam,
    Eca,
    Ema,
    CoordinateAttention,
}

impl AttentionKind {
    /// Registry order, matching the legacy `phi` numbering (1-based).
    pub const ALL: [AttentionKind; 5] = [
        AttentionKind::Se,
        AttentionKind::Cbam,
        AttentionKind::Eca,
        AttentionKind::Ema,
        AttentionKind::CoordinateAttention,
    ];

    /// `0` disables attention, `1..=5` picks a variant, anything else is an error.
    pub fn from_phi(phi: i64) -> Result<Option<Self>> {
        match phi {
            0 => Ok(None),
            1 => Ok(Some(AttentionKind::Se)),
            2 => Ok(Some(AttentionKind::Cbam)),
            3 => Ok(Some(AttentionKind::Eca)),
            4 => Ok(Some(AttentionKind::Ema)),
            5 => Ok(Some(AttentionKind::CoordinateAttention)),
            other => Err(Error::InvalidPhi(other)),
        }
    }

    pub fn phi(self) -> i64 {
        match self {
            AttentionKind::Se => 1,
            AttentionKind::Cbam => 2,
            AttentionKind::Eca => 3,
            AttentionKind::Ema => 4,
            AttentionKind::CoordinateAttention => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AttentionKind::Se => "se",
            AttentionKind::Cbam => "cbam",
            AttentionKind::Eca => "eca",
            AttentionKind::Ema => "ema",
            AttentionKind::CoordinateAttention => "coordinate_attention",
        }
    }

    pub fn build<B: Backend>(self, device: &B::Device, channels: usize) -> Attention<B> {
        match self {
            AttentionKind::Se => Attention::Se(SeBlock::new(device, channels)),
            AttentionKind::Cbam => Attention::Cbam(CbamBlock::new(device, channels)),
            AttentionKind::Eca => Attention::Eca(EcaBlock::new(device, channels)),
            AttentionKind::Ema => Attention::Ema(EmaBlock::new(device, channels)),
            AttentionKind::CoordinateAttention => {
                Attention::Coordinate(CoordAttention::new(device, channels))
            }
        }
    }
}

impl fmt::Display for AttentionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AttentionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        AttentionKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .or(match s.as_str() {
                "ca" | "coord" => Some(AttentionKind::CoordinateAttention),
                _ => None,
            })
            .ok_or(Error::UnknownAttention(s))
    }
}

/// One attention module bound to a fixed channel width.
#[derive(Module, Debug)]
pub enum Attention<B: Backend> {
    Se(SeBlock<B>),
    Cbam(CbamBlock<B>),
    Eca(EcaBlock<B>),
    Ema(EmaBlock<B>),
    Coordinate(CoordAttention<B>),
}

impl<B: Backend> Attention<B> {
    pub fn kind(&self) -> AttentionKind {
        match self {
            Attention::Se(_) => AttentionKind::Se,
            Attention::Cbam(_) => AttentionKind::Cbam,
            Attention::Eca(_) => AttentionKind::Eca,
            Attention::Ema(_) => AttentionKind::Ema,
            Attention::Coordinate(_) => AttentionKind::CoordinateAttention,
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Attention::Se(m) => m.forward(x),
            Attention::Cbam(m) => m.forward(x),
            Attention::Eca(m) => m.forward(x),
            Attention::Ema(m) => m.forward(x),
            Attention::Coordinate(m) => m.forward(x),
        }
    }
}

/// The five attention points of the body, all of one variant.
#[derive(Module, Debug)]
pub struct InjectedAttention<B: Backend> {
    pub x0: Attention<B>,
    pub x1: Attention<B>,
    pub x2: Attention<B>,
    pub upsample1: Attention<B>,
    pub upsample2: Attention<B>,
}

impl<B: Backend> InjectedAttention<B> {
    /// `channels` are the widths of `[x0, x1, x2, upsample1, upsample2]`.
    pub fn new(device: &B::Device, kind: AttentionKind, channels: [usize; 5]) -> Self {
        let [x0, x1, x2, upsample1, upsample2] = channels;
        Self {
            x0: kind.build(device, x0),
            x1: kind.build(device, x1),
            x2: kind.build(device, x2),
            upsample1: kind.build(device, upsample1),
            upsample2: kind.build(device, upsample2),
        }
    }

    pub fn kind(&self) -> AttentionKind {
        self.x0.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::{Distribution, ElementConversion};

    type TestBackend = NdArray;

    #[test]
    fn phi_maps_to_registry_order() {
        for (i, kind) in AttentionKind::ALL.into_iter().enumerate() {
            let phi = i as i64 + 1;
            assert_eq!(AttentionKind::from_phi(phi).unwrap(), Some(kind));
            assert_eq!(kind.phi(), phi);
        }
        assert_eq!(AttentionKind::from_phi(0).unwrap(), None);
    }

    #[test]
    fn invalid_phi_is_an_error() {
        for phi in [-3, -1, 6, 42] {
            assert!(matches!(
                AttentionKind::from_phi(phi),
                Err(Error::InvalidPhi(p)) if p == phi
            ));
        }
    }

    #[test]
    fn parses_names() {
        for kind in AttentionKind::ALL {
            assert_eq!(kind.to_string().parse::<AttentionKind>().unwrap(), kind);
        }
        assert_eq!(
            "CA".parse::<AttentionKind>().unwrap(),
            AttentionKind::CoordinateAttention
        );
        assert!("transformer".parse::<AttentionKind>().is_err());
    }

    #[test]
    fn every_variant_preserves_shape() {
        let device = Default::default();
        for kind in AttentionKind::ALL {
            for shape in [[2, 64, 8, 8], [1, 128, 5, 7], [1, 256, 1, 1]] {
                let module = kind.build::<TestBackend>(&device, shape[1]);
                assert_eq!(module.kind(), kind);

                let x = Tensor::<TestBackend, 4>::random(shape, Distribution::Default, &device);
                assert_eq!(module.forward(x).dims(), shape, "{kind} changed the shape");
            }
        }
    }

    #[test]
    fn every_variant_reweights_values() {
        let device = Default::default();
        for kind in AttentionKind::ALL {
            let module = kind.build::<TestBackend>(&device, 64);
            let x = Tensor::<TestBackend, 4>::random([1, 64, 6, 6], Distribution::Default, &device)
                + 1.0;

            let diff: f32 = (module.forward(x.clone()) - x).abs().max().into_scalar().elem();
            assert!(diff > 0.0, "{kind} acted as identity");
        }
    }

    #[test]
    fn injected_attention_binds_widths() {
        let device = Default::default();
        let injected = InjectedAttention::<TestBackend>::new(
            &device,
            AttentionKind::Se,
            [64, 32, 16, 16, 8],
        );
        assert_eq!(injected.kind(), AttentionKind::Se);

        let x = Tensor::<TestBackend, 4>::random([1, 16, 4, 4], Distribution::Default, &device);
        assert_eq!(injected.upsample1.forward(x.clone()).dims(), [1, 16, 4, 4]);
        assert_eq!(injected.x2.forward(x).dims(), [1, 16, 4, 4]);
    }
}
