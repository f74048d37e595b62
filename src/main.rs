use anyhow::{bail, Context};
use burn::backend::NdArray;
use burn::prelude::*;
use burn::tensor::Distribution;
use clap::Parser;

use yolov4_attention::{AttentionKind, ModelConfig};

type MyBackend = NdArray;

/// Build the YOLOv4 body, run one forward pass and report its shapes.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML model config; overrides --anchors/--classes/--phi/--attention
    #[arg(short, long)]
    config: Option<String>,

    /// Anchor boxes per scale
    #[arg(long, default_value_t = 3)]
    anchors: usize,

    /// Number of classes
    #[arg(long, default_value_t = 80)]
    classes: usize,

    /// Attention selector: 0 = none, 1 = se, 2 = cbam, 3 = eca, 4 = ema, 5 = ca
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    phi: i64,

    /// Attention variant by name (se, cbam, eca, ema, coordinate_attention)
    #[arg(long, conflicts_with = "phi")]
    attention: Option<AttentionKind>,

    /// Input height and width, a multiple of 32
    #[arg(short, long, default_value_t = 416)]
    size: usize,

    /// Batch size of the dummy input
    #[arg(short, long, default_value_t = 1)]
    batch: usize,

    /// Write the resolved config to this YAML file
    #[arg(long)]
    save_config: Option<String>,
}

/// The dummy input must survive five stride-2 stages and hold at least one image.
fn check_input(size: usize, batch: usize) -> anyhow::Result<()> {
    if size == 0 || size % 32 != 0 {
        bail!("--size must be a positive multiple of 32, got {size}");
    }
    if batch == 0 {
        bail!("--batch must be at least 1");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ModelConfig::from_yaml(path)
            .with_context(|| format!("failed to load config {path}"))?,
        None => match args.attention {
            Some(kind) => ModelConfig::new(args.anchors, args.classes, Some(kind)),
            None => ModelConfig::with_phi(args.anchors, args.classes, args.phi)?,
        },
    };

    check_input(args.size, args.batch)?;

    if let Some(path) = &args.save_config {
        config
            .save(path)
            .with_context(|| format!("failed to save config {path}"))?;
        log::info!("config written to {path}");
    }

    let device = <MyBackend as Backend>::Device::default();
    let model = config.init::<MyBackend>(&device)?;

    println!("YOLOv4 body");
    println!("  anchors    : {}", config.num_anchors);
    println!("  classes    : {}", config.num_classes);
    println!(
        "  attention  : {}",
        config
            .attention
            .map_or_else(|| "none".to_string(), |kind| kind.to_string())
    );
    println!("  parameters : {}", model.num_params());

    let input = Tensor::<MyBackend, 4>::random(
        [args.batch, 3, args.size, args.size],
        Distribution::Default,
        &device,
    );
    let (out0, out1, out2) = model.forward(input);

    println!("  out0 (stride 32): {:?}", out0.dims());
    println!("  out1 (stride 16): {:?}", out1.dims());
    println!("  out2 (stride  8): {:?}", out2.dims());

    Ok(())
}
