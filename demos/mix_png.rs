use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use framemix::{FrameBuffer, InputLayout, MixerConfig, MixerController, PixelFormat, VideoFormat};

/// Mix PNG images into one frame.
#[derive(Parser, Debug)]
#[command(name = "mix_png", version)]
struct Args {
    /// Input PNG, one per mixer input. Repeat for more inputs.
    #[arg(long = "in", required = true)]
    inputs: Vec<PathBuf>,

    /// Mixer config JSON. Defaults to a canvas the size of the first input.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Run sibling nodes on the rayon pool.
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let frames = args
        .inputs
        .iter()
        .map(|p| load_premul(p))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read config '{}'", path.display()))?;
            MixerConfig::from_json_str(&text)
                .with_context(|| format!("parse config '{}'", path.display()))?
        }
        None => default_config(&frames)?,
    };
    config.parallel |= args.parallel;
    anyhow::ensure!(
        config.input_count == frames.len(),
        "config expects {} inputs, got {}",
        config.input_count,
        frames.len()
    );

    let mut mixer = MixerController::new(config)?;
    for (i, frame) in frames.into_iter().enumerate() {
        mixer
            .push_frame(i, frame)
            .with_context(|| format!("push '{}'", args.inputs[i].display()))?;
    }
    let out = mixer
        .pull_mixed_frame()?
        .context("mixer produced no frame")?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let rgba = unpremultiply(&out)?;
    image::save_buffer_with_format(
        &args.out,
        &rgba,
        out.width(),
        out.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    tracing::info!(
        out = %args.out.display(),
        fingerprint = out.fingerprint(),
        "wrote mixed frame"
    );
    Ok(())
}

fn default_config(frames: &[FrameBuffer]) -> anyhow::Result<MixerConfig> {
    let first = frames.first().context("no inputs")?;
    let mut config = MixerConfig::new(frames.len(), VideoFormat::rgba(first.width(), first.height()));
    config.layouts = frames
        .iter()
        .map(|f| InputLayout {
            size: Some((f.width(), f.height())),
            ..InputLayout::default()
        })
        .collect();
    Ok(config)
}

fn load_premul(path: &PathBuf) -> anyhow::Result<FrameBuffer> {
    let img = image::open(path)
        .with_context(|| format!("open image '{}'", path.display()))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    let mut data = img.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
    Ok(FrameBuffer::from_data(w, h, PixelFormat::Rgba8Premul, data)?)
}

fn unpremultiply(frame: &FrameBuffer) -> anyhow::Result<Vec<u8>> {
    anyhow::ensure!(
        frame.pixel_format() == PixelFormat::Rgba8Premul,
        "expected rgba output, got {:?}",
        frame.pixel_format()
    );
    let mut data = frame.data().to_vec();
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
    Ok(data)
}
