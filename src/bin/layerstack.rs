use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "layerstack", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a stack description into a PNG.
    Compose(ComposeArgs),
    /// Print the layers of a stack description.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Input stack JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Output width; overrides the description.
    #[arg(long)]
    width: Option<u32>,

    /// Output height; overrides the description.
    #[arg(long)]
    height: Option<u32>,

    /// Allocate a fresh buffer for every layer.
    #[arg(long)]
    no_reuse: bool,

    /// Print composition statistics.
    #[arg(long)]
    stats: bool,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input stack JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn output_size(
    desc: &layerstack::StackDesc,
    width: Option<u32>,
    height: Option<u32>,
) -> anyhow::Result<layerstack::Size> {
    let declared = desc.size;
    let width = width
        .or(declared.map(|s| s.width))
        .context("output width missing: set \"size\" in the stack or pass --width")?;
    let height = height
        .or(declared.map(|s| s.height))
        .context("output height missing: set \"size\" in the stack or pass --height")?;
    Ok(layerstack::Size::new(width, height)?)
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let desc = layerstack::StackDesc::load(&args.in_path)?;
    let size = output_size(&desc, args.width, args.height)?;

    let base_dir = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let stack = desc.build(base_dir)?;

    let mut opts = desc.compositor_opts();
    opts.reuse_scratch = !args.no_reuse;
    let mut compositor = layerstack::Compositor::new(opts);
    let (composed, stats) =
        futures::executor::block_on(compositor.compose_with_stats(&stack, size))?;

    if args.stats {
        eprintln!(
            "layers: {} blended / {} total, suspended resolutions: {}, buffers: {} reused / {} allocated",
            stats.layers_blended,
            stats.layers_total,
            stats.suspended_resolutions,
            stats.buffers_reused,
            stats.buffers_allocated
        );
    }

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    composed
        .to_rgba_image()?
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let desc = layerstack::StackDesc::load(&args.in_path)?;
    match desc.size {
        Some(size) => println!("size: {size}"),
        None => println!("size: (from command line)"),
    }
    if let Some(bg) = &desc.background {
        println!("background: {}", describe(bg));
    }
    if let Some(rgba) = desc.clear_rgba {
        println!("clear: {rgba:?}");
    }
    for (index, layer) in desc.layers.iter().enumerate() {
        let size = layer
            .size
            .map_or_else(|| "destination".to_owned(), |s| s.to_string());
        println!(
            "layer {index}: {} blend={:?} opacity={} size={size} align={:?}/{:?} fit={:?}",
            describe(&layer.source),
            layer.style.blend,
            layer.style.opacity,
            layer.style.align_x,
            layer.style.align_y,
            layer.style.output,
        );
    }
    Ok(())
}

fn describe(source: &layerstack::SourceDesc) -> String {
    use layerstack::{FilterDesc, SourceDesc};

    fn filters(list: &[FilterDesc]) -> String {
        list.iter()
            .map(|f| match f {
                FilterDesc::Rotation { angle_deg } => format!("rotation({angle_deg})"),
                FilterDesc::Grayscale => "grayscale".to_owned(),
                FilterDesc::Negative => "negative".to_owned(),
                FilterDesc::Opacity { value } => format!("opacity({value})"),
                FilterDesc::Blur { radius_px, .. } => format!("blur({radius_px})"),
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    match source {
        SourceDesc::Image { path } => format!("image '{path}'"),
        SourceDesc::Solid { rgba } => format!("solid {rgba:?}"),
        SourceDesc::Filters { filters: list } if list.is_empty() => "pass-through".to_owned(),
        SourceDesc::Filters { filters: list } => format!("adjust [{}]", filters(list)),
        SourceDesc::Filtered {
            source,
            filters: list,
        } => format!("{} | [{}]", describe(source), filters(list)),
        SourceDesc::Rotate { source, angle_deg } => {
            format!("{} rotated {angle_deg}deg", describe(source))
        }
    }
}
