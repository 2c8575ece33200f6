//! Command-line front end: argument definitions, validation, and runners.
//!
//! Three subcommands share one option set (inputs, gap, colors, output);
//! each adds its mode-specific knobs. Validation that doesn't need pixel
//! data happens before any file is decoded. Options bound to the other
//! masonry flow are warned about and ignored rather than rejected.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use image::DynamicImage;
use indicatif::{ProgressBar, ProgressStyle};

use crate::color::{self, CanvasColor};
use crate::error::MergeError;
use crate::layout::grid::{FitMode, GridConfig, SquareConfig};
use crate::layout::masonry::MasonryConfig;
use crate::layout::{Alignment, CanvasPlan, Flow};
use crate::loader;
use crate::render::{self, RenderOptions};

/// Merge image collections into masonry, grid, or square collages.
#[derive(Parser)]
#[command(name = "zenmosaic", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ragged-grid layout that preserves every image's aspect ratio
    Masonry(MasonryArgs),
    /// Uniform grid of fixed-aspect cells
    Grid(GridArgs),
    /// Uniform grid of square cells
    Square(SquareArgs),
}

/// Options shared by every layout mode.
#[derive(Args)]
pub struct SharedArgs {
    /// Image filepaths to merge (use --dir for a directory)
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Directory of images to merge
    #[arg(short, long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Recursively include subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Shuffle images to randomize their order in the grid
    #[arg(long)]
    pub shuffle: bool,

    /// Gap between images in pixels
    #[arg(short, long, value_name = "PX", default_value_t = 50)]
    pub gap: u32,

    /// How much to round the corners of each image
    #[arg(long, value_name = "PX", default_value_t = 0)]
    pub corner_radius: u32,

    /// Background color for the canvas (hex or a named color)
    #[arg(
        long = "bg",
        visible_alias = "canvas-color",
        value_name = "COLOR",
        default_value = "#ffffff"
    )]
    pub canvas_color: String,

    /// Output file path
    #[arg(short, long, value_name = "FILE", default_value = "./zenmosaic.png")]
    pub output: PathBuf,

    /// Skip the confirmation prompt for ignored files
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct MasonryArgs {
    #[command(flatten)]
    pub shared: SharedArgs,

    /// Height of each row; defaults to the average image height
    #[arg(long, value_name = "PX")]
    pub row_height: Option<u32>,

    /// Width of each column; defaults to the average image width
    #[arg(long, value_name = "PX")]
    pub column_width: Option<u32>,

    /// Width of the canvas (horizontal flow)
    #[arg(long, value_name = "PX")]
    pub canvas_width: Option<u32>,

    /// Height of the canvas (vertical flow)
    #[arg(long, value_name = "PX")]
    pub canvas_height: Option<u32>,

    /// Direction images flow through the layout
    #[arg(short, long, value_enum, default_value = "horizontal")]
    pub flow: FlowArg,

    /// Horizontal alignment of each row (horizontal flow)
    #[arg(long, value_enum)]
    pub h_align: Option<HAlign>,

    /// Vertical alignment of each column (vertical flow)
    #[arg(long, value_enum)]
    pub v_align: Option<VAlign>,
}

#[derive(Args)]
pub struct GridArgs {
    #[command(flatten)]
    pub shared: SharedArgs,

    /// Aspect ratio of every cell (16/9, 4:3, or a decimal like 1.777)
    #[arg(long, value_name = "RATIO", default_value = "1:1")]
    pub aspect_ratio: String,

    /// Width of each cell; defaults to the smallest image width
    #[arg(long, value_name = "PX")]
    pub image_width: Option<u32>,

    /// Number of columns
    #[arg(short, long, value_name = "N", default_value_t = 4)]
    pub columns: u32,
}

#[derive(Args)]
pub struct SquareArgs {
    #[command(flatten)]
    pub shared: SharedArgs,

    /// How each image fills its square cell
    #[arg(long, value_enum, default_value = "cover")]
    pub fit: FitArg,

    /// Side length of each cell; defaults to the smallest image width
    #[arg(long, value_name = "PX")]
    pub image_size: Option<u32>,

    /// Padding color behind contain-fitted images (hex or a named color)
    #[arg(long, value_name = "COLOR", default_value = "#ffffff")]
    pub padding_color: String,

    /// Number of columns
    #[arg(short, long, value_name = "N", default_value_t = 4)]
    pub columns: u32,
}

#[derive(Copy, Clone, ValueEnum)]
pub enum FlowArg {
    Horizontal,
    Vertical,
}

#[derive(Copy, Clone, ValueEnum)]
pub enum HAlign {
    Left,
    Center,
    Right,
    Justified,
}

#[derive(Copy, Clone, ValueEnum)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
    Justified,
}

#[derive(Copy, Clone, ValueEnum)]
pub enum FitArg {
    Cover,
    Contain,
}

/// Dispatch the parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Masonry(args) => run_masonry(args),
        Command::Grid(args) => run_grid(args),
        Command::Square(args) => run_square(args),
    }
}

fn run_masonry(args: MasonryArgs) -> Result<()> {
    let background = parse_color(&args.shared.canvas_color)?;
    check_output(&args.shared)?;
    let config = masonry_config(&args, background)?;

    let Some((_, images)) = gather_inputs(&args.shared)? else {
        return Ok(());
    };
    let plan = config.plan(&loader::dimensions(&images))?;
    finish(&images, &plan, &args.shared)
}

fn run_grid(args: GridArgs) -> Result<()> {
    let background = parse_color(&args.shared.canvas_color)?;
    check_output(&args.shared)?;
    let aspect = parse_aspect_ratio(&args.aspect_ratio).with_context(|| {
        format!(
            "invalid aspect ratio '{}': expected W/H, W:H, or a decimal",
            args.aspect_ratio
        )
    })?;

    let Some((_, images)) = gather_inputs(&args.shared)? else {
        return Ok(());
    };
    let mut config = GridConfig::new(args.columns)
        .aspect(aspect)
        .gap(args.shared.gap)
        .background(background);
    if let Some(px) = args.image_width {
        config = config.cell_width(px);
    }
    let plan = config.plan(&loader::dimensions(&images))?;
    finish(&images, &plan, &args.shared)
}

fn run_square(args: SquareArgs) -> Result<()> {
    let background = parse_color(&args.shared.canvas_color)?;
    let padding = color::parse(&args.padding_color)
        .with_context(|| format!("invalid padding color '{}'", args.padding_color))?;
    check_output(&args.shared)?;

    let Some((_, images)) = gather_inputs(&args.shared)? else {
        return Ok(());
    };
    let fit = match args.fit {
        FitArg::Cover => FitMode::Cover,
        FitArg::Contain => FitMode::Contain,
    };
    let mut config = SquareConfig::new(args.columns)
        .fit(fit)
        .padding(padding)
        .gap(args.shared.gap)
        .background(background);
    if let Some(px) = args.image_size {
        config = config.size(px);
    }
    let plan = config.plan(&loader::dimensions(&images))?;
    finish(&images, &plan, &args.shared)
}

/// Resolve the flow-dependent masonry options, warning about the ones the
/// chosen flow ignores.
fn masonry_config(args: &MasonryArgs, background: CanvasColor) -> Result<MasonryConfig> {
    let (flow, thickness, extent, alignment) = match args.flow {
        FlowArg::Horizontal => {
            warn_ignored(
                &[
                    ("--v-align", args.v_align.is_some()),
                    ("--canvas-height", args.canvas_height.is_some()),
                    ("--column-width", args.column_width.is_some()),
                ],
                "horizontal",
            );
            let extent = args
                .canvas_width
                .context("--canvas-width must be given for horizontal flow")?;
            let alignment = match args.h_align.unwrap_or(HAlign::Justified) {
                HAlign::Left => Alignment::Start,
                HAlign::Center => Alignment::Center,
                HAlign::Right => Alignment::End,
                HAlign::Justified => Alignment::Justified,
            };
            (Flow::Horizontal, args.row_height, extent, alignment)
        }
        FlowArg::Vertical => {
            warn_ignored(
                &[
                    ("--h-align", args.h_align.is_some()),
                    ("--canvas-width", args.canvas_width.is_some()),
                    ("--row-height", args.row_height.is_some()),
                ],
                "vertical",
            );
            let extent = args
                .canvas_height
                .context("--canvas-height must be given for vertical flow")?;
            let alignment = match args.v_align.unwrap_or(VAlign::Justified) {
                VAlign::Top => Alignment::Start,
                VAlign::Middle => Alignment::Center,
                VAlign::Bottom => Alignment::End,
                VAlign::Justified => Alignment::Justified,
            };
            (Flow::Vertical, args.column_width, extent, alignment)
        }
    };

    if extent as u64 <= 2 * args.shared.gap as u64 {
        bail!(
            "canvas extent ({extent}px) must exceed twice the gap ({}px)",
            args.shared.gap
        );
    }

    let mut config = MasonryConfig::new(flow, extent)
        .gap(args.shared.gap)
        .alignment(alignment)
        .background(background);
    if let Some(px) = thickness {
        config = config.thickness(px);
    }
    Ok(config)
}

/// Collect and decode the inputs. Returns `None` when the user declines the
/// ignored-files confirmation.
fn gather_inputs(shared: &SharedArgs) -> Result<Option<(Vec<PathBuf>, Vec<DynamicImage>)>> {
    let paths = if !shared.files.is_empty() {
        shared.files.clone()
    } else {
        let dir = shared
            .dir
            .as_ref()
            .context("you must specify either [FILES]... or --dir")?;
        let found = loader::discover(dir, shared.recursive)?;
        if !found.ignored.is_empty() {
            warn("These files will be ignored due to unsupported formats:");
            for file in &found.ignored {
                info(&file.display().to_string());
            }
            if !shared.yes && !confirm("Are you sure you want to continue?")? {
                info("Aborted.");
                return Ok(None);
            }
        }
        found.files
    };
    if paths.is_empty() {
        return Err(MergeError::NoInputs.into());
    }

    let bar = progress_bar(paths.len() as u64, "Loading images");
    let images = loader::load(&paths, Some(&bar))?;
    bar.finish_and_clear();

    Ok(Some(if shared.shuffle {
        loader::shuffle_together(paths, images)
    } else {
        (paths, images)
    }))
}

/// Render the plan and write the output file.
fn finish(images: &[DynamicImage], plan: &CanvasPlan, shared: &SharedArgs) -> Result<()> {
    let bar = progress_bar(plan.images.len() as u64, "Merging images");
    let options = RenderOptions {
        corner_radius: shared.corner_radius,
        progress: Some(&bar),
    };
    let canvas = render::render(images, plan, &options)?;
    bar.set_message("Writing to file");
    render::save(&canvas, &shared.output)?;
    bar.finish_and_clear();

    success(&format!(
        "Image has been created successfully: {}",
        shared.output.display().to_string().bold()
    ));
    Ok(())
}

fn parse_color(s: &str) -> Result<CanvasColor> {
    color::parse(s).with_context(|| format!("invalid canvas color '{s}'"))
}

fn check_output(shared: &SharedArgs) -> Result<()> {
    if !render::is_supported_output(&shared.output) {
        bail!(
            "invalid output format; choose one of: {}",
            render::OUTPUT_EXTENSIONS.join(", ")
        );
    }
    Ok(())
}

/// Parse an aspect ratio: `16/9`, `4:3`, or a decimal like `1.777`.
fn parse_aspect_ratio(s: &str) -> Option<f64> {
    let s = s.trim();
    let ratio = if let Some((w, h)) = s.split_once(['/', ':']) {
        let w: f64 = w.trim().parse().ok()?;
        let h: f64 = h.trim().parse().ok()?;
        w / h
    } else {
        s.parse().ok()?
    };
    (ratio.is_finite() && ratio > 0.0).then_some(ratio)
}

fn warn_ignored(options: &[(&str, bool)], flow: &str) {
    for (option, present) in options {
        if *present {
            warn(&format!("'{option}' option is ignored due to {flow} flow."));
        }
    }
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "Yes" | "YES"))
}

fn progress_bar(len: u64, stage: &str) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template(
            "{prefix:.dim} |{bar:40.blue}| {percent:>3}% | ETA: {eta} | {msg}...",
        )
        .unwrap()
        .progress_chars("██░"),
    );
    bar.set_prefix("Creating image:");
    bar.set_message(stage.to_string());
    bar
}

fn warn(msg: &str) {
    eprintln!("{} {}", "Warning:".yellow().bold(), msg.yellow());
}

fn info(msg: &str) {
    eprintln!("{}", msg.dimmed());
}

fn success(msg: &str) {
    println!("{} {}", "Success:".green().bold(), msg.green());
}
