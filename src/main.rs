use std::error::Error;
use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::Parser;

use volume_slicer::{BitDepth, Plane, PngSink, SliceOptions, ToneMap, run};

/// Slice a medical imaging volume into grayscale PNG images.
#[derive(Parser)]
#[command(name = "volume-slicer", version, about, long_about = None)]
struct Cli {
    /// Path to a NIfTI volume (.nii/.nii.gz) or a directory of .dcm slices
    input: PathBuf,

    /// Anatomical plane to iterate (volume inputs only)
    #[arg(short, long, default_value_t = Plane::Axial)]
    plane: Plane,

    /// Output pixel width: 8 or 16
    #[arg(short, long, default_value_t = BitDepth::Eight)]
    bit_depth: BitDepth,

    /// Intensity normalization: disabled or percentile-clamp
    #[arg(short, long, default_value_t = ToneMap::Disabled)]
    tone_map: ToneMap,

    /// Percentile used by percentile-clamp, 0-100
    #[arg(short, long, default_value_t = 99.0)]
    clamp_percentile: f32,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(error) = slice(&cli) {
        eprintln!("error: {error}");
        let mut cause = error.source();
        while let Some(source) = cause {
            eprintln!("  caused by: {source}");
            cause = source.source();
        }
        process::exit(1);
    }
}

fn slice(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let options = SliceOptions {
        plane: cli.plane,
        bit_depth: cli.bit_depth,
        tone_map: cli.tone_map,
        clamp_percentile: cli.clamp_percentile,
    };

    let output_dir = output_dir_for(&cli.input);
    if !output_dir.exists() {
        fs::create_dir_all(&output_dir)?;
        println!("Created output dir: {}", output_dir.display());
    }

    let mut sink = PngSink::new(output_dir, options.plane);
    let summary = run(&cli.input, &options, &mut sink)?;

    println!("Wrote {} images", summary.frames);
    Ok(())
}

/// `output/` inside a directory input, next to a file input.
fn output_dir_for(input: &Path) -> PathBuf {
    if input.is_dir() {
        input.join("output")
    } else {
        input
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .join("output")
    }
}
