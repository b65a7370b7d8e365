use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use clap::Parser;
use notescan::{encode, save_png, settings, sort_pages, Options};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Convert scanned, hand-written notes to compact paletted PNGs
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Files to convert
    #[arg(required = true, value_name = "IMAGE")]
    files: Vec<PathBuf>,

    /// Output PNG filename base
    #[arg(short, long, default_value = "output_page_")]
    basename: String,

    /// Background value threshold %
    #[arg(short, long, value_name = "PERCENT", default_value = "25", value_parser = percent)]
    value_threshold: f32,

    /// Background saturation threshold %
    #[arg(short, long, value_name = "PERCENT", default_value = "20", value_parser = percent)]
    sat_threshold: f32,

    /// Number of output colors
    #[arg(short, long, default_value_t = settings::NUM_COLORS)]
    num_colors: usize,

    /// % of foreground pixels to sample for the palette
    #[arg(short = 'q', long, value_name = "PERCENT", default_value = "5", value_parser = percent)]
    sample_fraction: f32,

    /// Do not stretch the palette
    #[arg(short = 'S', long)]
    no_saturate: bool,

    /// Make the background white
    #[arg(short, long)]
    white_background: bool,

    /// Do not run pngcrush
    #[arg(short = 'C', long)]
    no_crush: bool,

    /// Pixel density written into the PNGs
    #[arg(long, default_value_t = settings::DPI)]
    dpi: u32,

    /// Seed for pixel sampling, for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

fn percent(s: &str) -> Result<f32, String> {
    s.parse::<f32>()
        .map(|p| p / 100.0)
        .map_err(|e| format!("{:?} is not a percentage: {}", s, e))
}

fn have_pngcrush() -> bool {
    Command::new("pngcrush")
        .arg("-q")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Runs pngcrush on `input`, returning the crushed file on success.
fn crush(input: &Path) -> Option<PathBuf> {
    let output = input.with_file_name(format!(
        "{}_crush.png",
        input.file_stem()?.to_string_lossy()
    ));
    let status = Command::new("pngcrush")
        .arg("-q")
        .arg(input)
        .arg(&output)
        .status()
        .ok()?;
    if !status.success() {
        return None;
    }

    let before = fs::metadata(input).ok()?.len();
    let after = fs::metadata(&output).ok()?.len();
    let reduction = 100.0 * (1.0 - after as f64 / before.max(1) as f64);
    info!(output = %output.display(), "pngcrush: {:.1}% reduction", reduction);
    Some(output)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let args = Args::parse();
    let options = Options::new()
        .value_threshold(args.value_threshold)
        .sat_threshold(args.sat_threshold)
        .num_colors(args.num_colors)
        .sample_fraction(args.sample_fraction)
        .saturate(!args.no_saturate)
        .white_background(args.white_background)
        .seed(args.seed);
    options.validate()?;

    let mut rng = options.rng();
    let mut use_crush = !args.no_crush && have_pngcrush();
    let mut outputs = Vec::new();

    for input in sort_pages(args.files) {
        let image = match image::open(&input) {
            Ok(image) => image.into_rgb8(),
            Err(err) => {
                warn!(input = %input.display(), "error opening: {}", err);
                continue;
            }
        };
        info!(input = %input.display(), "opened");

        let encoded = encode(&image, &options, &mut rng)?;
        for color in &encoded.palette.palette {
            println!("  {}", color);
        }

        let output = PathBuf::from(format!("{}{:04}.png", args.basename, outputs.len()));
        save_png(&encoded, &output, args.dpi)?;

        if use_crush {
            match crush(&output) {
                Some(crushed) => {
                    outputs.push(crushed);
                    continue;
                }
                None => {
                    warn!("pngcrush failed, not trying again");
                    use_crush = false;
                }
            }
        }
        outputs.push(output);
    }

    info!(pages = outputs.len(), "done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn percentages() {
        assert_eq!(percent("25"), Ok(0.25));
        assert_eq!(percent("5"), Ok(0.05));
        assert_eq!(percent("12.5"), Ok(0.125));
        assert!(percent("abc").is_err());
        assert!(percent("").is_err());
        assert!(percent("25%").is_err());
    }

    #[test]
    fn arguments() {
        Args::command().debug_assert();

        let args = Args::try_parse_from(["notescan", "-v", "30", "-n", "4", "a.png"]).unwrap();
        assert_eq!(args.value_threshold, 0.3);
        assert_eq!(args.sat_threshold, 0.2);
        assert_eq!(args.sample_fraction, 0.05);
        assert_eq!(args.num_colors, 4);
        assert_eq!(args.basename, "output_page_");
        assert_eq!(args.files, vec![PathBuf::from("a.png")]);

        assert!(Args::try_parse_from(["notescan"]).is_err());
        assert!(Args::try_parse_from(["notescan", "-s", "lots", "a.png"]).is_err());
    }

    #[test]
    fn crush_falls_back_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        // fails whether or not pngcrush is installed
        assert_eq!(crush(&dir.path().join("missing.png")), None);
        assert_eq!(crush(Path::new("")), None);
    }
}
