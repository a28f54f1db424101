use clap::Parser;
use gdtree::config::Config;
use gdtree::startup;
use std::path::PathBuf;
use std::process;

/// Build a phylogenetic tree from pairwise genome distances
#[derive(Parser, Debug)]
#[command(name = "gdtree")]
#[command(about = "Cluster genomes by mash distance and render a phylogenetic tree", long_about = None)]
struct Args {
    /// Path where genome (.fasta) files are located
    #[arg(short = 'd', long = "dir")]
    directory: PathBuf,

    /// Directory to save results (default: current directory)
    #[arg(short = 'o', long = "out")]
    output_directory: Option<PathBuf>,

    /// Width of the output image in inches
    #[arg(short = 'W', long = "width", default_value_t = 12.0)]
    width_inch: f64,

    /// Height of the output image in inches
    #[arg(short = 'H', long = "height", default_value_t = 8.0)]
    height_inch: f64,

    /// Dots per inch for the output image
    #[arg(short = 'D', long = "dpi", default_value_t = 300)]
    dpi: u32,

    /// Name of the output image file
    #[arg(long = "img", default_value = "phylogenetic_tree.png")]
    output_image: String,
}

fn main() {
    // Help and argument errors both exit non-zero with usage printed.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            e.print().ok();
            process::exit(1);
        }
    };

    let output_dir = args
        .output_directory
        .unwrap_or_else(|| PathBuf::from("."));
    let mut config = Config::new(args.directory, output_dir);
    config.width_inch = args.width_inch;
    config.height_inch = args.height_inch;
    config.dpi = args.dpi;
    config.image_name = args.output_image;

    if let Err(e) = startup::run(&config) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
