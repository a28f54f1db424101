use std::path::{Path, PathBuf};

/// Explicit pipeline configuration; all paths are carried here rather than
/// looked up from the process working directory.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory containing the input genome (.fasta) files.
    pub input_dir: PathBuf,
    /// Directory where all artifacts (pair records, matrix, newick, image)
    /// are written.
    pub output_dir: PathBuf,
    /// Output image width in inches.
    pub width_inch: f64,
    /// Output image height in inches.
    pub height_inch: f64,
    /// Output image resolution in dots per inch.
    pub dpi: u32,
    /// File name of the rendered dendrogram, relative to `output_dir`.
    pub image_name: String,
}

impl Config {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Config {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            width_inch: 12.0,
            height_inch: 8.0,
            dpi: 300,
            image_name: "phylogenetic_tree.png".to_string(),
        }
    }

    pub fn matrix_path(&self) -> PathBuf {
        self.output_dir.join("distances.txt")
    }

    pub fn newick_path(&self) -> PathBuf {
        self.output_dir.join("tree.newick")
    }

    pub fn linkage_path(&self) -> PathBuf {
        self.output_dir.join("linkage.json")
    }

    pub fn image_path(&self) -> PathBuf {
        self.output_dir.join(&self.image_name)
    }

    /// Path of the persisted record for one directional pair.
    pub fn pair_record_path(&self, reference: &str, query: &str) -> PathBuf {
        self.output_dir.join(format!("{}_vs_{}.out", reference, query))
    }

    /// Image size in pixels, derived from inches and dpi.
    pub fn image_size_px(&self) -> (u32, u32) {
        (
            (self.width_inch * self.dpi as f64).round() as u32,
            (self.height_inch * self.dpi as f64).round() as u32,
        )
    }

    pub fn fasta_path(&self, sample: &str) -> PathBuf {
        self.input_dir.join(format!("{}.fasta", sample))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(Path::new("."), Path::new("."))
    }
}
