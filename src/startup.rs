use crate::clustering::{average_linkage, build_tree};
use crate::config::Config;
use crate::error::PipelineError;
use crate::{matrix, newick, pairwise, plotting};
use std::error::Error;
use std::fs;

/// Run the complete pipeline: pairwise distance estimation, matrix assembly,
/// average-linkage clustering, Newick serialization and dendrogram rendering.
pub fn run(config: &Config) -> Result<(), Box<dyn Error>> {
    if !config.output_dir.exists() {
        fs::create_dir_all(&config.output_dir)?;
    }

    let samples = pairwise::discover_samples(&config.input_dir)?;
    eprintln!("Found {} genomes in {}", samples.len(), config.input_dir.display());
    if samples.len() < 2 {
        return Err(PipelineError::InsufficientInput { n: samples.len() }.into());
    }

    pairwise::estimate_all_pairs(config, &samples)?;

    eprintln!("Creating matrix");
    let dist_matrix = matrix::assemble(samples.len(), |i, j| {
        let path = config.pair_record_path(&samples[i], &samples[j]);
        pairwise::read_pair_distance(&path)
    })?;
    matrix::write_matrix(&config.matrix_path(), &dist_matrix)?;
    eprintln!("Matrix saved to {}", config.matrix_path().display());

    // Cluster from the persisted file rather than the in-memory matrix, so
    // the text grid on disk is always sufficient to reproduce the tree.
    let dist_matrix = matrix::read_matrix(&config.matrix_path())?;
    let condensed = matrix::condensed(&dist_matrix)?;

    let dendrogram = average_linkage(&condensed, samples.len())?;
    let json_file = fs::File::create(config.linkage_path())?;
    serde_json::to_writer_pretty(json_file, &dendrogram)?;

    let root = build_tree(&dendrogram, samples.len())?;
    let newick_string = newick::to_newick(&root, &samples)?;
    newick::write_newick(&config.newick_path(), &newick_string)?;
    println!("{}", newick_string);
    eprintln!("Newick tree saved to {}", config.newick_path().display());

    plotting::plot_dendrogram(&root, &samples, config)?;
    eprintln!("Image saved to {}", config.image_path().display());

    Ok(())
}
