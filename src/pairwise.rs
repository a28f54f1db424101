use crate::config::Config;
use crate::error::PipelineError;
use itertools::Itertools;
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;

/// List the sample names in the input directory: every `.fasta` file, with
/// the extension stripped. Names are sorted so the canonical sample index
/// order is reproducible across filesystems.
pub fn discover_samples(input_dir: &Path) -> Result<Vec<String>, PipelineError> {
    let mut samples = Vec::new();
    for entry in fs::read_dir(input_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("fasta") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                samples.push(stem.to_string());
            }
        }
    }
    samples.sort();
    Ok(samples)
}

/// Run the external distance estimator for every ordered sample pair and
/// persist each record to `<ref>_vs_<query>.out` under the output directory.
///
/// Pairs run in parallel; the function only returns Ok once every record has
/// been written, so the matrix builder never sees a partial set.
pub fn estimate_all_pairs(config: &Config, samples: &[String]) -> Result<(), PipelineError> {
    let pairs: Vec<(&String, &String)> = samples
        .iter()
        .cartesian_product(samples.iter())
        .filter(|(reference, query)| reference != query)
        .collect();

    pairs
        .par_iter()
        .try_for_each(|(reference, query)| estimate_pair(config, reference, query))
}

fn estimate_pair(config: &Config, reference: &str, query: &str) -> Result<(), PipelineError> {
    eprintln!("Running {} vs {}", reference, query);
    let ref_path = config.fasta_path(reference);
    let query_path = config.fasta_path(query);
    let output = Command::new("mash")
        .args(["dist", "-s", "1000000"])
        .arg(&ref_path)
        .arg(&query_path)
        .output()?;

    if !output.status.success() {
        return Err(PipelineError::ExternalTool {
            command: format!(
                "mash dist -s 1000000 {} {}",
                ref_path.display(),
                query_path.display()
            ),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    fs::write(config.pair_record_path(reference, query), &output.stdout)?;
    Ok(())
}

/// Read one persisted pair record: the distance is the third whitespace
/// separated token of the file. The value must be a finite, non-negative
/// number.
pub fn read_pair_distance(path: &Path) -> Result<f64, PipelineError> {
    let text = fs::read_to_string(path).map_err(|_| PipelineError::RecordUnavailable {
        path: path.to_path_buf(),
    })?;
    let token = text
        .split_whitespace()
        .nth(2)
        .ok_or_else(|| PipelineError::MalformedDistance {
            token: text.trim().to_string(),
            location: format!("{} (fewer than three fields)", path.display()),
        })?;
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| PipelineError::MalformedDistance {
            token: token.to_string(),
            location: path.display().to_string(),
        })
}
