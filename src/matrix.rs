use crate::error::PipelineError;
use itertools::Itertools;
use ndarray::Array2;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Assemble the N×N distance matrix for `n` samples.
///
/// `distance(i, j)` supplies the previously computed scalar distance for the
/// ordered pair (i, j); it is called exactly once per ordered pair with
/// i != j. The diagonal is fixed at zero and never read from input. Row i
/// stores d(i, j) as supplied, so symmetry is inherited from the estimator
/// rather than enforced here.
pub fn assemble<F>(n: usize, mut distance: F) -> Result<Array2<f64>, PipelineError>
where
    F: FnMut(usize, usize) -> Result<f64, PipelineError>,
{
    let mut matrix = Array2::<f64>::zeros((n, n));
    for (i, j) in (0..n).cartesian_product(0..n) {
        if i != j {
            matrix[[i, j]] = distance(i, j)?;
        }
    }
    validate(&matrix)?;
    Ok(matrix)
}

/// Check the matrix invariants: square, finite, non-negative, zero diagonal.
pub fn validate(matrix: &Array2<f64>) -> Result<(), PipelineError> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(PipelineError::MalformedMatrix {
            detail: format!("expected a square matrix, got {}x{}", rows, cols),
        });
    }
    for ((i, j), &value) in matrix.indexed_iter() {
        if !value.is_finite() || value < 0.0 {
            return Err(PipelineError::MalformedMatrix {
                detail: format!("entry ({}, {}) is {}", i, j, value),
            });
        }
        if i == j && value != 0.0 {
            return Err(PipelineError::MalformedMatrix {
                detail: format!("diagonal entry ({}, {}) is {}, expected 0", i, j, value),
            });
        }
    }
    Ok(())
}

/// Flatten the upper triangle in row-major order: the condensed form consumed
/// by clustering, length N(N-1)/2.
pub fn condensed(matrix: &Array2<f64>) -> Result<Vec<f64>, PipelineError> {
    validate(matrix)?;
    let n = matrix.nrows();
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            out.push(matrix[[i, j]]);
        }
    }
    Ok(out)
}

/// Rebuild the symmetric square matrix from its condensed form.
pub fn from_condensed(condensed: &[f64], n: usize) -> Array2<f64> {
    let mut matrix = Array2::<f64>::zeros((n, n));
    let mut idx = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            matrix[[i, j]] = condensed[idx];
            matrix[[j, i]] = condensed[idx];
            idx += 1;
        }
    }
    matrix
}

/// Persist the matrix as a tab-separated text grid, one row per line.
/// Values are written with shortest-roundtrip formatting so the file parses
/// back to the exact same matrix.
pub fn write_matrix(path: &Path, matrix: &Array2<f64>) -> Result<(), PipelineError> {
    let mut file = fs::File::create(path)?;
    for row in matrix.rows() {
        let line = row.iter().map(|v| v.to_string()).join("\t");
        writeln!(file, "{}", line)?;
    }
    Ok(())
}

/// Parse a persisted matrix back from its whitespace-delimited text form.
pub fn read_matrix(path: &Path) -> Result<Array2<f64>, PipelineError> {
    let text = fs::read_to_string(path)?;
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (row_idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut row = Vec::new();
        for token in line.split_whitespace() {
            let value: f64 = token.parse().ok().filter(|v: &f64| v.is_finite()).ok_or_else(
                || PipelineError::MalformedDistance {
                    token: token.to_string(),
                    location: format!("{} row {}", path.display(), row_idx),
                },
            )?;
            row.push(value);
        }
        rows.push(row);
    }
    let n = rows.len();
    if rows.iter().any(|row| row.len() != n) {
        return Err(PipelineError::MalformedMatrix {
            detail: format!("{} is not a square grid ({} rows)", path.display(), n),
        });
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let matrix = Array2::from_shape_vec((n, n), flat).map_err(|e| {
        PipelineError::MalformedMatrix {
            detail: e.to_string(),
        }
    })?;
    validate(&matrix)?;
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_matrix() -> Array2<f64> {
        Array2::from_shape_vec(
            (3, 3),
            vec![0.0, 2.0, 4.0, 2.0, 0.0, 4.0, 4.0, 4.0, 0.0],
        )
        .unwrap()
    }

    #[test]
    fn test_condensed_round_trip_is_exact() {
        let matrix = example_matrix();
        let v = condensed(&matrix).unwrap();
        assert_eq!(v, vec![2.0, 4.0, 4.0]);
        assert_eq!(from_condensed(&v, 3), matrix);
    }

    #[test]
    fn test_assemble_fixes_diagonal_at_zero() {
        let matrix = assemble(3, |i, j| Ok((i + j) as f64)).unwrap();
        for i in 0..3 {
            assert_eq!(matrix[[i, i]], 0.0);
        }
        assert_eq!(matrix[[0, 2]], 2.0);
        assert_eq!(matrix[[2, 0]], 2.0);
    }

    #[test]
    fn test_assemble_rejects_nan() {
        let result = assemble(2, |_, _| Ok(f64::NAN));
        assert!(matches!(result, Err(PipelineError::MalformedMatrix { .. })));
    }

    #[test]
    fn test_validate_rejects_negative_entries() {
        let mut matrix = example_matrix();
        matrix[[0, 1]] = -1.0;
        assert!(validate(&matrix).is_err());
    }

    #[test]
    fn test_validate_rejects_nonzero_diagonal() {
        let mut matrix = example_matrix();
        matrix[[1, 1]] = 0.5;
        assert!(validate(&matrix).is_err());
    }

    #[test]
    fn test_persisted_matrix_parses_back_exactly() {
        let matrix = Array2::from_shape_vec(
            (2, 2),
            vec![0.0, 0.0222766, 0.0222766, 0.0],
        )
        .unwrap();
        let path = std::env::temp_dir().join(format!("gdtree_matrix_{}.txt", std::process::id()));
        write_matrix(&path, &matrix).unwrap();
        let parsed = read_matrix(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(parsed, matrix);
    }

    #[test]
    fn test_read_matrix_rejects_nan_token() {
        let path = std::env::temp_dir().join(format!("gdtree_nan_{}.txt", std::process::id()));
        std::fs::write(&path, "0\tNaN\nNaN\t0\n").unwrap();
        let result = read_matrix(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(
            result,
            Err(PipelineError::MalformedDistance { .. })
        ));
    }

    #[test]
    fn test_read_matrix_rejects_non_numeric_token() {
        let path = std::env::temp_dir().join(format!("gdtree_bad_{}.txt", std::process::id()));
        std::fs::write(&path, "0\tabc\nabc\t0\n").unwrap();
        let result = read_matrix(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(
            result,
            Err(PipelineError::MalformedDistance { .. })
        ));
    }
}
