use crate::clustering::MergeNode;
use crate::error::PipelineError;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Serialize the merge tree to Newick.
///
/// Leaves carry a fixed branch length of 0.0; only internal merge heights
/// carry distance information. An internal node's height is emitted twice,
/// once as an inline clade label and once as its branch length, matching the
/// output format of the upstream pipeline this tool replaces.
pub fn to_newick(root: &MergeNode, labels: &[String]) -> Result<String, PipelineError> {
    let mut out = String::new();
    write_node(root, labels, &mut out)?;
    Ok(out)
}

fn write_node(node: &MergeNode, labels: &[String], out: &mut String) -> Result<(), PipelineError> {
    match node.leaf_index {
        Some(idx) => {
            let name = labels.get(idx).ok_or_else(|| PipelineError::MalformedMatrix {
                detail: format!("leaf index {} has no sample label", idx),
            })?;
            out.push_str(name);
            out.push_str(":0.0");
        }
        None => {
            let (left, right) = match (&node.left, &node.right) {
                (Some(left), Some(right)) => (left, right),
                _ => {
                    return Err(PipelineError::MalformedMatrix {
                        detail: "internal node is missing a child".to_string(),
                    })
                }
            };
            out.push('(');
            write_node(left, labels, out)?;
            out.push(',');
            write_node(right, labels, out)?;
            out.push(')');
            let height = format_height(node.height);
            out.push_str(&height);
            out.push(':');
            out.push_str(&height);
        }
    }
    Ok(())
}

/// Shortest decimal that round-trips, with a forced fractional part so whole
/// numbers read `2.0` rather than `2`.
fn format_height(height: f64) -> String {
    format!("{:?}", height)
}

/// Persist the Newick string with a single trailing newline.
pub fn write_newick(path: &Path, newick: &str) -> Result<(), PipelineError> {
    let mut file = fs::File::create(path)?;
    writeln!(file, "{}", newick)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::{average_linkage, build_tree};

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_three_sample_example() {
        let dendrogram = average_linkage(&[2.0, 4.0, 4.0], 3).unwrap();
        let root = build_tree(&dendrogram, 3).unwrap();
        let newick = to_newick(&root, &labels(&["A", "B", "C"])).unwrap();
        assert_eq!(newick, "((A:0.0,B:0.0)2.0:2.0,C:0.0)4.0:4.0");
    }

    #[test]
    fn test_two_sample_tree() {
        let dendrogram = average_linkage(&[0.5], 2).unwrap();
        let root = build_tree(&dendrogram, 2).unwrap();
        let newick = to_newick(&root, &labels(&["s1", "s2"])).unwrap();
        assert_eq!(newick, "(s1:0.0,s2:0.0)0.5:0.5");
    }

    #[test]
    fn test_heights_keep_fractional_part() {
        assert_eq!(format_height(2.0), "2.0");
        assert_eq!(format_height(0.0222766), "0.0222766");
        assert_eq!(format_height(4.5), "4.5");
    }

    #[test]
    fn test_four_sample_snapshot() {
        // d(0,1)=1, d(0,2)=2, d(0,3)=8, d(1,2)=3, d(1,3)=8, d(2,3)=8
        let dendrogram = average_linkage(&[1.0, 2.0, 8.0, 3.0, 8.0, 8.0], 4).unwrap();
        let root = build_tree(&dendrogram, 4).unwrap();
        let newick = to_newick(&root, &labels(&["g1", "g2", "g3", "g4"])).unwrap();
        insta::assert_snapshot!(
            newick,
            @"(((g1:0.0,g2:0.0)1.0:1.0,g3:0.0)2.5:2.5,g4:0.0)8.0:8.0"
        );
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let condensed = [0.3, 0.3, 0.7, 0.3, 0.7, 0.7];
        let names = labels(&["a", "b", "c", "d"]);
        let make = || {
            let dendrogram = average_linkage(&condensed, 4).unwrap();
            let root = build_tree(&dendrogram, 4).unwrap();
            to_newick(&root, &names).unwrap()
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn test_persisted_newick_has_trailing_newline() {
        let path = std::env::temp_dir().join(format!("gdtree_newick_{}.nwk", std::process::id()));
        write_newick(&path, "(a:0.0,b:0.0)1.0:1.0").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(text, "(a:0.0,b:0.0)1.0:1.0\n");
    }

    #[test]
    fn test_unknown_leaf_label_is_an_error() {
        let dendrogram = average_linkage(&[0.5], 2).unwrap();
        let root = build_tree(&dendrogram, 2).unwrap();
        assert!(to_newick(&root, &labels(&["only_one"])).is_err());
    }
}
