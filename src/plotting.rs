use crate::clustering::MergeNode;
use crate::config::Config;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use std::collections::HashMap;
use std::error::Error;

/// Render the merge tree as a dendrogram PNG at `config.image_path()`.
///
/// Leaves sit evenly spaced on the x axis in their left-to-right tree order;
/// the y axis is the merge distance. Image dimensions come from the
/// configured width/height in inches multiplied by the dpi.
pub fn plot_dendrogram(
    root: &MergeNode,
    labels: &[String],
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let n_samples = labels.len();

    // x position of each leaf, in tree order.
    let mut leaf_positions = HashMap::new();
    let mut leaf_names = vec![String::new(); n_samples];
    for (slot, leaf) in root.leaves().into_iter().enumerate() {
        leaf_positions.insert(leaf, slot as f64);
        if let Some(name) = labels.get(leaf) {
            leaf_names[slot] = name.clone();
        }
    }

    let max_height = root.height;
    let y_top = if max_height > 0.0 { max_height * 1.1 } else { 1.0 };

    let output_path = config.image_path();
    let root_area =
        BitMapBackend::new(&output_path, config.image_size_px()).into_drawing_area();
    root_area.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root_area)
        .caption("Phylogenetic Tree", ("sans-serif", 40).into_font())
        .margin(20)
        .x_label_area_size(150)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..(n_samples as f64 - 0.5), 0.0..y_top)?;

    chart
        .configure_mesh()
        .y_desc("Distance")
        .x_labels(n_samples)
        .x_label_formatter(&|x| {
            let idx = x.round() as usize;
            if (x - idx as f64).abs() < 1e-6 && idx < leaf_names.len() {
                leaf_names[idx].clone()
            } else {
                String::new()
            }
        })
        .draw()?;

    draw_node(&mut chart, root, &leaf_positions)?;

    root_area.present()?;
    Ok(())
}

/// Center x coordinate of a subtree: the leaf's own position, or the mean of
/// the two children's centers.
fn node_center(node: &MergeNode, positions: &HashMap<usize, f64>) -> f64 {
    match node.leaf_index {
        Some(idx) => *positions.get(&idx).unwrap_or(&0.0),
        None => {
            let left = node.left.as_ref().map(|n| node_center(n, positions)).unwrap_or(0.0);
            let right = node.right.as_ref().map(|n| node_center(n, positions)).unwrap_or(0.0);
            (left + right) / 2.0
        }
    }
}

fn draw_node<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    node: &MergeNode,
    positions: &HashMap<usize, f64>,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let (left, right) = match (&node.left, &node.right) {
        (Some(left), Some(right)) => (left, right),
        _ => return Ok(()),
    };

    let left_center = node_center(left, positions);
    let right_center = node_center(right, positions);
    let parent_height = node.height;

    chart.draw_series(LineSeries::new(
        vec![(left_center, left.height), (left_center, parent_height)],
        &BLUE,
    ))?;
    chart.draw_series(LineSeries::new(
        vec![(right_center, right.height), (right_center, parent_height)],
        &BLUE,
    ))?;
    chart.draw_series(LineSeries::new(
        vec![(left_center, parent_height), (right_center, parent_height)],
        &BLUE,
    ))?;

    draw_node(chart, left, positions)?;
    draw_node(chart, right, positions)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::{average_linkage, build_tree};

    #[test]
    fn test_node_center_averages_children() {
        let dendrogram = average_linkage(&[2.0, 4.0, 4.0], 3).unwrap();
        let root = build_tree(&dendrogram, 3).unwrap();
        let positions: HashMap<usize, f64> =
            (0..3).map(|i| (i, i as f64)).collect();
        // Root children are the (0,1) cluster centered at 0.5 and leaf 2.
        assert_eq!(node_center(&root, &positions), (0.5 + 2.0) / 2.0);
    }

    #[test]
    fn test_plot_writes_png() {
        let dendrogram = average_linkage(&[2.0, 4.0, 4.0], 3).unwrap();
        let root = build_tree(&dendrogram, 3).unwrap();
        let labels = vec!["A".to_string(), "B".to_string(), "C".to_string()];

        let dir = std::env::temp_dir().join(format!("gdtree_plot_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut config = Config::new(".", &dir);
        config.width_inch = 4.0;
        config.height_inch = 3.0;
        config.dpi = 100;

        plot_dendrogram(&root, &labels, &config).unwrap();
        let written = std::fs::metadata(config.image_path()).unwrap().len();
        std::fs::remove_dir_all(&dir).ok();
        assert!(written > 0);
    }
}
