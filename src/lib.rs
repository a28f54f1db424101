//! # gdtree
//!
//! `gdtree` builds a phylogenetic tree from whole-genome pairwise distances.
//! It drives an external estimator (`mash dist`) over every pair of genomes
//! in a directory, assembles the resulting symmetric distance matrix,
//! clusters it with average linkage (UPGMA), and writes the tree both as a
//! Newick file and as a rendered dendrogram image.

pub mod clustering;
pub mod config;
pub mod error;
pub mod matrix;
pub mod newick;
pub mod pairwise;
pub mod plotting;
pub mod startup;
