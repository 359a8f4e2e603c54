//! Persistence of trained maps.
//!
//! Binary grid snapshots live on [`Som::save`](crate::som::Som::save); this
//! module holds the delimited visualization export.

mod visualization;

pub use visualization::{
    export_visualization, read_visualization, write_visualization, ExportSummary, NeuronRecord,
};
