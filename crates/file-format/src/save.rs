use assemblage_engine::{Aggregation, AggregationData};
use serde::Serialize;

use crate::errors::SaveError;
use crate::metadata::AssemblageMetadata;

/// Format identifier written to every file.
pub const FORMAT_ID: &str = "assemblage";

/// Current file format version.
pub const FORMAT_VERSION: u32 = 1;

/// The top-level file structure.
#[derive(Debug, Clone, Serialize)]
pub struct AssemblageFile<'a> {
    pub format: &'a str,
    pub version: u32,
    pub project: &'a AssemblageMetadata,
    pub aggregation: &'a AggregationData,
}

/// Serialize an aggregation record to pretty-printed JSON.
pub fn save_project(data: &AggregationData, metadata: &AssemblageMetadata) -> Result<String, SaveError> {
    let file = AssemblageFile {
        format: FORMAT_ID,
        version: FORMAT_VERSION,
        project: metadata,
        aggregation: data,
    };
    serde_json::to_string_pretty(&file).map_err(|e| SaveError::Serialize(e.to_string()))
}

/// Snapshot a live aggregation and serialize it.
pub fn save_aggregation(aggregation: &Aggregation, metadata: &AssemblageMetadata) -> Result<String, SaveError> {
    save_project(&aggregation.to_data(), metadata)
}
