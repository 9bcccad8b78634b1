use assemblage_engine::{Aggregation, AggregationConfig, AggregationData, Part, Rule};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::LoadError;
use crate::metadata::AssemblageMetadata;
use crate::save::{FORMAT_ID, FORMAT_VERSION};

/// Envelope fields read before the payload, so that old payloads can be
/// migrated before they are typed.
#[derive(Debug, Clone, Deserialize)]
struct Envelope {
    format: String,
    version: u32,
    project: AssemblageMetadata,
    aggregation: Value,
}

/// Deserialize an aggregation record from a JSON string.
///
/// Validates the format identifier and version and migrates older payloads.
pub fn load_project(json: &str) -> Result<(AggregationData, AssemblageMetadata), LoadError> {
    let raw: Envelope = serde_json::from_str(json).map_err(|e| LoadError::ParseError(e.to_string()))?;

    if raw.format != FORMAT_ID {
        return Err(LoadError::UnknownFormat(raw.format));
    }
    if raw.version > FORMAT_VERSION {
        return Err(LoadError::FutureVersion {
            file_version: raw.version,
            supported_version: FORMAT_VERSION,
        });
    }

    let payload = if raw.version < FORMAT_VERSION {
        crate::migrate::migrate(raw.aggregation, raw.version, FORMAT_VERSION)?
    } else {
        raw.aggregation
    };
    let data: AggregationData = serde_json::from_value(payload).map_err(|e| LoadError::ParseError(e.to_string()))?;
    Ok((data, raw.project))
}

/// Load a file and rebuild the aggregation over `palette`.
///
/// The record's own rules are used unless `rules` overrides them.
pub fn load_aggregation(
    json: &str,
    palette: Vec<Part>,
    rules: Option<Vec<Rule>>,
    config: AggregationConfig,
) -> Result<(Aggregation, AssemblageMetadata), LoadError> {
    let (data, metadata) = load_project(json)?;
    let aggregation = Aggregation::from_data(&data, palette, rules, config)?;
    Ok((aggregation, metadata))
}
