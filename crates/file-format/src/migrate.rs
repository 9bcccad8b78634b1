use serde_json::Value;

use crate::errors::LoadError;

/// Apply payload migrations from `from_version` to `to_version`.
///
/// Migrations run one version at a time on the untyped payload. Version 1 is
/// the first released layout, so no upgrade path exists yet.
pub fn migrate(payload: Value, from_version: u32, to_version: u32) -> Result<Value, LoadError> {
    if from_version != to_version {
        return Err(LoadError::MigrationFailed {
            from: from_version,
            to: to_version,
            reason: format!("no migration path from v{} to v{}", from_version, to_version),
        });
    }
    Ok(payload)
}
