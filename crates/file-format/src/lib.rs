pub mod errors;
pub mod load;
pub mod metadata;
pub mod migrate;
pub mod save;

pub use errors::{LoadError, SaveError};
pub use load::{load_aggregation, load_project};
pub use metadata::AssemblageMetadata;
pub use save::{save_aggregation, save_project, FORMAT_ID, FORMAT_VERSION};
