//! Asset scanner: finds task groups under a root directory.
//!
//! A task group is a direct subdirectory of the root that holds a ledger
//! file (`.csv` or `.xlsx`) next to images named `<n>_<anything>.<ext>`.
//! The leading integer `n` joins the image to ledger data row `n - 1`.

mod discovery;
mod error;
mod types;

pub use discovery::{
    check_root, discover_groups, find_ledger, list_assets, parse_sequence, IMAGE_EXTENSIONS,
    SEQUENCE_DELIMITER,
};
pub use error::ScanError;
pub use types::{Asset, AssetIndex, TaskGroup};
