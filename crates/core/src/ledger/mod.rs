//! Ledger module: the spreadsheet that records each row's prompt and status.
//!
//! A ledger is a header row followed by data rows. Data row `i` (0-based)
//! belongs to the image whose filename starts with `i + 1`. The status column
//! doubles as a durable completion record: rows carrying the configured
//! completed marker are skipped on every later run.
//!
//! # Formats
//!
//! - CSV, read and written with the `csv` crate
//! - XLSX, read with `calamine` and written with `rust_xlsxwriter`
//!   (first worksheet only)
//!
//! # Example
//!
//! ```ignore
//! use framecast_core::ledger::{LedgerConfig, LedgerStore};
//!
//! let store = LedgerStore::new(LedgerConfig::default());
//! for item in store.pending_items(&group) {
//!     println!("row {} -> {}", item.row + 1, item.prompt);
//! }
//! store.mark_completed(&group, 0)?;
//! ```

mod config;
mod error;
mod store;
mod table;
mod types;

pub use config::LedgerConfig;
pub use error::LedgerError;
pub use store::LedgerStore;
pub use table::LedgerTable;
pub use types::{Cell, LedgerFormat, WorkItem};
