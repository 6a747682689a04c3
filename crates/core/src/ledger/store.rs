//! Ledger store: pending-item selection and completion marking.

use tracing::{debug, error, info, warn};

use crate::scanner::{AssetIndex, TaskGroup};

use super::config::LedgerConfig;
use super::error::LedgerError;
use super::table::LedgerTable;
use super::types::{Cell, WorkItem};

/// Reads and updates the spreadsheet ledger of each task group.
///
/// Every update rewrites the whole ledger file, so callers must not run two
/// updates against the same group concurrently.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    config: LedgerConfig,
}

impl LedgerStore {
    /// Creates a new ledger store.
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    /// Returns the ledger configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Whether a status cell carries the completed marker.
    pub fn is_completed(&self, status: &Cell) -> bool {
        status.to_string().trim() == self.config.completed_marker.trim()
    }

    /// Loads the group's ledger and returns its eligible rows in file order.
    ///
    /// A missing or unreadable ledger yields an empty set.
    pub fn pending_items(&self, group: &TaskGroup) -> Vec<WorkItem> {
        let table = match LedgerTable::load(&group.ledger_path) {
            Ok(table) => table,
            Err(e) => {
                error!("Failed to read ledger for group {}: {}", group.name, e);
                return Vec::new();
            }
        };

        let items = self.select_pending(&table, &group.assets);
        info!(
            "Group {} has {} pending items ({} ledger rows)",
            group.name,
            items.len(),
            table.row_count()
        );
        items
    }

    /// Applies the eligibility rule to a loaded table.
    ///
    /// A row is eligible when its status is not the completed marker, its
    /// prompt is non-empty and an asset with sequence number `row + 1`
    /// exists. Rows with a prompt but no asset are skipped with a warning.
    pub fn select_pending(&self, table: &LedgerTable, assets: &AssetIndex) -> Vec<WorkItem> {
        let prompt_col = self.config.prompt_index();
        let status_col = self.config.status_index();
        let mut items = Vec::new();

        for row in 0..table.row_count() {
            let status = table.cell(row, status_col);
            if self.is_completed(status) {
                continue;
            }

            let prompt = table.cell(row, prompt_col);
            if prompt.is_empty() {
                continue;
            }

            let Ok(sequence) = u32::try_from(row + 1) else {
                warn!("Ledger row {} exceeds the supported sequence range", row + 1);
                break;
            };

            match assets.lookup(sequence) {
                Some(asset) => items.push(WorkItem {
                    row,
                    sequence,
                    prompt: prompt.to_string().trim().to_string(),
                    asset_path: asset.path.clone(),
                    status: status.to_string(),
                }),
                None => warn!(
                    "No image with sequence number {} for ledger row {}",
                    sequence,
                    row + 1
                ),
            }
        }

        items
    }

    /// Writes the completed marker into a row's status column.
    pub fn mark_completed(&self, group: &TaskGroup, row: usize) -> Result<(), LedgerError> {
        let marker = self.config.completed_marker.clone();
        self.mark_status(group, row, &marker)
    }

    /// Writes `status` into a row's status column and persists the ledger.
    ///
    /// The status column is created when the ledger is narrower than the
    /// configured position. A row that already carries the completed marker
    /// is left untouched.
    pub fn mark_status(&self, group: &TaskGroup, row: usize, status: &str) -> Result<(), LedgerError> {
        let mut table = LedgerTable::load(&group.ledger_path)?;
        let status_col = self.config.status_index();

        if row < table.row_count() && self.is_completed(table.cell(row, status_col)) {
            debug!(
                "Ledger row {} of group {} already completed, not rewriting",
                row + 1,
                group.name
            );
            return Ok(());
        }

        let rows = table.row_count();
        if !table.set_cell(row, status_col, Cell::Text(status.to_string())) {
            return Err(LedgerError::RowOutOfRange {
                path: group.ledger_path.clone(),
                row,
                rows,
            });
        }

        table.save(&group.ledger_path)?;
        info!(
            "Updated ledger {} row {} -> {}",
            group.ledger_path.display(),
            row + 1,
            status
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerFormat;
    use crate::scanner::Asset;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn assets(dir: &Path, sequences: &[u32]) -> AssetIndex {
        AssetIndex::new(
            sequences
                .iter()
                .map(|seq| Asset {
                    sequence: *seq,
                    path: dir.join(format!("{}_img.png", seq)),
                })
                .collect(),
        )
    }

    fn group_with_csv(dir: &TempDir, csv: &str, sequences: &[u32]) -> TaskGroup {
        let ledger_path = dir.path().join("tasks.csv");
        fs::write(&ledger_path, csv).unwrap();
        TaskGroup {
            name: "group".to_string(),
            directory: dir.path().to_path_buf(),
            ledger_path,
            ledger_format: LedgerFormat::Csv,
            assets: assets(dir.path(), sequences),
        }
    }

    fn store() -> LedgerStore {
        LedgerStore::new(
            LedgerConfig::default()
                .with_prompt_column(1)
                .with_status_column(2)
                .with_completed_marker("done"),
        )
    }

    #[test]
    fn test_completed_marker_excludes_row() {
        let dir = TempDir::new().unwrap();
        let group = group_with_csv(&dir, "prompt,status\na cat,done\n", &[1]);
        assert!(store().pending_items(&group).is_empty());
    }

    #[test]
    fn test_empty_or_other_status_is_pending() {
        let dir = TempDir::new().unwrap();
        let group = group_with_csv(
            &dir,
            "prompt,status\na cat,\na cat,failed\na cat\n",
            &[1, 2, 3],
        );

        let items = store().pending_items(&group);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].row, 0);
        assert_eq!(items[0].sequence, 1);
        assert_eq!(items[0].prompt, "a cat");
        assert_eq!(items[1].status, "failed");
        assert_eq!(items[2].asset_path, dir.path().join("3_img.png"));
    }

    #[test]
    fn test_rows_without_prompt_or_asset_are_skipped() {
        let dir = TempDir::new().unwrap();
        let group = group_with_csv(&dir, "prompt,status\n,\n  ,\nno image,\n", &[1, 2]);
        assert!(store().pending_items(&group).is_empty());
    }

    #[test]
    fn test_missing_ledger_yields_empty_set() {
        let dir = TempDir::new().unwrap();
        let group = TaskGroup {
            name: "group".to_string(),
            directory: dir.path().to_path_buf(),
            ledger_path: dir.path().join("gone.csv"),
            ledger_format: LedgerFormat::Csv,
            assets: assets(dir.path(), &[1]),
        };
        assert!(store().pending_items(&group).is_empty());
    }

    #[test]
    fn test_mark_completed_is_idempotent_across_runs() {
        let dir = TempDir::new().unwrap();
        let group = group_with_csv(&dir, "prompt,status\nx,\ny,\n", &[1, 2]);
        let store = store();

        store.mark_completed(&group, 0).unwrap();
        let pending = store.pending_items(&group);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].row, 1);

        store.mark_completed(&group, 1).unwrap();
        assert!(store.pending_items(&group).is_empty());
    }

    #[test]
    fn test_mark_status_extends_narrow_ledger() {
        let dir = TempDir::new().unwrap();
        let group = group_with_csv(&dir, "prompt\nx\n", &[1]);
        let store = LedgerStore::new(
            LedgerConfig::default()
                .with_prompt_column(1)
                .with_status_column(3),
        );

        store.mark_completed(&group, 0).unwrap();
        let content = fs::read_to_string(&group.ledger_path).unwrap();
        assert_eq!(content, "prompt,Column_2,Column_3\nx,,已生成视频\n");
    }

    #[test]
    fn test_completed_row_is_never_downgraded() {
        let dir = TempDir::new().unwrap();
        let group = group_with_csv(&dir, "prompt,status\nx,done\n", &[1]);
        let store = store();

        store.mark_status(&group, 0, "retry").unwrap();
        let content = fs::read_to_string(&group.ledger_path).unwrap();
        assert_eq!(content, "prompt,status\nx,done\n");
    }

    #[test]
    fn test_mark_row_out_of_range() {
        let dir = TempDir::new().unwrap();
        let group = group_with_csv(&dir, "prompt,status\nx,\n", &[1]);
        let result = store().mark_completed(&group, 5);
        assert!(matches!(
            result,
            Err(LedgerError::RowOutOfRange { row: 5, rows: 1, .. })
        ));
    }
}
