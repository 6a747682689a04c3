//! Types for the scanner module.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::warn;

use crate::ledger::LedgerFormat;

/// An image whose filename starts with an integer sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Leading integer of the filename (`7` for `7_sunset.jpg`).
    pub sequence: u32,
    /// Full path of the image.
    pub path: PathBuf,
}

/// Assets of one group, sorted ascending by sequence number.
///
/// Duplicate sequence numbers are kept; [`AssetIndex::lookup`] resolves to
/// the first one in sorted order, which is the lexicographically smallest
/// filename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetIndex {
    assets: Vec<Asset>,
}

impl AssetIndex {
    /// Builds an index, sorting by sequence number and then by path.
    pub fn new(mut assets: Vec<Asset>) -> Self {
        assets.sort_by(|a, b| a.sequence.cmp(&b.sequence).then_with(|| a.path.cmp(&b.path)));
        Self { assets }
    }

    /// First asset carrying `sequence`.
    pub fn lookup(&self, sequence: u32) -> Option<&Asset> {
        let idx = self.assets.partition_point(|a| a.sequence < sequence);
        self.assets.get(idx).filter(|a| a.sequence == sequence)
    }

    /// Sequence numbers carried by more than one asset, with their count.
    pub fn duplicates(&self) -> Vec<(u32, usize)> {
        let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
        for asset in &self.assets {
            *counts.entry(asset.sequence).or_default() += 1;
        }
        counts.into_iter().filter(|(_, n)| *n > 1).collect()
    }

    /// Logs one warning per duplicated sequence number.
    pub(crate) fn warn_duplicates(&self, group: &str) {
        for (sequence, count) in self.duplicates() {
            let chosen = self
                .lookup(sequence)
                .map(|a| a.path.display().to_string())
                .unwrap_or_default();
            warn!(
                "Group {}: {} images share sequence number {}, using {}",
                group, count, sequence, chosen
            );
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// A directory holding one ledger and the images it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskGroup {
    /// Directory name, used in logs and events.
    pub name: String,
    /// Group directory; generated videos are saved here too.
    pub directory: PathBuf,
    /// Ledger file selected for this group.
    pub ledger_path: PathBuf,
    /// Format of the ledger file.
    pub ledger_format: LedgerFormat,
    /// Ordered image assets.
    pub assets: AssetIndex,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(sequence: u32, name: &str) -> Asset {
        Asset {
            sequence,
            path: PathBuf::from(name),
        }
    }

    #[test]
    fn test_index_sorted_by_sequence() {
        let index = AssetIndex::new(vec![
            asset(10, "10_j.png"),
            asset(2, "2_b.png"),
            asset(1, "1_a.png"),
        ]);
        let order: Vec<u32> = index.iter().map(|a| a.sequence).collect();
        assert_eq!(order, vec![1, 2, 10]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_lookup() {
        let index = AssetIndex::new(vec![asset(1, "1_a.png"), asset(3, "3_c.png")]);
        assert_eq!(index.lookup(3).unwrap().path, PathBuf::from("3_c.png"));
        assert!(index.lookup(2).is_none());
        assert!(index.lookup(4).is_none());
    }

    #[test]
    fn test_duplicate_sequence_resolves_to_smallest_name() {
        let index = AssetIndex::new(vec![
            asset(5, "5_zebra.png"),
            asset(5, "5_apple.png"),
            asset(6, "6_x.png"),
        ]);
        assert_eq!(index.lookup(5).unwrap().path, PathBuf::from("5_apple.png"));
        assert_eq!(index.duplicates(), vec![(5, 2)]);
    }
}
