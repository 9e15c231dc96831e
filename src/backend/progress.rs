use serde::{Deserialize, Serialize};

/// Highest percent shown before every asset has settled.
pub const MAX_PENDING_PERCENT: u8 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressRecord {
    pub bytes_loaded: u64,
    pub bytes_total: u64,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        // Provisional total until the server reports a length.
        Self {
            bytes_loaded: 0,
            bytes_total: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreloadProgress {
    pub percent: u8,
    pub loaded: u64,
    pub total: u64,
}

impl PreloadProgress {
    /// Records without a known length count one byte each, so a larger total
    /// means at least one server reported a real size.
    pub fn has_sizes(&self, asset_count: usize) -> bool {
        self.total > asset_count as u64
    }
}

/// Per-asset byte counters for one preload session, plus the high-water mark
/// that keeps the reported percent from ever going backwards.
#[derive(Debug)]
pub struct ProgressTracker {
    records: Vec<ProgressRecord>,
    high_water: u8,
}

impl ProgressTracker {
    pub fn new(asset_count: usize) -> Self {
        Self {
            records: vec![ProgressRecord::default(); asset_count],
            high_water: 0,
        }
    }

    pub fn record(&mut self, index: usize, loaded: u64, total: u64) -> PreloadProgress {
        if let Some(record) = self.records.get_mut(index) {
            record.bytes_loaded = loaded;
            record.bytes_total = total.max(1);
        }

        let (loaded, total) = self.sums();
        let current = raw_percent(loaded, total);
        if current > self.high_water {
            self.high_water = current;
        }

        PreloadProgress {
            percent: self.high_water.min(MAX_PENDING_PERCENT),
            loaded,
            total,
        }
    }

    pub fn finish(&mut self) -> PreloadProgress {
        let (loaded, total) = self.sums();
        self.high_water = 100;
        PreloadProgress {
            percent: 100,
            loaded,
            total,
        }
    }

    fn sums(&self) -> (u64, u64) {
        self.records.iter().fold((0, 0), |(loaded, total), r| {
            (loaded + r.bytes_loaded, total + r.bytes_total)
        })
    }
}

fn raw_percent(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let ratio = loaded as f64 / total as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}
