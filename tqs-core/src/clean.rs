//! Bar cleaning: the fill policy applied before anything else sees the data.
//!
//! - Records without a timestamp are dropped.
//! - Missing prices become void (`NaN`), never interpolated.
//! - A missing individual volume becomes the dummy constant.
//! - A volume column that is absent, all-NaN or all-zero is replaced by the
//!   dummy constant for every bar, and the substitution is reported.
//! - Bars are stably sorted by timestamp.

use crate::domain::{PriceBar, RawBar};
use serde::{Deserialize, Serialize};

/// Volume used when the source delivered none.
pub const DUMMY_VOLUME: f64 = 1.0;

/// How the volume column of a cleaned series came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeFill {
    /// Real volume, possibly with isolated gaps filled.
    Observed,
    /// No usable volume at all; every bar carries `DUMMY_VOLUME`.
    Substituted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanedBars {
    pub bars: Vec<PriceBar>,
    pub volume_fill: VolumeFill,
    /// Records discarded for lack of a timestamp.
    pub dropped: usize,
}

impl CleanedBars {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

pub fn clean_bars(raw: Vec<RawBar>) -> CleanedBars {
    let total = raw.len();

    let usable_volume = raw
        .iter()
        .filter(|r| r.timestamp.is_some())
        .filter_map(|r| r.volume)
        .any(|v| v.is_finite() && v != 0.0);

    let mut bars: Vec<PriceBar> = raw
        .into_iter()
        .filter_map(|r| {
            let timestamp = r.timestamp?;
            let volume = match r.volume {
                Some(v) if usable_volume && v.is_finite() => v,
                _ => DUMMY_VOLUME,
            };
            Some(PriceBar::new(
                timestamp,
                r.open.unwrap_or(f64::NAN),
                r.high.unwrap_or(f64::NAN),
                r.low.unwrap_or(f64::NAN),
                r.close.unwrap_or(f64::NAN),
                volume,
            ))
        })
        .collect();

    let dropped = total - bars.len();
    if dropped > 0 {
        log::warn!("dropped {dropped} bar(s) without a timestamp");
    }

    // Vec::sort_by_key is stable: equal timestamps keep their arrival order.
    bars.sort_by_key(|b| b.timestamp);

    let volume_fill = if usable_volume || bars.is_empty() {
        VolumeFill::Observed
    } else {
        log::warn!(
            "no usable volume in {} bar(s); substituting dummy volume {DUMMY_VOLUME}",
            bars.len()
        );
        VolumeFill::Substituted
    };

    CleanedBars {
        bars,
        volume_fill,
        dropped,
    }
}
