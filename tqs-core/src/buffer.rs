//! Bounded bar history with one in-progress working bar.
//!
//! Ticks fold into the working bar of their time bucket. When a tick lands
//! in a later bucket the working bar is finalized into history, and the
//! oldest bar is evicted once history exceeds capacity (FIFO). Updates must
//! arrive in order; anything older than the latest bucket is rejected.

use crate::clean::DUMMY_VOLUME;
use crate::domain::{PriceBar, Tick};
use chrono::{Duration, NaiveDateTime, Timelike};
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("out-of-order update at {incoming}, latest is {latest}")]
    OutOfOrder {
        incoming: NaiveDateTime,
        latest: NaiveDateTime,
    },
}

/// Start of the `interval_secs` bucket containing `ts`, aligned to midnight.
pub fn bucket_start(ts: NaiveDateTime, interval_secs: u32) -> NaiveDateTime {
    let interval = interval_secs.max(1);
    let offset = ts.time().num_seconds_from_midnight() % interval;
    ts - Duration::seconds(offset as i64) - Duration::nanoseconds(ts.nanosecond() as i64)
}

#[derive(Debug, Clone)]
pub struct PriceBuffer {
    capacity: usize,
    bar_interval_secs: u32,
    history: VecDeque<PriceBar>,
    working: Option<PriceBar>,
}

impl PriceBuffer {
    pub fn new(capacity: usize, bar_interval_secs: u32) -> Self {
        assert!(capacity >= 1, "buffer capacity must be >= 1");
        Self {
            capacity,
            bar_interval_secs,
            history: VecDeque::with_capacity(capacity + 1),
            working: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Finalized bars plus the working bar, if any.
    pub fn len(&self) -> usize {
        self.history.len() + usize::from(self.working.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn working_bar(&self) -> Option<&PriceBar> {
        self.working.as_ref()
    }

    fn latest_timestamp(&self) -> Option<NaiveDateTime> {
        self.working
            .as_ref()
            .or_else(|| self.history.back())
            .map(|b| b.timestamp)
    }

    fn finalize(&mut self, bar: PriceBar) {
        self.history.push_back(bar);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
    }

    /// Append a finished bar. An open working bar is finalized first.
    pub fn push_bar(&mut self, bar: PriceBar) -> Result<(), BufferError> {
        if let Some(latest) = self.latest_timestamp() {
            if bar.timestamp < latest {
                return Err(BufferError::OutOfOrder {
                    incoming: bar.timestamp,
                    latest,
                });
            }
        }
        if let Some(working) = self.working.take() {
            self.finalize(working);
        }
        self.finalize(bar);
        Ok(())
    }

    /// Fold a tick into the working bar.
    ///
    /// Returns `Ok(false)` for a tick with no usable price.
    pub fn update_from_tick(&mut self, tick: &Tick) -> Result<bool, BufferError> {
        let Some(price) = tick.trade_price() else {
            return Ok(false);
        };
        let bucket = bucket_start(tick.timestamp, self.bar_interval_secs);

        if let Some(latest) = self.latest_timestamp() {
            if bucket < latest {
                return Err(BufferError::OutOfOrder {
                    incoming: tick.timestamp,
                    latest,
                });
            }
        }

        match self.working.take() {
            Some(mut working) if working.timestamp == bucket => {
                working.absorb(price);
                self.working = Some(working);
            }
            previous => {
                if let Some(done) = previous {
                    self.finalize(done);
                }
                self.working = Some(PriceBar::flat(bucket, price, DUMMY_VOLUME));
            }
        }
        Ok(true)
    }

    /// Ordered copy of the history with the working bar last.
    pub fn bars(&self) -> Vec<PriceBar> {
        let mut bars: Vec<PriceBar> = self.history.iter().cloned().collect();
        if let Some(working) = &self.working {
            bars.push(working.clone());
        }
        bars
    }
}
