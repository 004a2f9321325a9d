//! Domain types for the TQS engine.

pub mod bar;
pub mod sentiment;
pub mod tick;
pub mod trade;

pub use bar::{PriceBar, RawBar};
pub use sentiment::{SentimentPoint, SentimentScore};
pub use tick::Tick;
pub use trade::{Direction, Outcome, TradeCandidate, TradeRecord};

/// Symbol type alias
pub type Symbol = String;
