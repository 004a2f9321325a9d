//! Price zones: the trailing Donchian band and per-session extremes.

pub mod donchian;
pub mod session;

pub use donchian::{DonchianChannel, DonchianRange};
pub use session::{SessionZones, SweepTolerance, ZoneError, ZoneName, ZoneSide};
