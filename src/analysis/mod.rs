//! Pure analysis primitives
//!
//! Zone windows and classification, time bucketing, and market session
//! windows. Nothing in here touches the database; the services feed these
//! functions with rows produced by the DuckDB queries.

pub mod buckets;
pub mod sessions;
pub mod zones;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use zones::ZoneStart;

pub use buckets::{BucketCount, NO_RETRACEMENT};
pub use sessions::{Session, SessionHours, SessionMinutes, SessionWindow, TaggedBar};
pub use zones::{ZoneCondition, ZoneConditions, ZoneHighs, ZoneLayout, ZoneRelationship, ZoneWindow};

/// Regular trading hours used by the retracement and daily statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketHours {
    /// Regular-session open; its bar is the "opening candle"
    pub open: ZoneStart,
    /// First hour that is no longer part of the session (exclusive)
    pub close_hour: u32,
    /// Hour the midnight-open retracement window starts
    pub retracement_start_hour: u32,
    /// Length of a zone's formation window in minutes
    pub formation_minutes: u32,
}

impl Default for MarketHours {
    fn default() -> Self {
        Self {
            open: ZoneStart { hour: 9, minute: 30 },
            close_hour: 16,
            retracement_start_hour: 8,
            formation_minutes: 5,
        }
    }
}

impl MarketHours {
    pub fn validate(&self) -> Result<()> {
        self.open.validate()?;
        if self.close_hour == 0 || self.close_hour > 24 {
            return Err(crate::error::AppError::Validation(format!(
                "close hour must be within 1-24, got {}",
                self.close_hour
            )));
        }
        if self.retracement_start_hour >= self.close_hour || self.open.hour >= self.close_hour {
            return Err(crate::error::AppError::Validation(
                "session open and retracement start must be before the close".to_string(),
            ));
        }
        if self.formation_minutes > 59 {
            return Err(crate::error::AppError::Validation(format!(
                "formation window must be under an hour, got {} minutes",
                self.formation_minutes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_market_hours_are_valid() {
        assert!(MarketHours::default().validate().is_ok());
    }

    #[test]
    fn test_close_before_open_rejected() {
        let hours = MarketHours {
            close_hour: 9,
            ..MarketHours::default()
        };
        assert!(hours.validate().is_err());
    }
}
