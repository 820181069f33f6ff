use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Customer Value Objects
// ============================================================================

/// Lifetime value at or above this is `High`
pub const HIGH_VALUE_THRESHOLD: f64 = 500.0;
/// Lifetime value at or above this (and below `HIGH_VALUE_THRESHOLD`) is `Medium`
pub const MEDIUM_VALUE_THRESHOLD: f64 = 200.0;

/// Customer bucket by lifetime value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CustomerSegment {
    High,
    Medium,
    Low,
}

impl CustomerSegment {
    pub const ALL: [CustomerSegment; 3] = [
        CustomerSegment::High,
        CustomerSegment::Medium,
        CustomerSegment::Low,
    ];

    pub fn for_lifetime_value(lifetime_value: f64) -> Self {
        if lifetime_value >= HIGH_VALUE_THRESHOLD {
            CustomerSegment::High
        } else if lifetime_value >= MEDIUM_VALUE_THRESHOLD {
            CustomerSegment::Medium
        } else {
            CustomerSegment::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerSegment::High => "High",
            CustomerSegment::Medium => "Medium",
            CustomerSegment::Low => "Low",
        }
    }
}

impl fmt::Display for CustomerSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_thresholds() {
        assert_eq!(CustomerSegment::for_lifetime_value(500.0), CustomerSegment::High);
        assert_eq!(CustomerSegment::for_lifetime_value(1200.0), CustomerSegment::High);
        assert_eq!(CustomerSegment::for_lifetime_value(499.99), CustomerSegment::Medium);
        assert_eq!(CustomerSegment::for_lifetime_value(200.0), CustomerSegment::Medium);
        assert_eq!(CustomerSegment::for_lifetime_value(199.99), CustomerSegment::Low);
        assert_eq!(CustomerSegment::for_lifetime_value(0.0), CustomerSegment::Low);
    }
}
