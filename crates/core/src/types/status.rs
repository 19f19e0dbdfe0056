//! Order status state machine.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fulfillment status of an order.
///
/// Progresses strictly forward: `placed → processing → shipped → delivered`.
/// `delivered` is terminal. Stock is adjusted exactly once, on the first
/// transition out of `placed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Placed,
    Processing,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// Position of this status in the forward progression.
    const fn rank(self) -> u8 {
        match self {
            Self::Placed => 0,
            Self::Processing => 1,
            Self::Shipped => 2,
            Self::Delivered => 3,
        }
    }

    /// Whether no further transitions are allowed from this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Whether this status may transition to `next`.
    ///
    /// Only strictly-forward moves are allowed; skipping intermediate
    /// statuses is permitted (an order can go straight from `placed` to
    /// `shipped`), going backwards or standing still is not.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }

    /// The lowercase wire/storage name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "placed" => Ok(Self::Placed),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 4] = [
        OrderStatus::Placed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    #[test]
    fn transitions_move_strictly_forward() {
        assert!(OrderStatus::Placed.can_advance_to(OrderStatus::Processing));
        assert!(OrderStatus::Placed.can_advance_to(OrderStatus::Shipped));
        assert!(OrderStatus::Processing.can_advance_to(OrderStatus::Delivered));
        assert!(OrderStatus::Shipped.can_advance_to(OrderStatus::Delivered));

        assert!(!OrderStatus::Processing.can_advance_to(OrderStatus::Placed));
        assert!(!OrderStatus::Shipped.can_advance_to(OrderStatus::Processing));
    }

    #[test]
    fn no_transition_to_self() {
        for status in ALL {
            assert!(!status.can_advance_to(status));
        }
    }

    #[test]
    fn delivered_is_terminal() {
        assert!(OrderStatus::Delivered.is_terminal());
        for status in ALL {
            assert!(!OrderStatus::Delivered.can_advance_to(status));
        }
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("cancelled".parse::<OrderStatus>().is_err());
    }
}
