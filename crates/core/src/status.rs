//! Status enumerations for the five workflow entity kinds.
//!
//! Wire representation is the server's SCREAMING_SNAKE_CASE string
//! (`"REQUESTED_CLEANING"`, `"WASHING"`, ...). Parsing an unrecognized
//! string is a data error ([`crate::ModelError::UnknownStatus`] at the
//! record level), never a panic: the ingestion pipeline drops such
//! payloads and the state machine treats them as illegal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Housekeeping status of a room. Cyclic: no terminal state, the room is a
/// single mutable slot that collapses to the latest known status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomState {
    Dirty,
    RequestedCleaning,
    Clean,
    Dnd,
}

/// Lifecycle stage of a laundry request. Ordered; `Delivered` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LaundryStage {
    Pending,
    Collected,
    Washing,
    Ready,
    Delivered,
}

/// Lifecycle stage of a restaurant order. Ordered; `Delivered` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStage {
    Received,
    Preparing,
    Ready,
    Delivered,
}

/// Binary lifecycle of an amenity request. `Delivered` removes the record
/// from the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmenityState {
    Pending,
    Delivered,
}

/// Binary lifecycle of a maintenance ticket. `Resolved` removes the record
/// from the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketState {
    Open,
    Resolved,
}

/// Maintenance ticket priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Normal,
    High,
}

macro_rules! wire_str {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// The server's wire string for this status.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }

            /// Every value of this enumeration, in lifecycle order where
            /// one exists.
            pub const ALL: &'static [$ty] = &[$($ty::$variant,)+];
        }

        impl FromStr for $ty {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    _ => Err(()),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_str!(RoomState {
    Dirty => "DIRTY",
    RequestedCleaning => "REQUESTED_CLEANING",
    Clean => "CLEAN",
    Dnd => "DND",
});

wire_str!(LaundryStage {
    Pending => "PENDING",
    Collected => "COLLECTED",
    Washing => "WASHING",
    Ready => "READY",
    Delivered => "DELIVERED",
});

wire_str!(OrderStage {
    Received => "RECEIVED",
    Preparing => "PREPARING",
    Ready => "READY",
    Delivered => "DELIVERED",
});

wire_str!(AmenityState {
    Pending => "PENDING",
    Delivered => "DELIVERED",
});

wire_str!(TicketState {
    Open => "OPEN",
    Resolved => "RESOLVED",
});

wire_str!(Priority {
    Low => "LOW",
    Normal => "NORMAL",
    High => "HIGH",
});

impl LaundryStage {
    /// The next lifecycle stage, or `None` once delivered.
    pub fn next(self) -> Option<LaundryStage> {
        match self {
            LaundryStage::Pending => Some(LaundryStage::Collected),
            LaundryStage::Collected => Some(LaundryStage::Washing),
            LaundryStage::Washing => Some(LaundryStage::Ready),
            LaundryStage::Ready => Some(LaundryStage::Delivered),
            LaundryStage::Delivered => None,
        }
    }
}

impl OrderStage {
    /// The next lifecycle stage, or `None` once delivered.
    pub fn next(self) -> Option<OrderStage> {
        match self {
            OrderStage::Received => Some(OrderStage::Preparing),
            OrderStage::Preparing => Some(OrderStage::Ready),
            OrderStage::Ready => Some(OrderStage::Delivered),
            OrderStage::Delivered => None,
        }
    }
}
