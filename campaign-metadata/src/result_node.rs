// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The JSON projection of a result tree (`to_dict`, §4.A) and the status/type enums
//! shared between the reporter and its consumers.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Severity of a result node, ordered so that `Status::EXCEPTION` is the highest and
/// `Status::Info` never promotes an ancestor (§4.A).
///
/// The discriminants are stable across releases since they round-trip in
/// `to_dict()`/archived result files. Serialized as their integer discriminant rather
/// than their name, matching the reference source's `IntEnum` wire shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Status {
    Info = 1,
    Pass = 2,
    Warning = 3,
    Fail = 4,
    Error = 5,
    Exception = 6,
}

impl Status {
    /// Whether setting this status on a node can ever promote its severity, per the
    /// promotion rule: `INFO` is inert, everything else can raise a node still sitting
    /// at `INFO`/`PASS`.
    pub fn is_promoting(self) -> bool {
        !matches!(self, Status::Info)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Info => "INFO",
            Status::Pass => "PASS",
            Status::Warning => "WARNING",
            Status::Fail => "FAIL",
            Status::Error => "ERROR",
            Status::Exception => "EXCEPTION",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        match value {
            1 => Ok(Status::Info),
            2 => Ok(Status::Pass),
            3 => Ok(Status::Warning),
            4 => Ok(Status::Fail),
            5 => Ok(Status::Error),
            6 => Ok(Status::Exception),
            other => Err(serde::de::Error::custom(format!(
                "invalid status discriminant {other}"
            ))),
        }
    }
}

/// The kind of a result node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum NodeType {
    Step = 1,
    Case = 2,
    TestList = 4,
    Other = 256,
}

impl NodeType {
    /// Only `Case`/`Step` nodes participate in status promotion (§4.A).
    pub fn participates_in_promotion(self) -> bool {
        matches!(self, NodeType::Case | NodeType::Step)
    }
}

impl Serialize for NodeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(*self as u16)
    }
}

impl<'de> Deserialize<'de> for NodeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u16::deserialize(deserializer)?;
        match value {
            1 => Ok(NodeType::Step),
            2 => Ok(NodeType::Case),
            4 => Ok(NodeType::TestList),
            256 => Ok(NodeType::Other),
            other => Err(serde::de::Error::custom(format!(
                "invalid node-type discriminant {other}"
            ))),
        }
    }
}

/// The structural, JSON-friendly projection of a result node returned by
/// `ResultNode::to_dict()`. Lossless for header/status/message/type/children/timestamp
/// (§8 round-trip law).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultNodeSummary {
    pub header: String,
    pub status: Status,
    pub message: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub timestamp: DateTime<FixedOffset>,
    pub children: Vec<ResultNodeSummary>,
}

/// Leaf-status tallies returned by `get_test_point_stats`/`get_test_case_stats`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTally {
    pub pass: usize,
    pub fail: usize,
    pub error: usize,
    pub warning: usize,
    pub exception: usize,
}

impl StatusTally {
    pub fn record(&mut self, status: Status) {
        match status {
            Status::Pass => self.pass += 1,
            Status::Fail => self.fail += 1,
            Status::Error => self.error += 1,
            Status::Warning => self.warning += 1,
            Status::Exception => self.exception += 1,
            Status::Info => {}
        }
    }

    pub fn add(&mut self, other: StatusTally) {
        self.pass += other.pass;
        self.fail += other.fail;
        self.error += other.error;
        self.warning += other.warning;
        self.exception += other.exception;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order_matches_design() {
        assert!(Status::Info < Status::Pass);
        assert!(Status::Pass < Status::Warning);
        assert!(Status::Warning < Status::Fail);
        assert!(Status::Fail < Status::Error);
        assert!(Status::Error < Status::Exception);
    }

    #[test]
    fn info_never_promotes() {
        assert!(!Status::Info.is_promoting());
        for status in [
            Status::Pass,
            Status::Warning,
            Status::Fail,
            Status::Error,
            Status::Exception,
        ] {
            assert!(status.is_promoting());
        }
    }

    #[test]
    fn status_round_trips_through_json() {
        for status in [
            Status::Info,
            Status::Pass,
            Status::Warning,
            Status::Fail,
            Status::Error,
            Status::Exception,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            let back: Status = serde_json::from_str(&json).unwrap();
            assert_eq!(status, back);
        }
    }

    #[test]
    fn rejects_unknown_status_discriminant() {
        let err = serde_json::from_str::<Status>("99");
        assert!(err.is_err());
    }
}
