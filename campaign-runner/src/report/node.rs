// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The in-memory result tree node (§4.A).

use campaign_metadata::{NodeType, ResultNodeSummary, Status, StatusTally};
use chrono::{DateTime, FixedOffset, Local};

/// One node of the result tree. Owns its children; the reporter holds the root and
/// a path (of indices) to the "recent node" cursor rather than raw pointers, so the
/// tree stays a plain owned structure under a single mutex.
#[derive(Clone, Debug)]
pub struct ResultNode {
    pub header: String,
    pub status: Status,
    pub message: String,
    pub node_type: NodeType,
    pub timestamp: DateTime<FixedOffset>,
    pub children: Vec<ResultNode>,
}

impl ResultNode {
    pub fn new(header: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            header: header.into(),
            status: Status::Info,
            message: String::new(),
            node_type,
            timestamp: Local::now().fixed_offset(),
            children: Vec::new(),
        }
    }

    /// Apply the status promotion rule (§4.A): only `Case`/`Step` nodes participate;
    /// `INFO` never promotes; a node already above `{INFO, PASS}` is left alone (the
    /// running max is preserved, not overwritten by a later lower-severity status).
    pub fn apply_status(&mut self, status: Status) {
        if !self.node_type.participates_in_promotion() {
            return;
        }
        if !status.is_promoting() {
            return;
        }
        if matches!(self.status, Status::Info | Status::Pass) {
            self.status = status;
        }
    }

    pub fn to_dict(&self) -> ResultNodeSummary {
        ResultNodeSummary {
            header: self.header.clone(),
            status: self.status,
            message: self.message.clone(),
            node_type: self.node_type,
            timestamp: self.timestamp,
            children: self.children.iter().map(ResultNode::to_dict).collect(),
        }
    }

    /// `to_text(indent)`: a line per node, headline dot-padded to width 80 against its
    /// status for `Case`/`Step` nodes, children recursing at `indent + 1`.
    pub fn to_text(&self, indent: usize, out: &mut String) {
        let pad = "  ".repeat(indent);
        if self.node_type.participates_in_promotion() {
            let headline = format!("{pad}{}", self.header);
            let dots_needed = 80usize.saturating_sub(headline.len() + self.status.as_str().len());
            let dots = ".".repeat(dots_needed.max(1));
            out.push_str(&headline);
            out.push_str(&dots);
            out.push_str(self.status.as_str());
            out.push('\n');
        } else {
            out.push_str(&pad);
            out.push_str(&self.header);
            out.push_str(": ");
            out.push_str(&self.message);
            out.push('\n');
        }
        for child in &self.children {
            child.to_text(indent + 1, out);
        }
    }

    /// Depth-first search restricted to non-`Step` nodes, matching `search_result`.
    pub fn search_result(&self, name: &str) -> Option<&ResultNode> {
        if !matches!(self.node_type, NodeType::Step) && self.header == name {
            return Some(self);
        }
        for child in &self.children {
            if let Some(found) = child.search_result(name) {
                return Some(found);
            }
        }
        None
    }

    /// Counts leaves by status (`get_test_point_stats`). A childless node counts once
    /// under its own status; otherwise the count sums over children.
    pub fn point_stats(&self) -> StatusTally {
        if self.children.is_empty() {
            let mut tally = StatusTally::default();
            tally.record(self.status);
            return tally;
        }
        let mut tally = StatusTally::default();
        for child in &self.children {
            tally.add(child.point_stats());
        }
        tally
    }

    /// Counts `Case`-typed nodes only (`get_test_case_stats`).
    pub fn case_stats(&self) -> StatusTally {
        let mut tally = StatusTally::default();
        if matches!(self.node_type, NodeType::Case) {
            tally.record(self.status);
        }
        for child in &self.children {
            tally.add(child.case_stats());
        }
        tally
    }
}
