// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The thread-safe result tree reporter (§4.A).

use campaign_metadata::{NodeType, ResultNodeSummary, Status, StatusTally};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

use super::node::ResultNode;

/// A path of child indices from the tree root down to the "recent node" cursor.
type CursorPath = Vec<usize>;

struct ReporterState {
    root: ResultNode,
    cursor: CursorPath,
    halt_on_failure: bool,
    halt_on_exception: bool,
}

impl ReporterState {
    fn node_at(&self, path: &[usize]) -> &ResultNode {
        let mut node = &self.root;
        for &idx in path {
            node = &node.children[idx];
        }
        node
    }

    fn node_at_mut(&mut self, path: &[usize]) -> &mut ResultNode {
        let mut node = &mut self.root;
        for &idx in path {
            node = &mut node.children[idx];
        }
        node
    }

    /// Propagate `status` from the node at `path` up through every ancestor,
    /// including the node itself.
    fn promote_path(&mut self, path: &[usize], status: Status) {
        for depth in (0..=path.len()).rev() {
            self.node_at_mut(&path[..depth]).apply_status(status);
        }
    }
}

/// The reporter-wide lock serializes every mutation; readers (`to_text`/`to_dict`)
/// take the same lock, which is cheap enough given call rates are bounded by actual
/// test execution, not by tight loops (§4.A requires a read path available from any
/// thread at any time).
pub struct Reporter {
    state: Mutex<ReporterState>,
    halt_signal: Condvar,
}

impl Reporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ReporterState {
                root: ResultNode::new("campaign", NodeType::TestList),
                cursor: Vec::new(),
                halt_on_failure: false,
                halt_on_exception: false,
            }),
            halt_signal: Condvar::new(),
        })
    }

    pub fn set_halt_on_failure(&self, enabled: bool) {
        self.state.lock().halt_on_failure = enabled;
    }

    pub fn set_halt_on_exception(&self, enabled: bool) {
        self.state.lock().halt_on_exception = enabled;
    }

    /// Release any thread currently blocked in [`Self::add`] on a halt condition.
    pub fn release(&self) {
        self.halt_signal.notify_all();
    }

    fn push_child(&self, header: &str, node_type: NodeType) {
        let mut state = self.state.lock();
        let cursor = state.cursor.clone();
        let new_index = state.node_at(&cursor).children.len();
        state
            .node_at_mut(&cursor)
            .children
            .push(ResultNode::new(header, node_type));
        state.cursor.push(new_index);
    }

    fn pop_to(&self, node_type: NodeType) {
        let mut state = self.state.lock();
        // `end_test`/`end_list`/`end_step_group` restore the cursor to the nearest
        // enclosing ancestor of the given type, which makes them robust against case
        // code that left inner step groups open.
        while let Some(&last) = state.cursor.last() {
            let _ = last;
            let current = state.node_at(&state.cursor.clone()).node_type;
            state.cursor.pop();
            if current as u16 == node_type as u16 {
                break;
            }
        }
    }

    pub fn add_node(&self, header: &str, status: Status, message: &str, node_type: NodeType) {
        self.push_child(header, node_type);
        self.set_current(status, message);
        tracing::info!(header, status = %status, message, "add_node");
    }

    pub fn pop(&self) {
        let mut state = self.state.lock();
        state.cursor.pop();
    }

    pub fn add_test(&self, name: &str) {
        self.push_child(name, NodeType::Case);
    }

    pub fn end_test(&self) {
        self.pop_to(NodeType::Case);
    }

    pub fn add_list(&self, name: &str) {
        self.push_child(name, NodeType::TestList);
    }

    pub fn end_list(&self) {
        self.pop_to(NodeType::TestList);
    }

    pub fn add_step_group(&self, name: &str) {
        self.push_child(name, NodeType::Step);
    }

    pub fn end_step_group(&self) {
        self.pop_to(NodeType::Step);
    }

    /// Returns a detachable node header the caller can address independently of the
    /// runner cursor (used by the event scheduler, §4.F), by reserving a child of the
    /// current cursor and immediately popping back out.
    pub fn add_event_group(&self, name: &str) -> EventGroupHandle {
        self.push_child(name, NodeType::TestList);
        let mut state = self.state.lock();
        let path = state.cursor.clone();
        state.cursor.pop();
        EventGroupHandle { path }
    }

    /// Terminal step child at the current cursor (`add(status, header, message)`).
    pub fn add(&self, status: Status, header: &str, message: &str) {
        self.push_child(header, NodeType::Step);
        self.set_current(status, message);
        self.pop();
        tracing::info!(header, status = %status, message, "add");
        self.maybe_halt(status);
    }

    /// Set status/message on the node at `path` (an event group's detached subtree)
    /// and promote from there.
    pub fn add_to_group(&self, group: &EventGroupHandle, status: Status, header: &str, message: &str) {
        let mut state = self.state.lock();
        let child_index = state.node_at(&group.path).children.len();
        state
            .node_at_mut(&group.path)
            .children
            .push(ResultNode::new(header, NodeType::Step));
        let mut child_path = group.path.clone();
        child_path.push(child_index);
        state.node_at_mut(&child_path).status = status;
        state.node_at_mut(&child_path).message = message.to_string();
        state.promote_path(&child_path, status);
        drop(state);
        self.maybe_halt(status);
    }

    fn set_current(&self, status: Status, message: &str) {
        let mut state = self.state.lock();
        let path = state.cursor.clone();
        state.node_at_mut(&path).message = message.to_string();
        state.promote_path(&path, status);
    }

    fn maybe_halt(&self, status: Status) {
        let mut state = self.state.lock();
        let should_halt = (state.halt_on_failure && status == Status::Fail)
            || (state.halt_on_exception && status == Status::Exception);
        if should_halt {
            self.halt_signal.wait(&mut state);
        }
    }

    pub fn search_result(&self, name: &str) -> Option<ResultNodeSummary> {
        self.state.lock().root.search_result(name).map(ResultNode::to_dict)
    }

    pub fn get_test_point_stats(&self) -> StatusTally {
        self.state.lock().root.point_stats()
    }

    pub fn get_test_case_stats(&self) -> StatusTally {
        self.state.lock().root.case_stats()
    }

    pub fn to_text(&self) -> String {
        let state = self.state.lock();
        let mut out = String::new();
        state.root.to_text(0, &mut out);
        out
    }

    pub fn to_dict(&self) -> ResultNodeSummary {
        self.state.lock().root.to_dict()
    }
}

/// A handle to a node created by [`Reporter::add_event_group`]; addressed by path
/// rather than reference since the tree is owned by the reporter's mutex.
#[derive(Clone, Debug)]
pub struct EventGroupHandle {
    path: CursorPath,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_test_and_end_test_restore_cursor() {
        let reporter = Reporter::new();
        reporter.add_list("suite");
        reporter.add_test("case_one");
        reporter.add_step_group("SETUP");
        reporter.add(Status::Pass, "init device", "ok");
        // leave the step group open on purpose; end_test must still recover
        reporter.end_test();
        reporter.add_test("case_two");
        reporter.end_test();
        reporter.end_list();
        let dict = reporter.to_dict();
        assert_eq!(dict.children.len(), 1);
        assert_eq!(dict.children[0].children.len(), 2);
    }

    #[test]
    fn exception_promotes_case_and_list() {
        let reporter = Reporter::new();
        reporter.add_list("suite");
        reporter.add_test("case_one");
        reporter.add(Status::Exception, "boom", "it broke");
        reporter.end_test();
        reporter.end_list();
        let dict = reporter.to_dict();
        assert_eq!(dict.status, Status::Exception);
        assert_eq!(dict.children[0].status, Status::Exception);
    }

    #[test]
    fn stats_count_leaves_and_cases_separately() {
        let reporter = Reporter::new();
        reporter.add_list("suite");
        reporter.add_test("case_one");
        reporter.add(Status::Pass, "step", "ok");
        reporter.end_test();
        reporter.add_test("case_two");
        reporter.add(Status::Fail, "step", "bad");
        reporter.end_test();
        reporter.end_list();
        let points = reporter.get_test_point_stats();
        assert_eq!(points.pass, 1);
        assert_eq!(points.fail, 1);
        let cases = reporter.get_test_case_stats();
        assert_eq!(cases.pass, 1);
        assert_eq!(cases.fail, 1);
    }
}
