//! Calls that have started but not yet completed.
//!
//! Calls carrying a tool-use id are keyed by it. Calls without one go on a
//! per-tool-name stack and are paired with the most recent open call of the
//! same name.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use research_core::{AgentIdentity, Attribution};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct InFlightCall {
    pub tool_name: String,
    pub tool_use_id: Option<String>,
    pub input: Value,
    pub agent: AgentIdentity,
    pub attribution: Attribution,
    pub started_at: DateTime<Utc>,
    /// Arrival order across the whole session.
    pub seq: u64,
}

#[derive(Debug, Default)]
pub struct InFlightTable {
    by_token: HashMap<String, InFlightCall>,
    by_name: HashMap<String, Vec<InFlightCall>>,
    next_seq: u64,
}

impl InFlightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next arrival sequence number.
    pub fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Register a started call. Returns the call it displaced when its
    /// tool-use id was already open.
    pub fn open(&mut self, call: InFlightCall) -> Option<InFlightCall> {
        match call.tool_use_id.clone() {
            Some(token) => self.by_token.insert(token, call),
            None => {
                self.by_name.entry(call.tool_name.clone()).or_default().push(call);
                None
            }
        }
    }

    /// Remove and return the call a completion belongs to.
    ///
    /// Lookup order: exact tool-use id, then the newest token-less call of the
    /// same tool, then (only when the completion has no id of its own) the
    /// newest id-keyed call of the same tool.
    pub fn close(&mut self, tool_name: &str, token: Option<&str>) -> Option<InFlightCall> {
        if let Some(token) = token {
            if let Some(call) = self.by_token.remove(token) {
                return Some(call);
            }
        }

        if let Some(stack) = self.by_name.get_mut(tool_name) {
            if let Some(call) = stack.pop() {
                if stack.is_empty() {
                    self.by_name.remove(tool_name);
                }
                return Some(call);
            }
        }

        if token.is_none() {
            let newest = self
                .by_token
                .iter()
                .filter(|(_, call)| call.tool_name == tool_name)
                .max_by_key(|(_, call)| call.seq)
                .map(|(key, _)| key.clone());
            if let Some(key) = newest {
                return self.by_token.remove(&key);
            }
        }

        None
    }

    pub fn len(&self) -> usize {
        self.by_token.len() + self.by_name.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of open calls in arrival order.
    pub fn snapshot(&self) -> Vec<InFlightCall> {
        let mut calls: Vec<_> = self.by_token.values().chain(self.by_name.values().flatten()).cloned().collect();
        calls.sort_by_key(|call| call.seq);
        calls
    }

    /// Take every open call, oldest first.
    pub fn drain(&mut self) -> Vec<InFlightCall> {
        let mut calls: Vec<_> = self.by_token.drain().map(|(_, call)| call).collect();
        calls.extend(self.by_name.drain().flat_map(|(_, stack)| stack));
        calls.sort_by_key(|call| call.seq);
        calls
    }
}
