#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use serde_json::Value;

use crate::error::TransportError;
use crate::transport::{ConnectorTransport, HttpReply};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub target: String,
    pub body: Option<Value>,
    pub authorization: Option<String>,
}

/// Answers calls in order from a fixed script and records each call.
#[derive(Default)]
pub struct ScriptedTransport {
    script: RefCell<VecDeque<Result<HttpReply, TransportError>>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, status: u16, body: Value) -> Self {
        self.push(Ok(HttpReply::new(status, body.to_string())))
    }

    pub fn reply_text(self, status: u16, body: &str) -> Self {
        self.push(Ok(HttpReply::new(status, body)))
    }

    pub fn reply_times(mut self, times: usize, status: u16, body: Value) -> Self {
        for _ in 0..times {
            self = self.reply(status, body.clone());
        }
        self
    }

    pub fn fail(self, kind: &'static str) -> Self {
        self.push(Err(TransportError::new(kind, "scripted", "scripted failure")))
    }

    fn push(self, entry: Result<HttpReply, TransportError>) -> Self {
        self.script.borrow_mut().push_back(entry);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }

    fn answer(&self, call: RecordedCall) -> Result<HttpReply, TransportError> {
        let target = call.target.clone();
        self.calls.borrow_mut().push(call);
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unscripted call to {target}"))
    }
}

impl ConnectorTransport for ScriptedTransport {
    fn post_management(&self, path: &str, body: &Value) -> Result<HttpReply, TransportError> {
        self.answer(RecordedCall {
            method: "POST",
            target: path.to_string(),
            body: Some(body.clone()),
            authorization: None,
        })
    }

    fn get_management(&self, path: &str) -> Result<HttpReply, TransportError> {
        self.answer(RecordedCall {
            method: "GET",
            target: path.to_string(),
            body: None,
            authorization: None,
        })
    }

    fn get_url(&self, url: &str, authorization: Option<&str>) -> Result<HttpReply, TransportError> {
        self.answer(RecordedCall {
            method: "GET",
            target: url.to_string(),
            body: None,
            authorization: authorization.map(str::to_string),
        })
    }
}
