// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Method-channel abstractions shared by every host.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::warn;

/// One call from the host: a method name and its JSON arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// The host's reply slot for one call.
///
/// Every method takes `self: Box<Self>`, so a result can be answered once.
pub trait MethodResult: Send {
    fn success(self: Box<Self>, value: Value);

    fn error(self: Box<Self>, code: &str, message: &str);

    fn not_implemented(self: Box<Self>);
}

/// A reply as delivered to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChannelReply {
    Success { value: Value },
    Error { code: String, message: String },
    NotImplemented,
}

/// [`MethodResult`] that forwards the reply over a oneshot channel.
struct OneshotResult(oneshot::Sender<ChannelReply>);

impl OneshotResult {
    fn send(self, reply: ChannelReply) {
        if self.0.send(reply).is_err() {
            warn!("method reply dropped: caller stopped waiting");
        }
    }
}

impl MethodResult for OneshotResult {
    fn success(self: Box<Self>, value: Value) {
        self.send(ChannelReply::Success { value });
    }

    fn error(self: Box<Self>, code: &str, message: &str) {
        self.send(ChannelReply::Error {
            code: code.to_string(),
            message: message.to_string(),
        });
    }

    fn not_implemented(self: Box<Self>) {
        self.send(ChannelReply::NotImplemented);
    }
}

/// A result slot plus the receiver its reply arrives on.
pub fn reply_channel() -> (Box<dyn MethodResult>, oneshot::Receiver<ChannelReply>) {
    let (tx, rx) = oneshot::channel();
    (Box::new(OneshotResult(tx)), rx)
}
