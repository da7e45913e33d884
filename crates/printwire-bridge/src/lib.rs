// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printwire Bridge — the method-channel surface a host application calls.
//
// A host delivers a `MethodCall` (method name plus JSON arguments) and a
// one-shot `MethodResult`. Arguments are parsed into typed requests here,
// at the boundary, and the print pipeline itself only ever sees a
// `PrintRequest`.

pub mod args;
pub mod handler;
pub mod traits;

pub use handler::PrintChannelHandler;
pub use traits::{ChannelReply, MethodCall, MethodResult, reply_channel};
