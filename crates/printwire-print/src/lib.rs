// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printwire Print — IPP Print-Job submission (via the `ipp` crate), and the
// dispatcher that takes one print request from a PDF on disk to a job id
// on a network printer.

pub mod dispatcher;
pub mod ipp_client;
pub mod job_builder;

#[cfg(any(test, feature = "mock-printer"))]
pub mod mock_printer;

pub use dispatcher::PrintDispatcher;
pub use ipp::prelude::{IppAttribute, IppValue};
pub use ipp_client::{IppJobSubmitter, JobSubmitter, PrinterEndpoint};
