// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Routes host method calls to the print dispatcher.
//
//   printPDF         -> "success", or error(code, message)
//   printInvoicePdf  -> "success", "error:missing-params" or "error:<message>"
//   anything else    -> not implemented

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use printwire_core::types::PrintOutcome;
use printwire_print::PrintDispatcher;

use crate::args::{self, InvoiceArgs, PrintPdfArgs};
use crate::traits::{MethodCall, MethodResult};

pub const METHOD_PRINT_PDF: &str = "printPDF";
pub const METHOD_PRINT_INVOICE_PDF: &str = "printInvoicePdf";

/// Token replied on success by both print methods.
pub const SUCCESS: &str = "success";

/// Invoice reply when `filePath` or `ip` is missing.
pub const MISSING_PARAMS: &str = "error:missing-params";

/// Handles the print method channel.
///
/// Calls return immediately; the print itself runs on `runtime` and replies
/// through the `MethodResult` when done.
pub struct PrintChannelHandler {
    dispatcher: PrintDispatcher,
    runtime: Handle,
}

impl PrintChannelHandler {
    pub fn new(dispatcher: PrintDispatcher, runtime: Handle) -> Self {
        Self {
            dispatcher,
            runtime,
        }
    }

    /// Handle one call. Returns the task running the print, if one was
    /// started.
    #[instrument(skip_all, fields(method = %call.method))]
    pub fn handle(&self, call: MethodCall, result: Box<dyn MethodResult>) -> Option<JoinHandle<()>> {
        match call.method.as_str() {
            METHOD_PRINT_PDF => self.print_pdf(&call.arguments, result),
            METHOD_PRINT_INVOICE_PDF => self.print_invoice_pdf(&call.arguments, result),
            other => {
                warn!(method = other, "unknown method");
                result.not_implemented();
                None
            }
        }
    }

    fn print_pdf(&self, arguments: &Value, result: Box<dyn MethodResult>) -> Option<JoinHandle<()>> {
        let request = match args::parse::<PrintPdfArgs>(arguments).and_then(PrintPdfArgs::into_request) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "printPDF rejected");
                result.error(e.kind().code(), &e.to_string());
                return None;
            }
        };

        info!(path = %request.source_path.display(), ip = %request.printer_address, "printPDF");
        Some(self.dispatcher.spawn_on(&self.runtime, request, move |outcome| match outcome {
            PrintOutcome::Succeeded(_) => result.success(Value::from(SUCCESS)),
            PrintOutcome::Failed { kind, message, .. } => result.error(kind.code(), &message),
        }))
    }

    fn print_invoice_pdf(
        &self,
        arguments: &Value,
        result: Box<dyn MethodResult>,
    ) -> Option<JoinHandle<()>> {
        let request = args::parse::<InvoiceArgs>(arguments)
            .ok()
            .and_then(InvoiceArgs::into_request);
        let Some(request) = request else {
            warn!("printInvoicePdf missing filePath or ip");
            result.success(Value::from(MISSING_PARAMS));
            return None;
        };

        info!(path = %request.source_path.display(), ip = %request.printer_address, "printInvoicePdf");
        Some(self.dispatcher.spawn_on(&self.runtime, request, move |outcome| match outcome {
            PrintOutcome::Succeeded(_) => result.success(Value::from(SUCCESS)),
            PrintOutcome::Failed { message, .. } => {
                result.success(Value::from(format!("error:{message}")))
            }
        }))
    }
}
