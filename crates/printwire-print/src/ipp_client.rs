// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Async IPP client: submits one Print-Job (RFC 8011 §4.2.1) to a network
// printer using the `ipp` crate's async API.
//
// The target is `ipp://{address}:{port}{resource_path}`. There are no retries
// and no job polling; success means the printer accepted the job and
// returned a job-id.

use std::io::Cursor;
use std::net::Ipv6Addr;
use std::time::Duration;

use async_trait::async_trait;
use ipp::prelude::*;
use tracing::{debug, error, info, instrument};

use printwire_core::config::DispatchConfig;
use printwire_core::error::{PrintwireError, Result};

/// Something that can deliver a PDF and its job attributes to a printer.
///
/// The dispatcher only talks to this trait, so tests can count or fake
/// submissions without a network.
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    /// Submit `document` to the printer at `printer_address` and return the
    /// printer-assigned job id.
    async fn submit(
        &self,
        document: Vec<u8>,
        printer_address: &str,
        attributes: &[IppAttribute],
    ) -> Result<i32>;
}

/// Where a printer's IPP service lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterEndpoint {
    /// Host as it appears in a URI (IPv6 literals bracketed).
    host: String,
    port: u16,
    resource_path: String,
}

impl PrinterEndpoint {
    /// Validate a printer address (IPv4, IPv6 or host name) into an endpoint.
    pub fn new(address: &str, port: u16, resource_path: &str) -> Result<Self> {
        let trimmed = address.trim();
        let unbracketed = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(trimmed);

        let host = if unbracketed.parse::<Ipv6Addr>().is_ok() {
            format!("[{unbracketed}]")
        } else if is_valid_host(unbracketed) {
            unbracketed.to_string()
        } else {
            return Err(PrintwireError::PrintTransport(format!(
                "invalid printer address '{address}'"
            )));
        };

        Ok(Self {
            host,
            port,
            resource_path: resource_path.to_string(),
        })
    }

    /// `ipp://host:port/path`.
    pub fn uri(&self) -> String {
        format!("ipp://{}:{}{}", self.host, self.port, self.resource_path)
    }

    /// The endpoint as a parsed URI for the `ipp` client.
    fn parsed_uri(&self) -> Result<Uri> {
        let uri = self.uri();
        uri.parse()
            .map_err(|e| PrintwireError::PrintTransport(format!("invalid printer URI '{uri}': {e}")))
    }
}

/// IPv4 literals and DNS names: non-empty, no URI or whitespace characters.
fn is_valid_host(host: &str) -> bool {
    !host.is_empty()
        && host.len() <= 253
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
}

/// [`JobSubmitter`] backed by the `ipp` crate's [`AsyncIppClient`].
///
/// Holds only configuration; every submission builds its own operation and
/// client, so concurrent requests share nothing mutable.
pub struct IppJobSubmitter {
    port: u16,
    resource_path: String,
    requesting_user_name: String,
    timeout: Option<Duration>,
}

impl IppJobSubmitter {
    pub fn new(config: &DispatchConfig) -> Self {
        Self {
            port: config.ipp_port,
            resource_path: config.resource_path.clone(),
            requesting_user_name: config.requesting_user_name.clone(),
            timeout: config.request_timeout(),
        }
    }
}

#[async_trait]
impl JobSubmitter for IppJobSubmitter {
    #[instrument(skip(self, document, attributes), fields(bytes = document.len()))]
    async fn submit(
        &self,
        document: Vec<u8>,
        printer_address: &str,
        attributes: &[IppAttribute],
    ) -> Result<i32> {
        let endpoint = PrinterEndpoint::new(printer_address, self.port, &self.resource_path)?;
        let uri = endpoint.parsed_uri()?;

        let payload = IppPayload::new(Cursor::new(document));
        let mut builder = IppOperationBuilder::print_job(uri.clone(), payload)
            .user_name(self.requesting_user_name.clone());
        // job-name and document-format are operation attributes; the rest
        // form the job template.
        for attr in attributes {
            builder = match attr.name() {
                "job-name" => builder.job_title(attr.value().to_string()),
                "document-format" => builder.document_format(attr.value().to_string()),
                _ => builder.attribute(attr.clone()),
            };
        }
        let operation = builder.build();
        let client = AsyncIppClient::new(uri.clone());

        info!(%uri, "sending Print-Job");
        let send = client.send(operation);
        let sent = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, send).await.map_err(|_| {
                PrintwireError::PrintTransport(format!(
                    "request to {uri} timed out after {}s",
                    limit.as_secs()
                ))
            })?,
            None => send.await,
        };
        let response = sent.map_err(|e| {
            PrintwireError::PrintTransport(format!("Print-Job to {uri}: {}", error_chain(&e)))
        })?;

        let header = response.header();
        let code = header.operation_or_status;
        debug!(status = %format!("0x{code:04X}"), "received Print-Job response");

        if !header.status_code().is_success() {
            let name = status_code_name(code);
            error!(status = name, "Print-Job rejected");
            let detail = status_message(response.attributes())
                .map(|msg| format!(": {msg}"))
                .unwrap_or_default();
            return Err(PrintwireError::PrintTransport(format!(
                "Print-Job returned {name} (0x{code:04X}){detail}"
            )));
        }

        let job_id = extract_job_id(response.attributes()).ok_or_else(|| {
            PrintwireError::PrintTransport("Print-Job response missing job-id attribute".into())
        })?;

        info!(job_id, "print job accepted by printer");
        Ok(job_id)
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Extract the `job-id` integer from a response's Job Attributes group.
fn extract_job_id(attrs: &IppAttributes) -> Option<i32> {
    for group in attrs.groups_of(DelimiterTag::JobAttributes) {
        if let Some(attr) = group.attributes().get("job-id")
            && let IppValue::Integer(id) = attr.value()
        {
            return Some(*id);
        }
    }
    None
}

/// `status-message` from the operation attributes group, if the printer sent one.
fn status_message(attrs: &IppAttributes) -> Option<String> {
    attrs
        .groups_of(DelimiterTag::OperationAttributes)
        .find_map(|group| group.attributes().get("status-message"))
        .map(|attr| attr.value().to_string())
}

/// An error and its sources, joined, so the root cause (e.g. "connection
/// refused") stays visible.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

/// Keyword for an IPP status code (RFC 8011 §4.1.6), or `"unknown-status"`.
pub fn status_code_name(code: u16) -> &'static str {
    match code {
        0x0000 => "successful-ok",
        0x0001 => "successful-ok-ignored-or-substituted-attributes",
        0x0002 => "successful-ok-conflicting-attributes",
        0x0400 => "client-error-bad-request",
        0x0401 => "client-error-forbidden",
        0x0402 => "client-error-not-authenticated",
        0x0403 => "client-error-not-authorized",
        0x0404 => "client-error-not-possible",
        0x0405 => "client-error-timeout",
        0x0406 => "client-error-not-found",
        0x0407 => "client-error-gone",
        0x0408 => "client-error-request-entity-too-large",
        0x0409 => "client-error-request-value-too-long",
        0x040A => "client-error-document-format-not-supported",
        0x040B => "client-error-attributes-or-values-not-supported",
        0x040C => "client-error-uri-scheme-not-supported",
        0x040D => "client-error-charset-not-supported",
        0x040E => "client-error-conflicting-attributes",
        0x040F => "client-error-compression-not-supported",
        0x0410 => "client-error-compression-error",
        0x0411 => "client-error-document-format-error",
        0x0412 => "client-error-document-access-error",
        0x0500 => "server-error-internal-error",
        0x0501 => "server-error-operation-not-supported",
        0x0502 => "server-error-service-unavailable",
        0x0503 => "server-error-version-not-supported",
        0x0504 => "server-error-device-error",
        0x0505 => "server-error-temporary-error",
        0x0506 => "server-error-not-accepting-jobs",
        0x0507 => "server-error-busy",
        0x0508 => "server-error-job-canceled",
        0x0509 => "server-error-multiple-document-jobs-not-supported",
        _ => "unknown-status",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job_builder;
    use crate::mock_printer::wire::OP_PRINT_JOB;
    use crate::mock_printer::{MockBehaviour, MockPrinter, TAG_JOB_ATTRIBUTES, TAG_OPERATION_ATTRIBUTES};
    use printwire_core::types::PrintOptions;

    fn attributes() -> Vec<IppAttribute> {
        job_builder::build(&PrintOptions::default(), "IPP_Print_PDF")
    }

    #[test]
    fn endpoint_uri_for_ipv4() {
        let endpoint = PrinterEndpoint::new("192.168.1.50", 631, "/ipp/print").unwrap();
        assert_eq!(endpoint.uri(), "ipp://192.168.1.50:631/ipp/print");
        assert!(endpoint.parsed_uri().is_ok());
    }

    #[test]
    fn endpoint_brackets_ipv6() {
        let endpoint = PrinterEndpoint::new("fe80::1", 631, "/ipp/print").unwrap();
        assert_eq!(endpoint.uri(), "ipp://[fe80::1]:631/ipp/print");

        let bracketed = PrinterEndpoint::new("[::1]", 8631, "/ipp/print").unwrap();
        assert_eq!(bracketed.uri(), "ipp://[::1]:8631/ipp/print");
        assert!(bracketed.parsed_uri().is_ok());
    }

    #[test]
    fn endpoint_accepts_host_names() {
        let endpoint = PrinterEndpoint::new(" office-printer.local ", 631, "/ipp/print").unwrap();
        assert_eq!(endpoint.uri(), "ipp://office-printer.local:631/ipp/print");
    }

    #[test]
    fn endpoint_rejects_bad_addresses() {
        for address in ["", "   ", "192.168.1.50/ipp", "printer:631", "a b", "user@host"] {
            let err = PrinterEndpoint::new(address, 631, "/ipp/print").unwrap_err();
            assert!(err.to_string().contains("invalid printer address"), "{address}");
        }
    }

    #[test]
    fn status_names() {
        assert_eq!(status_code_name(0x0000), "successful-ok");
        assert_eq!(
            status_code_name(0x040A),
            "client-error-document-format-not-supported"
        );
        assert_eq!(status_code_name(0x0507), "server-error-busy");
        assert_eq!(status_code_name(0x0777), "unknown-status");
    }

    #[test]
    fn error_chain_keeps_root_cause() {
        let root = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let outer = std::io::Error::other(root);
        // io::Error::other displays its inner error, so nothing is repeated.
        assert_eq!(error_chain(&outer), "connection refused");
    }

    #[tokio::test]
    async fn submits_and_returns_job_id() {
        let printer = MockPrinter::start(MockBehaviour::Accept { job_id: 314 })
            .await
            .unwrap();
        let submitter = IppJobSubmitter::new(&printer.config());

        let job_id = submitter
            .submit(b"%PDF-1.5 test".to_vec(), printer.address(), &attributes())
            .await
            .unwrap();
        assert_eq!(job_id, 314);

        let jobs = printer.jobs();
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.http_path, "/ipp/print");
        assert_eq!(job.message.code, OP_PRINT_JOB);
        assert_eq!(job.message.data, b"%PDF-1.5 test");

        let operation = job.message.group(TAG_OPERATION_ATTRIBUTES).unwrap();
        let printer_uri = operation.get("printer-uri").unwrap().as_str().unwrap();
        assert!(
            printer_uri.contains(&format!("127.0.0.1:{}/ipp/print", printer.port())),
            "{printer_uri}"
        );
        assert_eq!(operation.get("job-name").unwrap().as_str(), Some("IPP_Print_PDF"));
        assert_eq!(
            operation.get("document-format").unwrap().as_str(),
            Some("application/pdf")
        );
        assert_eq!(
            operation.get("requesting-user-name").unwrap().as_str(),
            Some("printwire")
        );

        let job_group = job.message.group(TAG_JOB_ATTRIBUTES).unwrap();
        assert_eq!(job_group.get("sides").unwrap().as_str(), Some("one-sided"));
        assert_eq!(job_group.get("print-quality").unwrap().as_integer(), Some(5));
        assert_eq!(job_group.get("copies").unwrap().as_integer(), Some(1));
        assert!(job_group.get("job-name").is_none());
    }

    #[tokio::test]
    async fn concurrent_submissions_each_get_their_reply() {
        let printer = MockPrinter::start(MockBehaviour::Accept { job_id: 6 })
            .await
            .unwrap();
        let submitter = IppJobSubmitter::new(&printer.config());
        let attributes = attributes();

        let (a, b) = tokio::join!(
            submitter.submit(b"%PDF a".to_vec(), printer.address(), &attributes),
            submitter.submit(b"%PDF b".to_vec(), printer.address(), &attributes),
        );
        assert_eq!(a.unwrap(), 6);
        assert_eq!(b.unwrap(), 6);

        let mut payloads: Vec<Vec<u8>> = printer
            .jobs()
            .into_iter()
            .map(|job| job.message.data)
            .collect();
        payloads.sort();
        assert_eq!(payloads, [b"%PDF a".to_vec(), b"%PDF b".to_vec()]);
    }

    #[tokio::test]
    async fn chunked_reply_is_understood() {
        let printer = MockPrinter::start(MockBehaviour::AcceptChunked { job_id: 8 })
            .await
            .unwrap();
        let submitter = IppJobSubmitter::new(&printer.config());
        let job_id = submitter
            .submit(b"%PDF".to_vec(), printer.address(), &attributes())
            .await
            .unwrap();
        assert_eq!(job_id, 8);
    }

    #[tokio::test]
    async fn ipp_error_status_is_a_transport_error() {
        let printer = MockPrinter::start(MockBehaviour::Reject {
            status: 0x040A,
            message: "PDF not supported".into(),
        })
        .await
        .unwrap();
        let submitter = IppJobSubmitter::new(&printer.config());

        let err = submitter
            .submit(b"%PDF".to_vec(), printer.address(), &attributes())
            .await
            .unwrap_err();
        let text = err.to_string();
        assert!(matches!(err, PrintwireError::PrintTransport(_)));
        assert!(text.contains("client-error-document-format-not-supported"), "{text}");
        assert!(text.contains("0x040A"), "{text}");
        assert!(text.contains("PDF not supported"), "{text}");
    }

    #[tokio::test]
    async fn http_error_is_a_transport_error() {
        let printer = MockPrinter::start(MockBehaviour::HttpStatus(404)).await.unwrap();
        let submitter = IppJobSubmitter::new(&printer.config());
        let err = submitter
            .submit(b"%PDF".to_vec(), printer.address(), &attributes())
            .await
            .unwrap_err();
        assert!(matches!(err, PrintwireError::PrintTransport(_)));
        assert!(err.to_string().contains("Print-Job to ipp://127.0.0.1"), "{err}");
    }

    #[tokio::test]
    async fn missing_job_id_is_a_transport_error() {
        let printer = MockPrinter::start(MockBehaviour::OmitJobId).await.unwrap();
        let submitter = IppJobSubmitter::new(&printer.config());
        let err = submitter
            .submit(b"%PDF".to_vec(), printer.address(), &attributes())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing job-id"));
    }

    #[tokio::test]
    async fn garbage_reply_is_a_transport_error() {
        let printer = MockPrinter::start(MockBehaviour::Garbage).await.unwrap();
        let submitter = IppJobSubmitter::new(&printer.config());
        let err = submitter
            .submit(b"%PDF".to_vec(), printer.address(), &attributes())
            .await
            .unwrap_err();
        assert!(matches!(err, PrintwireError::PrintTransport(_)));
    }

    #[tokio::test]
    async fn silent_printer_times_out_when_configured() {
        let printer = MockPrinter::start(MockBehaviour::Hang).await.unwrap();
        let mut config = printer.config();
        config.request_timeout_secs = Some(1);
        let submitter = IppJobSubmitter::new(&config);

        let err = submitter
            .submit(b"%PDF".to_vec(), printer.address(), &attributes())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        // Bind then drop to find a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = DispatchConfig {
            ipp_port: port,
            ..DispatchConfig::default()
        };
        let err = IppJobSubmitter::new(&config)
            .submit(b"%PDF".to_vec(), "127.0.0.1", &attributes())
            .await
            .unwrap_err();
        assert!(matches!(err, PrintwireError::PrintTransport(_)));
        assert!(err.to_string().contains(&format!("127.0.0.1:{port}")), "{err}");
    }
}
