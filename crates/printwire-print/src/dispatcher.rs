// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print dispatcher: runs one print request through the pipeline
//
//   Received -> (Extracting) -> (DetectingOrientation) -> Building
//            -> Submitting -> Succeeded | Failed
//
// and reports exactly one outcome. Requests share no mutable state; each
// runs on its own task, with PDF work on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span, warn};

use printwire_core::config::{DispatchConfig, EmptyRangePolicy};
use printwire_core::error::{PrintwireError, Result};
use printwire_core::types::{
    DispatchReport, DispatchStage, DuplexMode, OrientationMode, PrintOptions,
    PrintOutcome, PrintRequest, RequestId, ScalingPolicy,
};
use printwire_document::{ExtractedFile, detect_file, extract_to_temp};

use crate::ipp_client::{IppJobSubmitter, JobSubmitter};
use crate::job_builder;

/// An error tagged with the stage it happened in.
struct StageFailure {
    stage: DispatchStage,
    error: PrintwireError,
}

trait AtStage<T> {
    fn at(self, stage: DispatchStage) -> std::result::Result<T, StageFailure>;
}

impl<T> AtStage<T> for Result<T> {
    fn at(self, stage: DispatchStage) -> std::result::Result<T, StageFailure> {
        self.map_err(|error| StageFailure { stage, error })
    }
}

/// Runs print requests. Cheap to clone; clones share the submitter.
#[derive(Clone)]
pub struct PrintDispatcher {
    config: Arc<DispatchConfig>,
    submitter: Arc<dyn JobSubmitter>,
}

impl PrintDispatcher {
    /// Dispatcher that submits over IPP according to `config`.
    pub fn new(config: DispatchConfig) -> Self {
        let submitter = Arc::new(IppJobSubmitter::new(&config));
        Self::with_submitter(config, submitter)
    }

    pub fn with_submitter(config: DispatchConfig, submitter: Arc<dyn JobSubmitter>) -> Self {
        Self {
            config: Arc::new(config),
            submitter,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Run `request` to completion and return its single outcome.
    pub async fn dispatch(&self, request: PrintRequest) -> PrintOutcome {
        let request_id = RequestId::new();
        let span = info_span!(
            "dispatch",
            %request_id,
            printer = %request.printer_address,
            path = %request.source_path.display()
        );

        async move {
            match self.run(request_id, request).await {
                Ok(report) => {
                    info!(
                        stage = %DispatchStage::Succeeded,
                        job_id = report.job_id,
                        "print request finished"
                    );
                    PrintOutcome::Succeeded(report)
                }
                Err(StageFailure { stage, error }) => {
                    match error {
                        PrintwireError::InvalidRange { .. } => {
                            warn!(%stage, error = %error, "print request rejected")
                        }
                        _ => error!(%stage, error = %error, "print request failed"),
                    }
                    PrintOutcome::failed(stage, &error)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Run `request` on its own task of the current runtime and hand the
    /// outcome to `on_complete`, exactly once.
    ///
    /// Must be called from within a Tokio runtime; see [`Self::spawn_on`].
    pub fn spawn<F>(&self, request: PrintRequest, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(PrintOutcome) + Send + 'static,
    {
        self.spawn_on(&Handle::current(), request, on_complete)
    }

    /// As [`Self::spawn`], on an explicit runtime.
    pub fn spawn_on<F>(&self, handle: &Handle, request: PrintRequest, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(PrintOutcome) + Send + 'static,
    {
        let dispatcher = self.clone();
        handle.spawn(async move {
            let outcome = dispatcher.dispatch(request).await;
            on_complete(outcome);
        })
    }

    async fn run(
        &self,
        request_id: RequestId,
        request: PrintRequest,
    ) -> std::result::Result<DispatchReport, StageFailure> {
        enter(DispatchStage::Received);
        validate(&request).at(DispatchStage::Received)?;

        // Holds the temp file alive until the request is done.
        let mut extracted: Option<ExtractedFile> = None;
        if let Some(range) = request.page_range {
            enter(DispatchStage::Extracting);
            let source = request.source_path.clone();
            let temp_dir = self.config.temp_dir.clone();
            let file = blocking(move || extract_to_temp(&source, range, temp_dir.as_deref()))
                .await
                .at(DispatchStage::Extracting)?;

            if let Some(warning) = file.warning {
                match self.config.empty_range_policy {
                    EmptyRangePolicy::Reject => {
                        return Err(warning.to_error()).at(DispatchStage::Extracting);
                    }
                    EmptyRangePolicy::Submit => {
                        warn!(%warning, "submitting empty document");
                    }
                }
            }
            extracted = Some(file);
        }

        let payload_path: PathBuf = match &extracted {
            Some(file) => file.path().to_path_buf(),
            None => request.source_path.clone(),
        };
        let pages_submitted = extracted.as_ref().map(|file| file.page_count);

        let orientation = match request.orientation {
            OrientationMode::Explicit(orientation) => orientation,
            // Always page 1 of the source, whatever range is printed.
            OrientationMode::Auto => {
                enter(DispatchStage::DetectingOrientation);
                let path = request.source_path.clone();
                blocking(move || detect_file(&path))
                    .await
                    .at(DispatchStage::DetectingOrientation)?
            }
        };

        enter(DispatchStage::Building);
        let options = PrintOptions {
            copies: request.copies,
            duplex: DuplexMode::from(request.duplex),
            color_mode: request.color_mode,
            orientation,
            page_size: request.page_size,
            scaling: if request.page_range.is_some() {
                ScalingPolicy::None
            } else {
                ScalingPolicy::AutoFit
            },
        };
        let attributes = job_builder::build(&options, &self.config.job_name);
        debug!(?options, "job attributes built");

        enter(DispatchStage::Submitting);
        let payload = read_payload(&payload_path)
            .await
            .at(DispatchStage::Submitting)?;
        let payload_bytes = payload.len() as u64;
        let payload_sha256 = hex::encode(Sha256::digest(&payload));
        let job_id = self
            .submitter
            .submit(payload, &request.printer_address, &attributes)
            .await
            .at(DispatchStage::Submitting)?;

        if let Some(file) = extracted {
            self.release(file);
        }

        Ok(DispatchReport {
            request_id,
            job_id,
            orientation,
            pages_submitted,
            payload_bytes,
            payload_sha256,
            submitted_at: Utc::now(),
        })
    }

    /// Delete the extracted file, or keep it when configured to.
    fn release(&self, file: ExtractedFile) {
        if !self.config.keep_extracted_files {
            return;
        }
        match file.keep() {
            Ok(path) => info!(path = %path.display(), "kept extracted page range"),
            Err(e) => warn!(error = %e, "could not keep extracted page range"),
        }
    }
}

fn enter(stage: DispatchStage) {
    debug!(%stage, "entering stage");
}

fn validate(request: &PrintRequest) -> Result<()> {
    if request.source_path.as_os_str().is_empty() {
        return Err(PrintwireError::MissingParameter("document path".into()));
    }
    if request.printer_address.trim().is_empty() {
        return Err(PrintwireError::MissingParameter("printer address".into()));
    }
    Ok(())
}

async fn read_payload(path: &Path) -> Result<Vec<u8>> {
    let payload = tokio::fs::read(path).await?;
    debug!(bytes = payload.len(), "payload read");
    Ok(payload)
}

/// Run blocking PDF work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PrintwireError::Io(std::io::Error::other(format!("PDF task failed: {e}"))))?
}
