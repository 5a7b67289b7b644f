//! Pipeline orchestration for one signing invocation
//!
//! Read → pre-check → engage validator → sign → verify → persist. Every
//! stage advances a [`WorkflowRecord`]; the first error fails the record and
//! ends the run. The output path is only touched after the digest has been
//! confirmed, and then through a temp file renamed into place.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dxil_container::{Digest, MinimalHeader};
use sha2::Sha256;

use crate::error::SigningFailure;
use crate::signing::{sign, ResultChannel};
use crate::state::{WorkflowRecord, WorkflowState};
use crate::validator::{Validator, ValidatorLoader, ValidatorSession, ValidatorVersion};
use crate::verify::verify_signed;

/// Input and output paths for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl SigningRequest {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// What a successful invocation produced
#[derive(Debug, Clone)]
pub struct SigningReport {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Digest found in the written container
    pub digest: Digest,
    /// How the validator handed back the signed bytes
    pub channel: ResultChannel,
    /// `None` when the validator does not report a version
    pub validator_version: Option<ValidatorVersion>,
    pub input_sha256: String,
    pub output_sha256: String,
    pub output_len: usize,
    pub record: WorkflowRecord,
}

impl SigningReport {
    pub fn started_at(&self) -> DateTime<Utc> {
        self.record.started_at()
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.record.updated_at()
    }

    pub fn final_state(&self) -> WorkflowState {
        self.record.state()
    }
}

/// Signing pipeline over an injected validator loader
pub struct SigningPipeline<L: ValidatorLoader> {
    loader: L,
    last_record: Option<WorkflowRecord>,
}

impl<L: ValidatorLoader> SigningPipeline<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            last_record: None,
        }
    }

    /// Workflow record of the most recent run, successful or not
    pub fn last_record(&self) -> Option<&WorkflowRecord> {
        self.last_record.as_ref()
    }

    /// Run the full workflow for `request`.
    pub fn run(&mut self, request: &SigningRequest) -> Result<SigningReport, SigningFailure> {
        let mut record = WorkflowRecord::new();
        let result = self.execute(request, &mut record);

        if let Err(failure) = &result {
            if let Err(e) = record.fail(failure.kind()) {
                tracing::warn!(error = %e, "could not record failure");
            }
            tracing::info!(
                state = %record.state(),
                input = %request.input.display(),
                "signing failed"
            );
        }

        self.last_record = Some(record);
        result
    }

    fn execute(
        &mut self,
        request: &SigningRequest,
        record: &mut WorkflowRecord,
    ) -> Result<SigningReport, SigningFailure> {
        let buffer =
            fs::read(&request.input).map_err(|e| SigningFailure::io(&request.input, e))?;
        let input_sha256 = sha256_hex(&buffer);
        tracing::debug!(bytes = buffer.len(), sha256 = %input_sha256, "read input");
        record.transition(WorkflowState::Loaded)?;

        pre_check(&buffer)?;
        record.transition(WorkflowState::PreChecked)?;

        let (signed, validator_version) = {
            let session = ValidatorSession::engage(&mut self.loader)?;
            let version = match session.version() {
                Ok(version) => {
                    tracing::info!(%version, "validator engaged");
                    Some(version)
                }
                Err(e) => {
                    tracing::debug!(error = %e, "validator version unavailable");
                    None
                }
            };
            let signed = sign(&*session, buffer)?;
            session.close();
            (signed, version)
        };
        tracing::info!(channel = signed.channel().as_str(), "validator accepted container");
        record.transition(WorkflowState::Signed)?;

        let digest = verify_signed(&signed)?;
        tracing::debug!(digest = %digest, "digest present");
        record.transition(WorkflowState::PostChecked)?;

        let channel = signed.channel();
        let bytes = signed.into_bytes();
        write_atomically(&request.output, &bytes)
            .map_err(|e| SigningFailure::io(&request.output, e))?;
        record.transition(WorkflowState::Persisted)?;
        tracing::info!(
            output = %request.output.display(),
            bytes = bytes.len(),
            "signed container written"
        );

        Ok(SigningReport {
            input: request.input.clone(),
            output: request.output.clone(),
            digest,
            channel,
            validator_version,
            input_sha256,
            output_sha256: sha256_hex(&bytes),
            output_len: bytes.len(),
            record: record.clone(),
        })
    }
}

/// Header checks that must pass before the validator is engaged
fn pre_check(buffer: &[u8]) -> Result<(), SigningFailure> {
    let header = MinimalHeader::parse(buffer)?;
    if header.is_signed() {
        return Err(SigningFailure::AlreadySigned {
            digest: header.digest(),
        });
    }
    if !header.has_known_four_cc() {
        tracing::warn!(
            four_cc = %String::from_utf8_lossy(&header.four_cc()),
            "unexpected container tag, leaving the verdict to the validator"
        );
    }
    Ok(())
}

/// Write to file atomically (write-then-rename)
fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    write_atomically_with(path, |file| file.write_all(bytes))
}

/// Fill a temp file next to `path`, then rename it into place.
///
/// The temp file is removed whenever any step fails, so a failed write
/// leaves neither a partial output nor a stray temp file behind.
fn write_atomically_with<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp_path = parent.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
    let result = File::create(&temp_path)
        .and_then(|mut file| {
            fill(&mut file)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&temp_path, path));

    if result.is_err() {
        // Best effort; the original error is what gets reported.
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::Digest as _;
    hex::encode(Sha256::digest(bytes))
}
