//! Command-line rendering of a signing run
//!
//! Runs the pipeline once and maps the outcome to the text the CLI prints
//! and the exit code it returns. Success goes to `out`, failures to `err`;
//! a validator diagnostic is printed verbatim.

use std::io::{self, Write};

use crate::error::{ExitCode, SigningFailure};
use crate::pipeline::{SigningPipeline, SigningReport, SigningRequest};
use crate::validator::ValidatorLoader;

/// Run `request` through `pipeline`, report the outcome and return the
/// exit code for the process.
pub fn run_and_report<L, O, E>(
    pipeline: &mut SigningPipeline<L>,
    request: &SigningRequest,
    out: &mut O,
    err: &mut E,
) -> ExitCode
where
    L: ValidatorLoader,
    O: Write,
    E: Write,
{
    let (code, written) = match pipeline.run(request) {
        Ok(report) => (ExitCode::Success, write_report(out, &report)),
        Err(failure) => (failure.exit_code(), write_failure(err, &failure)),
    };
    if let Err(e) = written {
        tracing::warn!(error = %e, "could not write report");
    }
    code
}

fn write_report(out: &mut impl Write, report: &SigningReport) -> io::Result<()> {
    writeln!(
        out,
        "Signed {} -> {}",
        report.input.display(),
        report.output.display()
    )?;
    writeln!(out, "  digest:  {}", report.digest.to_hex())?;
    writeln!(out, "  sha256:  {}", report.output_sha256)?;
    if let Some(version) = report.validator_version {
        writeln!(out, "  validator: {}", version)?;
    }
    Ok(())
}

fn write_failure(err: &mut impl Write, failure: &SigningFailure) -> io::Result<()> {
    match failure {
        SigningFailure::ValidationFailed { diagnostic } => {
            writeln!(err, "Validation failed:")?;
            if !diagnostic.is_empty() {
                writeln!(err, "{}", diagnostic)?;
            }
            Ok(())
        }
        other => writeln!(err, "Error: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBehavior, MockLoader, MOCK_DIGEST};
    use std::fs;
    use tempfile::TempDir;

    fn unsigned_container() -> Vec<u8> {
        let mut bytes = b"DXBC".to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        bytes.extend_from_slice(b"payload");
        bytes
    }

    /// Run one request against `behavior`; returns (code, stdout, stderr).
    fn run_with(dir: &TempDir, input: &[u8], behavior: MockBehavior) -> (ExitCode, String, String) {
        let input_path = dir.path().join("in.dxil");
        fs::write(&input_path, input).unwrap();
        let request = SigningRequest::new(input_path, dir.path().join("out.dxil"));
        let mut pipeline = SigningPipeline::new(MockLoader::new(behavior));

        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = run_and_report(&mut pipeline, &request, &mut out, &mut err);
        (
            code,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_rejection_prints_diagnostic_and_exits_two() {
        let dir = TempDir::new().unwrap();
        let (code, out, err) = run_with(
            &dir,
            &unsigned_container(),
            MockBehavior::reject("bad bitcode"),
        );

        assert_eq!(code, ExitCode::ValidationFailed);
        assert_eq!(code.as_i32(), 2);
        assert_eq!(err, "Validation failed:\nbad bitcode\n");
        assert!(out.is_empty());
        assert!(!dir.path().join("out.dxil").exists());
    }

    #[test]
    fn test_multiline_diagnostic_is_verbatim() {
        let dir = TempDir::new().unwrap();
        let diagnostic = "error: bad bitcode\nnote: in function main";
        let (code, _, err) = run_with(&dir, &unsigned_container(), MockBehavior::reject(diagnostic));

        assert_eq!(code, ExitCode::ValidationFailed);
        assert_eq!(err, format!("Validation failed:\n{diagnostic}\n"));
    }

    #[test]
    fn test_silent_rejection_prints_header_only() {
        let dir = TempDir::new().unwrap();
        let (code, _, err) = run_with(&dir, &unsigned_container(), MockBehavior::RejectSilently);

        assert_eq!(code, ExitCode::ValidationFailed);
        assert_eq!(err, "Validation failed:\n");
    }

    #[test]
    fn test_success_prints_summary_and_exits_zero() {
        let dir = TempDir::new().unwrap();
        let (code, out, err) = run_with(&dir, &unsigned_container(), MockBehavior::SignInPlace);

        assert_eq!(code, ExitCode::Success);
        assert!(out.starts_with("Signed "), "{out}");
        assert!(out.contains(&MOCK_DIGEST.to_hex()), "{out}");
        assert!(out.contains("validator: 1.8"), "{out}");
        assert!(err.is_empty());
    }

    #[test]
    fn test_other_failures_exit_one() {
        let dir = TempDir::new().unwrap();
        let (code, out, err) = run_with(&dir, &[0u8; 10], MockBehavior::SignInPlace);

        assert_eq!(code, ExitCode::Failure);
        assert!(err.starts_with("Error: malformed container"), "{err}");
        assert!(out.is_empty());
    }
}
