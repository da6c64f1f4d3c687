//! JSON analysis output writer.
//!
//! Writes analysis results to JSON files with proper formatting.

use crate::model::schema::UnifiedAnalysisResult;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Write an analysis result to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `result` - Analysis result to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_analysis(
    result: &UnifiedAnalysisResult,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing analysis to: {}", output_path.display());

    validate_output_path(output_path)?;

    // Create parent directories if needed
    if let Some(parent) = output_path.parent() {
        if !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, result).map_err(OutputError::SerializationFailed)?;

    info!("Analysis written successfully");
    Ok(())
}

/// Read an analysis result back from a JSON file
///
/// **Public** - used by the validate command and tests
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_analysis(input_path: impl AsRef<Path>) -> Result<UnifiedAnalysisResult, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading analysis from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let result: UnifiedAnalysisResult =
        serde_json::from_reader(file).map_err(OutputError::SerializationFailed)?;

    debug!(
        "Analysis loaded: version {}, {} gas",
        result.version, result.total_gas_used
    );

    Ok(result)
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::cost::PricingConfig;
    use crate::engine::analyze;
    use crate::model::unified::TraceInput;
    use crate::parser::schema::{StructLogTrace, TraceStep};

    fn sample_result() -> UnifiedAnalysisResult {
        let trace = StructLogTrace::from_steps(vec![TraceStep {
            step: 0,
            opcode: "SSTORE".to_string(),
            gas_cost: 20_000,
            depth: 0,
            stack_depth: 2,
            memory_size_bytes: 64,
        }]);
        analyze(TraceInput::StructLogOnly(&trace), &PricingConfig::default())
    }

    #[test]
    fn test_write_and_read_analysis() {
        let result = sample_result();
        let temp_file = tempfile::NamedTempFile::new().unwrap();

        write_analysis(&result, temp_file.path()).unwrap();
        let loaded = read_analysis(temp_file.path()).unwrap();

        assert_eq!(loaded.version, result.version);
        assert_eq!(loaded.total_gas_used, result.total_gas_used);
        assert_eq!(loaded.gas_breakdown, result.gas_breakdown);
    }

    #[test]
    fn test_validate_output_path_empty() {
        assert!(validate_output_path(Path::new("")).is_err());
    }

    #[test]
    fn test_validate_output_path_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(validate_output_path(temp_dir.path()).is_err());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested/dirs/analysis.json");

        write_analysis(&sample_result(), &nested_path).unwrap();
        assert!(nested_path.exists());
    }
}
