//! Import id parsing

use crate::error::{Result, TfplugError};

/// Splits a `/`-joined composite import id into exactly `names.len()`
/// non-empty segments
///
/// Example: "dev1/dom2/acc3/ssh_key" with four names -> four segments
pub fn split_import_id(id: &str, names: &[&str]) -> Result<Vec<String>> {
    let segments: Vec<&str> = id.split('/').collect();

    if segments.len() != names.len() || segments.iter().any(|s| s.is_empty()) {
        return Err(TfplugError::ImportFailed(format!(
            "id must be {}",
            names
                .iter()
                .map(|n| format!("<{}>", n))
                .collect::<Vec<_>>()
                .join("/")
        )));
    }

    Ok(segments.into_iter().map(str::to_string).collect())
}
