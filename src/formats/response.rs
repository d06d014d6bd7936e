use crate::error::AttemptError;

/// Tokens parsed from one successful execution's stdout
pub type InvocationResult = Vec<String>;

/// Decode the stdout of a finished process into its token sequence
///
/// Output must be ASCII. Trailing whitespace is stripped and the remainder is split
/// on single spaces, so runs of spaces produce empty tokens. Output that is empty
/// after stripping counts as a failed attempt.
pub fn decode_output(
    stdout: &[u8],
    exit_code: Option<i32>,
) -> Result<InvocationResult, AttemptError> {
    if let Some(offset) = stdout.iter().position(|b| !b.is_ascii()) {
        return Err(AttemptError::NonAscii(offset));
    }

    // ASCII is valid UTF-8
    let text = String::from_utf8_lossy(stdout);
    let trimmed = text.trim_end();

    if trimmed.is_empty() {
        return Err(AttemptError::EmptyOutput { code: exit_code });
    }

    Ok(trimmed.split(' ').map(str::to_string).collect())
}
