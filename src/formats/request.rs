use std::fmt::Write;

/// The single line written to the executable's stdin for one attempt
///
/// Layout is `"<count> <v1> <v2> ... <vn>"` with no trailing newline.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    /// Job the request was built for. Only used for logging, never sent to the process.
    pub job_id: u64,
    line: String,
}

impl InvocationRequest {
    pub fn new(job_id: u64, parameters: &[f64]) -> Self {
        let mut line = parameters.len().to_string();
        for value in parameters {
            // Writing into a String cannot fail
            let _ = write!(line, " {}", format_parameter(*value));
        }
        Self { job_id, line }
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.line.as_bytes()
    }
}

/// Render a parameter in a stable decimal form
///
/// Integral values keep a `.0` suffix so that `2.0` is never sent as `2`.
/// Rust's `Display` for `f64` never switches to exponent notation, so the only
/// case to patch is a finite value without a fractional part.
pub fn format_parameter(value: f64) -> String {
    let rendered = value.to_string();
    if value.is_finite() && !rendered.contains('.') {
        format!("{rendered}.0")
    } else {
        rendered
    }
}
