use anyhow::{Context, Result, anyhow};
use std::path::Path;
use tracing::warn;

/// Read the shared parameter vector from a whitespace separated file
///
/// The first token is a header (normally the element count) and is discarded.
pub async fn read_parameter_file(path: impl AsRef<Path>) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read input file '{}'", path.display()))?;

    parse_parameters(&contents)
        .with_context(|| format!("Malformed input file '{}'", path.display()))
}

/// Parse file contents into the parameter vector, dropping the header token
pub fn parse_parameters(contents: &str) -> Result<Vec<f64>> {
    let mut tokens = contents.split_whitespace();

    let header = tokens
        .next()
        .ok_or_else(|| anyhow!("Input is empty; expected a header token followed by values"))?;
    // The header must still be numeric even though its value is unused
    let header_value: f64 = header
        .parse()
        .map_err(|e| anyhow!("Invalid header token '{}': {}", header, e))?;

    let parameters = tokens
        .enumerate()
        .map(|(idx, token)| {
            token
                .parse::<f64>()
                .map_err(|e| anyhow!("Invalid number '{}' at token {}: {}", token, idx + 2, e))
        })
        .collect::<Result<Vec<_>>>()?;

    if header_value >= 0.0
        && header_value.fract() == 0.0
        && header_value as usize != parameters.len()
    {
        warn!(
            "Input header says {} values but {} were found",
            header_value,
            parameters.len()
        );
    }

    Ok(parameters)
}
