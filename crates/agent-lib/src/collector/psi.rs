//! Pressure-stall information parsing
//!
//! Files under `/proc/pressure` look like:
//!
//! ```text
//! some avg10=0.00 avg60=0.12 avg300=0.05 total=123456
//! full avg10=0.00 avg60=0.00 avg300=0.00 total=0
//! ```

use crate::models::{PsiData, PsiMetrics};
use anyhow::{anyhow, Context, Result};
use std::path::Path;

/// Parse the contents of one pressure file
///
/// A `some` line is required. `full` is optional since the cpu file
/// lacks it on kernels before 5.13.
pub fn parse_pressure(content: &str) -> Result<PsiMetrics> {
    let mut some = None;
    let mut full = None;

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let Some(kind) = parts.next() else {
            continue;
        };

        let data = parse_line(parts).with_context(|| format!("Invalid pressure line: {line}"))?;
        match kind {
            "some" => some = Some(data),
            "full" => full = Some(data),
            _ => {}
        }
    }

    let some = some.ok_or_else(|| anyhow!("Pressure data has no 'some' line"))?;
    Ok(PsiMetrics { some, full })
}

fn parse_line<'a>(fields: impl Iterator<Item = &'a str>) -> Result<PsiData> {
    let mut data = PsiData::default();

    for field in fields {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| anyhow!("Field '{field}' is not key=value"))?;
        match key {
            "avg10" => data.avg10 = value.parse()?,
            "avg60" => data.avg60 = value.parse()?,
            "avg300" => data.avg300 = value.parse()?,
            "total" => data.total = value.parse()?,
            _ => {}
        }
    }

    Ok(data)
}

/// Read and parse a pressure file such as `/proc/pressure/cpu`
pub fn read_pressure(path: &Path) -> Result<PsiMetrics> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_pressure(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_some_and_full() {
        let content = "some avg10=1.50 avg60=0.75 avg300=0.10 total=987654\n\
                       full avg10=0.20 avg60=0.05 avg300=0.00 total=1234\n";
        let psi = parse_pressure(content).unwrap();

        assert_eq!(psi.some.avg10, 1.50);
        assert_eq!(psi.some.avg60, 0.75);
        assert_eq!(psi.some.avg300, 0.10);
        assert_eq!(psi.some.total, 987654);

        let full = psi.full.unwrap();
        assert_eq!(full.avg10, 0.20);
        assert_eq!(full.total, 1234);
    }

    #[test]
    fn test_parse_without_full_line() {
        let psi = parse_pressure("some avg10=0.00 avg60=0.00 avg300=0.00 total=42\n").unwrap();
        assert_eq!(psi.some.total, 42);
        assert!(psi.full.is_none());
    }

    #[test]
    fn test_parse_missing_some_is_error() {
        assert!(parse_pressure("full avg10=0.00 avg60=0.00 avg300=0.00 total=0\n").is_err());
        assert!(parse_pressure("").is_err());
    }

    #[test]
    fn test_parse_malformed_value_is_error() {
        assert!(parse_pressure("some avg10=abc avg60=0.00 avg300=0.00 total=0\n").is_err());
        assert!(parse_pressure("some avg10\n").is_err());
    }

    #[test]
    fn test_read_pressure_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("memory");
        std::fs::write(
            &path,
            "some avg10=3.00 avg60=2.00 avg300=1.00 total=10\nfull avg10=0.00 avg60=0.00 avg300=0.00 total=5\n",
        )
        .unwrap();

        let psi = read_pressure(&path).unwrap();
        assert_eq!(psi.some.avg10, 3.00);
        assert_eq!(psi.full.unwrap().total, 5);
    }
}
