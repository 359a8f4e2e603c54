//! Delimited text parsing for sample files.

use super::{Dataset, Sample};
use crate::config::DataConfig;
use crate::error::{KohonenError, Result};
use crate::som::UNLABELED;
use log::info;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Checks a header line: the label column followed by exactly `input_size` names.
pub fn parse_header(
    line: &str,
    input_size: usize,
    config: &DataConfig,
) -> std::result::Result<(), String> {
    let fields: Vec<&str> = line.split(config.delimiter).map(str::trim).collect();

    if fields[0] != config.label_column {
        return Err(format!(
            "expected first header column '{}', got '{}'",
            config.label_column, fields[0]
        ));
    }
    if fields.len() != input_size + 1 {
        return Err(format!(
            "expected '{}' followed by {} feature columns, got {}",
            config.label_column,
            input_size,
            fields.len() - 1
        ));
    }
    Ok(())
}

/// Parses one data row into a scaled sample.
pub fn parse_row(
    line: &str,
    input_size: usize,
    config: &DataConfig,
) -> std::result::Result<Sample, String> {
    let mut fields = line.split(config.delimiter).map(str::trim);

    let label = match fields.next() {
        Some(token) if !token.is_empty() => token
            .parse::<i64>()
            .map_err(|_| format!("invalid label '{}'", token))?,
        _ => return Err("missing label".to_string()),
    };
    if label == UNLABELED {
        return Err(format!("label {} is reserved for unlabeled neurons", UNLABELED));
    }

    let mut features = Vec::with_capacity(input_size);
    for (column, token) in fields.enumerate() {
        let value: f64 = token
            .parse()
            .map_err(|_| format!("invalid feature value '{}' in column {}", token, column + 2))?;
        if !value.is_finite() {
            return Err(format!("non-finite feature value '{}' in column {}", token, column + 2));
        }
        features.push(value / config.scale);
    }

    if features.len() != input_size {
        return Err(format!(
            "expected {} feature values, got {}",
            input_size,
            features.len()
        ));
    }

    Ok(Sample::new(label, features))
}

/// Splits a line read result into undecodable text (a row problem) and real I/O failures.
///
/// `BufRead::lines` consumes an invalid UTF-8 line before reporting it, so
/// reading can continue with the next line.
pub(super) fn decode_line(
    line: io::Result<String>,
) -> Result<std::result::Result<String, String>> {
    match line {
        Ok(text) => Ok(Ok(text)),
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            Ok(Err(format!("unreadable line: {}", e)))
        }
        Err(e) => Err(e.into()),
    }
}

pub(super) fn load(path: &Path, input_size: usize, config: &DataConfig) -> Result<Dataset> {
    config.validate()?;
    let file = File::open(path).map_err(|e| KohonenError::unavailable(path, e))?;
    let mut lines = BufReader::new(file).lines();

    let header = match lines.next() {
        Some(line) => {
            decode_line(line)?.map_err(|message| KohonenError::DataFormat { line: 1, message })?
        }
        None => {
            return Err(KohonenError::DataFormat {
                line: 1,
                message: format!("empty file or no header in {}", path.display()),
            })
        }
    };
    parse_header(&header, input_size, config)
        .map_err(|message| KohonenError::DataFormat { line: 1, message })?;
    info!("Header verified for {}", path.display());

    let mut samples = Vec::new();
    for (i, line) in lines.enumerate() {
        let line = decode_line(line)?
            .map_err(|message| KohonenError::DataFormat { line: i + 2, message })?;
        if line.trim().is_empty() {
            continue;
        }
        let sample = parse_row(&line, input_size, config)
            .map_err(|message| KohonenError::DataFormat { line: i + 2, message })?;
        samples.push(sample);
    }

    info!("Loaded {} samples with labels from {}", samples.len(), path.display());
    Ok(Dataset::new(samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config() -> DataConfig {
        DataConfig::default()
    }

    #[test]
    fn test_parse_header() {
        assert!(parse_header("label,p1,p2,p3", 3, &config()).is_ok());
        assert!(parse_header("label,p1,p2", 3, &config()).is_err());
        assert!(parse_header("class,p1,p2,p3", 3, &config()).is_err());
        assert!(parse_header("", 3, &config()).is_err());
    }

    #[test]
    fn test_parse_row_scales() {
        let sample = parse_row("7,0,255,51", 3, &config()).unwrap();
        assert_eq!(sample.label, 7);
        assert_eq!(sample.features, vec![0.0, 1.0, 0.2]);
    }

    #[test]
    fn test_parse_row_tolerates_crlf_and_spaces() {
        let sample = parse_row(" 3 , 255 ,0\r", 2, &config()).unwrap();
        assert_eq!(sample.label, 3);
        assert_eq!(sample.features, vec![1.0, 0.0]);
    }

    #[test]
    fn test_parse_row_errors() {
        assert!(parse_row("", 2, &config()).unwrap_err().contains("missing label"));
        assert!(parse_row("x,1,2", 2, &config()).unwrap_err().contains("invalid label"));
        assert!(parse_row("1,1", 2, &config())
            .unwrap_err()
            .contains("expected 2 feature values, got 1"));
        assert!(parse_row("1,1,2,3", 2, &config()).is_err());
        assert!(parse_row("1,1,abc", 2, &config())
            .unwrap_err()
            .contains("column 3"));
        assert!(parse_row("1,1,NaN", 2, &config()).is_err());
        assert!(parse_row("-1,1,2", 2, &config()).unwrap_err().contains("reserved"));
        assert_eq!(parse_row("-2,1,2", 2, &config()).unwrap().label, -2);
    }

    #[test]
    fn test_load_reports_undecodable_line() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"label,a,b\n1,0,255\n2,\xff\xfe,20\n3,4,5\n").unwrap();

        let err = load(file.path(), 2, &config()).unwrap_err();
        assert!(matches!(err, KohonenError::DataFormat { line: 3, .. }), "{:?}", err);
    }

    #[test]
    fn test_load_rejects_zero_scale() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"label,a\n1,5\n").unwrap();

        let config = DataConfig {
            scale: 0.0,
            ..config()
        };
        assert!(matches!(
            load(file.path(), 1, &config),
            Err(KohonenError::InvalidConfiguration(_))
        ));
    }
}
