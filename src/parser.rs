//! Line parser for the device's text framing.
//!
//! One line in, one decoded frame (or a typed rejection) out. Three framings
//! are recognized, in priority order: a `{...}` key/value object, tagged CSV
//! (`V:4.85,C:1.23,T:24.5`), and positional CSV (`4.85,1.23,24.5`). Lines
//! starting with `#` are device debug chatter and are ignored outright.

use thiserror::Error;

use crate::models::SensorFrame;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid object frame: {0}")]
    InvalidObject(String),
    #[error("missing {0} field")]
    MissingField(&'static str),
    #[error("invalid {field} value '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("unrecognized line format: '{0}'")]
    UnrecognizedFormat(String),
}

/// Outcome of parsing one line: either a decoded frame, or nothing at all
/// for comments and blank lines (not an error, not a reading).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedLine {
    Frame(SensorFrame),
    Ignored,
}

pub fn parse_line(line: &str) -> Result<ParsedLine, ParseError> {
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') {
        return Ok(ParsedLine::Ignored);
    }

    if line.starts_with('{') && line.ends_with('}') {
        return serde_json::from_str::<SensorFrame>(line)
            .map(ParsedLine::Frame)
            .map_err(|err| ParseError::InvalidObject(err.to_string()));
    }

    if line.contains(':') {
        return parse_tagged(line).map(ParsedLine::Frame);
    }

    parse_positional(line).map(ParsedLine::Frame)
}

/// Tagged CSV: `TAG:VALUE` tokens where V/C/T map to the three channels.
/// Unrecognized tags are skipped; all three channels must be present.
fn parse_tagged(line: &str) -> Result<SensorFrame, ParseError> {
    let mut voltage = None;
    let mut current = None;
    let mut temperature = None;

    for token in line.split(',') {
        let Some((tag, value)) = token.trim().split_once(':') else {
            continue;
        };
        let slot = match tag.trim() {
            "V" => &mut voltage,
            "C" => &mut current,
            "T" => &mut temperature,
            _ => continue,
        };
        *slot = Some(parse_value(field_for_tag(tag.trim()), value)?);
    }

    let voltage = voltage.ok_or(ParseError::MissingField("voltage"))?;
    let current = current.ok_or(ParseError::MissingField("current"))?;
    let temperature = temperature.ok_or(ParseError::MissingField("temperature"))?;

    Ok(SensorFrame {
        voltage,
        current,
        temperature,
    })
}

fn field_for_tag(tag: &str) -> &'static str {
    match tag {
        "V" => "voltage",
        "C" => "current",
        _ => "temperature",
    }
}

/// Positional CSV: exactly three numeric tokens, voltage/current/temperature.
fn parse_positional(line: &str) -> Result<SensorFrame, ParseError> {
    let tokens: Vec<&str> = line.split(',').collect();
    if tokens.len() != 3 {
        return Err(ParseError::UnrecognizedFormat(line.to_string()));
    }

    Ok(SensorFrame {
        voltage: parse_value("voltage", tokens[0])?,
        current: parse_value("current", tokens[1])?,
        temperature: parse_value("temperature", tokens[2])?,
    })
}

fn parse_value(field: &'static str, raw: &str) -> Result<f64, ParseError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber {
            field,
            value: raw.trim().to_string(),
        })
}
