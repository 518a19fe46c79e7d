//! External-command recognizer and validation of its output.
//!
//! The command is invoked as `<program> [args..] <image-path>` and must print
//! a JSON array on stdout. Each entry is either an object
//! `{"quad": [[x, y] ×4], "text": "...", "confidence": 0.97}` (`box` is
//! accepted for `quad`) or the PaddleOCR tuple shape
//! `[[[x, y] ×4], ["text", 0.97]]`. `null` entries are dropped.

use std::io::ErrorKind;
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use gazette_core::{Error, Result};

use crate::recognizer::Recognizer;
use crate::types::{PageImage, Point, Quad, RecognizedLine};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLine {
    Object {
        #[serde(alias = "box")]
        quad: Vec<[f64; 2]>,
        text: String,
        confidence: f64,
    },
    Tuple(Vec<[f64; 2]>, (String, f64)),
}

impl RawLine {
    fn into_parts(self) -> (Vec<[f64; 2]>, String, f64) {
        match self {
            Self::Object {
                quad,
                text,
                confidence,
            } => (quad, text, confidence),
            Self::Tuple(quad, (text, confidence)) => (quad, text, confidence),
        }
    }
}

/// Parse and validate recognition output for one page.
pub fn parse_recognition_output(page: u32, json: &str) -> Result<Vec<RecognizedLine>> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let raw: Vec<Option<RawLine>> = serde_json::from_str(trimmed)
        .map_err(|e| Error::recognition(page, format!("malformed engine output: {}", e)))?;

    raw.into_iter()
        .flatten()
        .enumerate()
        .map(|(i, line)| validate_line(page, i, line))
        .collect()
}

fn validate_line(page: u32, index: usize, line: RawLine) -> Result<RecognizedLine> {
    let (points, text, confidence) = line.into_parts();
    if points.len() != 4 {
        return Err(Error::recognition(
            page,
            format!("line {}: expected 4 quad points, got {}", index, points.len()),
        ));
    }
    if points.iter().flatten().any(|c| !c.is_finite()) {
        return Err(Error::recognition(
            page,
            format!("line {}: non-finite coordinate", index),
        ));
    }
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(Error::recognition(
            page,
            format!("line {}: confidence {} outside [0, 1]", index, confidence),
        ));
    }

    let corner = |i: usize| Point {
        x: points[i][0],
        y: points[i][1],
    };
    Ok(RecognizedLine {
        quad: Quad([corner(0), corner(1), corner(2), corner(3)]),
        text,
        confidence: confidence as f32,
    })
}

/// Recognizer backed by an external OCR command.
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandRecognizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace-separated command line. `None` if it is blank.
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

impl Recognizer for CommandRecognizer {
    fn recognize(&self, page: &PageImage) -> Result<Vec<RecognizedLine>> {
        debug!("Recognizing page {} via {}", page.number, self.program);
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&page.path)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => Error::recognition(
                    page.number,
                    format!("recognition command not found: {}", self.program),
                ),
                _ => Error::recognition(page.number, format!("failed to start engine: {}", e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::recognition(
                page.number,
                format!("engine exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let lines = parse_recognition_output(page.number, &stdout)?;
        debug!("Page {}: {} line(s) recognized", page.number, lines.len());
        Ok(lines)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        &self.program
    }
}
