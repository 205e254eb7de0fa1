//! Content transform capabilities used by the executor.
//!
//! A transform reads one source file and writes one destination file. The
//! executor owns staging, rollback and bookkeeping; a transform only does the
//! conversion and reports the resulting size.

use crate::utils::fs::{ensure_parent, file_size, move_file};
use crate::Result;
use regex::Regex;
use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// How often a running external command is checked for exit or cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Input of one transform call.
#[derive(Debug, Clone, Copy)]
pub struct TransformRequest<'a> {
    pub source: &'a Path,
    pub destination: &'a Path,
    /// Run-wide cancellation flag.
    pub cancel: &'a AtomicBool,
}

/// A content transformation step.
pub trait Transform: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Transform `request.source` into `request.destination`.
    ///
    /// Returns the size of the written destination. `progress` may be called
    /// with fractions in `0.0..=1.0` during long operations.
    fn apply(&self, request: &TransformRequest<'_>, progress: &mut dyn FnMut(f32)) -> Result<u64>;
}

/// Renames the source to the destination.
#[derive(Debug, Default, Clone, Copy)]
pub struct MoveTransform;

impl Transform for MoveTransform {
    fn name(&self) -> &str {
        "move"
    }

    fn apply(&self, request: &TransformRequest<'_>, _progress: &mut dyn FnMut(f32)) -> Result<u64> {
        ensure_parent(request.destination)?;
        move_file(request.source, request.destination)?;
        Ok(file_size(request.destination))
    }
}

/// Copies the source to the destination.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyTransform;

impl Transform for CopyTransform {
    fn name(&self) -> &str {
        "copy"
    }

    fn apply(&self, request: &TransformRequest<'_>, _progress: &mut dyn FnMut(f32)) -> Result<u64> {
        ensure_parent(request.destination)?;
        Ok(fs::copy(request.source, request.destination)?)
    }
}

/// Runs an external program, e.g. an encoder.
///
/// Arguments may contain `{input}` and `{output}` placeholders. Progress is
/// read from `Duration:` and `time=` lines on stderr.
#[derive(Debug, Clone)]
pub struct CommandTransform {
    program: String,
    args: Vec<String>,
}

impl CommandTransform {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a whitespace separated template such as
    /// `ffmpeg -y -i {input} {output}`.
    pub fn from_template(template: &str) -> Result<Self> {
        let mut parts = template.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| crate::Error::other("Empty command template"))?;
        Ok(Self::new(program, parts.collect()))
    }

    /// Arguments with placeholders substituted.
    pub fn render_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|a| a.replace("{input}", &input).replace("{output}", &output))
            .collect()
    }
}

impl Transform for CommandTransform {
    fn name(&self) -> &str {
        &self.program
    }

    fn apply(&self, request: &TransformRequest<'_>, progress: &mut dyn FnMut(f32)) -> Result<u64> {
        ensure_parent(request.destination)?;

        let mut child = Command::new(&self.program)
            .args(self.render_args(request.source, request.destination))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                crate::Error::TransformFailed(format!("Cannot start {}: {}", self.program, e))
            })?;

        let (tx, rx) = mpsc::channel::<String>();
        let reader = child.stderr.take().map(|stderr| {
            thread::spawn(move || {
                let mut line = Vec::new();
                for byte in BufReader::new(stderr).bytes() {
                    let Ok(byte) = byte else { break };
                    if byte == b'\n' || byte == b'\r' {
                        if !line.is_empty() {
                            let _ = tx.send(String::from_utf8_lossy(&line).into_owned());
                            line.clear();
                        }
                    } else {
                        line.push(byte);
                    }
                }
                if !line.is_empty() {
                    let _ = tx.send(String::from_utf8_lossy(&line).into_owned());
                }
            })
        });

        let mut parser = FractionParser::new();
        let mut last_line = String::new();
        let status = loop {
            for line in rx.try_iter() {
                if let Some(fraction) = parser.feed(&line) {
                    progress(fraction);
                }
                last_line = line;
            }

            if request.cancel.load(Ordering::SeqCst) {
                tracing::info!("Cancelling {} for {:?}", self.program, request.source);
                let _ = child.kill();
                let _ = child.wait();
                if let Some(handle) = reader {
                    let _ = handle.join();
                }
                return Err(crate::Error::Cancelled);
            }

            if let Some(status) = child.try_wait()? {
                break status;
            }
            thread::sleep(POLL_INTERVAL);
        };

        if let Some(handle) = reader {
            let _ = handle.join();
        }
        for line in rx.try_iter() {
            last_line = line;
        }

        if !status.success() {
            return Err(crate::Error::TransformFailed(format!(
                "{} exited with {}: {}",
                self.program, status, last_line
            )));
        }
        progress(1.0);
        Ok(file_size(request.destination))
    }
}

/// Turns encoder stderr lines into completion fractions.
#[derive(Debug)]
pub struct FractionParser {
    duration_re: Option<Regex>,
    time_re: Option<Regex>,
    total_secs: Option<f64>,
}

impl FractionParser {
    pub fn new() -> Self {
        Self {
            duration_re: Regex::new(r"Duration:\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").ok(),
            time_re: Regex::new(r"time=\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").ok(),
            total_secs: None,
        }
    }

    /// Feed one line; returns a fraction once both duration and time are known.
    pub fn feed(&mut self, line: &str) -> Option<f32> {
        if self.total_secs.is_none() {
            if let Some(secs) = self.duration_re.as_ref().and_then(|re| capture_secs(re, line)) {
                self.total_secs = Some(secs);
                return None;
            }
        }
        let total = self.total_secs.filter(|t| *t > 0.0)?;
        let current = self.time_re.as_ref().and_then(|re| capture_secs(re, line))?;
        Some((current / total).clamp(0.0, 1.0) as f32)
    }
}

impl Default for FractionParser {
    fn default() -> Self {
        Self::new()
    }
}

fn capture_secs(re: &Regex, line: &str) -> Option<f64> {
    let caps = re.captures(line)?;
    let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(3)?.as_str().parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
