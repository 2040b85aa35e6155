//! Line-oriented position record reader.
//!
//! # Format
//!
//! One record per line, whitespace-delimited, first token is the type:
//!
//! ```text
//! T <tag> <x> <y> <z> <diameter> <state>    T cell
//! D <tag> <x> <y> <z> <diameter> <state>    dendritic cell
//! B <tcell_tag> <dcell_tag>                 bond
//! E                                         end of frame
//! ```
//!
//! Blank lines are skipped and unknown record types are ignored. A frame
//! that reaches end of stream without its `E` line is discarded.

use crate::error::ViewError;
use crate::model::{AgentPosition, BondPosition, Frame, Tag};
use std::io::BufRead;
use tracing::{debug, warn};

/// Result of reading one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// A complete, `E`-terminated frame
    Frame(Frame),

    /// No more frames; `discarded` records of an unterminated frame dropped
    EndOfStream { discarded: usize },
}

/// Reads frames from a buffered text source.
pub struct FrameReader<R> {
    reader: R,
    line_no: usize,
    frames_read: u64,
    buf: String,
}

impl<R: BufRead> FrameReader<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            frames_read: 0,
            buf: String::new(),
        }
    }

    /// Number of lines consumed so far.
    pub fn line_number(&self) -> usize {
        self.line_no
    }

    /// Number of complete frames returned so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Reads lines up to and including the next `E` terminator.
    ///
    /// # Errors
    /// * `ViewError::Parse` - a record in this frame was malformed. The
    ///   rest of the frame is still consumed, so the next call starts on a
    ///   frame boundary.
    /// * `ViewError::StreamRead` - the underlying reader failed
    pub fn next_frame(&mut self) -> Result<ReadOutcome, ViewError> {
        let mut frame = Frame::new();
        let mut first_error: Option<ViewError> = None;

        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                if let Some(err) = first_error {
                    return Err(err);
                }
                let discarded = frame.record_count();
                if discarded > 0 {
                    warn!(
                        "Stream ended without frame terminator; discarding {} records",
                        discarded
                    );
                }
                return Ok(ReadOutcome::EndOfStream { discarded });
            }
            self.line_no += 1;

            let mut fields = self.buf.split_whitespace();
            let kind = match fields.next() {
                Some(kind) => kind,
                None => continue,
            };

            let parsed = match kind {
                "E" => {
                    if let Some(err) = first_error {
                        return Err(err);
                    }
                    self.frames_read += 1;
                    return Ok(ReadOutcome::Frame(frame));
                }
                "T" => parse_agent(fields).map(|a| frame.tcells.push(a)),
                "D" => parse_agent(fields).map(|a| frame.dcells.push(a)),
                "B" => parse_bond(fields).map(|b| frame.bonds.push(b)),
                other => {
                    debug!("line {}: ignoring record type {:?}", self.line_no, other);
                    Ok(())
                }
            };

            if let Err(reason) = parsed {
                if first_error.is_none() {
                    first_error = Some(ViewError::Parse {
                        line: self.line_no,
                        reason,
                    });
                }
            }
        }
    }
}

fn parse_tag(field: Option<&str>, name: &str) -> Result<Tag, String> {
    let s = field.ok_or_else(|| format!("missing {}", name))?;
    s.parse::<Tag>()
        .map_err(|_| format!("{} {:?} is not a non-negative integer", name, s))
}

fn parse_real(field: Option<&str>, name: &str) -> Result<f64, String> {
    let s = field.ok_or_else(|| format!("missing {}", name))?;
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("{} {:?} is not a number", name, s))?;
    if !v.is_finite() {
        return Err(format!("{} {:?} is not finite", name, s));
    }
    Ok(v)
}

fn expect_end<'a>(mut fields: impl Iterator<Item = &'a str>) -> Result<(), String> {
    match fields.next() {
        Some(extra) => Err(format!("unexpected trailing field {:?}", extra)),
        None => Ok(()),
    }
}

fn parse_agent<'a>(mut fields: impl Iterator<Item = &'a str>) -> Result<AgentPosition, String> {
    let agent = AgentPosition {
        tag: parse_tag(fields.next(), "tag")?,
        x: parse_real(fields.next(), "x")?,
        y: parse_real(fields.next(), "y")?,
        z: parse_real(fields.next(), "z")?,
        diameter: parse_real(fields.next(), "diameter")?,
        state: parse_real(fields.next(), "state")?,
    };
    expect_end(fields)?;
    Ok(agent)
}

fn parse_bond<'a>(mut fields: impl Iterator<Item = &'a str>) -> Result<BondPosition, String> {
    let bond = BondPosition {
        tcell_tag: parse_tag(fields.next(), "T cell tag")?,
        dcell_tag: parse_tag(fields.next(), "DC tag")?,
    };
    expect_end(fields)?;
    Ok(bond)
}
