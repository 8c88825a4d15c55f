//! Trace input: one `<op> <address>` record per line, `op` being `r` or `w`
//! and `address` a hexadecimal integer without a `0x` prefix.

use std::io::BufRead;

use crate::error::{Error, TraceParseError};

const READ: &str = "r";
const WRITE: &str = "w";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Read,
    Write,
}

/// A single memory access event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Access {
    pub op: Op,
    pub address: u64,
}

impl Access {
    pub fn read(address: u64) -> Self {
        Self {
            op: Op::Read,
            address,
        }
    }

    pub fn write(address: u64) -> Self {
        Self {
            op: Op::Write,
            address,
        }
    }
}

/// Parse one trace line. `line_number` is only used for error reporting.
pub fn parse_line(line: &str, line_number: usize) -> Result<Access, TraceParseError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let &[op, address] = parts.as_slice() else {
        return Err(TraceParseError::TokenCount {
            line: line_number,
            found: parts.len(),
        });
    };

    let op = match op {
        READ => Op::Read,
        WRITE => Op::Write,
        other => {
            return Err(TraceParseError::UnknownOp {
                line: line_number,
                op: other.to_string(),
            })
        }
    };
    let bad_address = || TraceParseError::BadAddress {
        line: line_number,
        address: address.to_string(),
    };
    // from_str_radix alone would take a leading `+`
    if !address.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(bad_address());
    }
    let address = u64::from_str_radix(address, 16).map_err(|_| bad_address())?;

    Ok(Access { op, address })
}

/// Iterator over the accesses of a trace, skipping blank lines.
pub struct TraceReader<R> {
    lines: std::io::Lines<R>,
    line_number: usize,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<Access, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(parse_line(&line, self.line_number).map_err(Error::from));
        }
    }
}
