//! Glue to the external front-end compiler.
//!
//! The front-end reads a source file on stdin and prints the source back,
//! followed by the AST in indentation form; on failure its last line is
//! `syntax error`. This module runs it and cuts the AST out of its output.

use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

use log::{debug, info};
use memchr::memchr_iter;

use crate::error::{InterpError, Result};
use crate::parser::SYNTAX_ERROR;

/// Number of lines in `source`, counting an unterminated last line.
pub fn count_lines(source: &[u8]) -> usize {
    let newlines = memchr_iter(b'\n', source).count();

    match source.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}

/// Drop the echoed source from the front-end's `output`.
pub fn strip_source_echo(output: &str, source_lines: usize) -> Result<String> {
    if output.lines().last().map(str::trim_end) == Some(SYNTAX_ERROR) {
        return Err(InterpError::FrontEnd {
            output: output.to_string(),
        });
    }

    let ast: Vec<&str> = output.lines().skip(source_lines).collect();

    debug!(
        "Front-end output: {} echoed line(s), {} AST line(s)",
        source_lines,
        ast.len()
    );

    Ok(ast.join("\n"))
}

/// Run `command` through `sh -c` with `source` on stdin and return the AST text.
pub fn compile(command: &str, source: &Path) -> Result<String> {
    info!("Running front-end '{}' on {:?}", command, source);

    let source_lines = count_lines(&std::fs::read(source)?);
    let input = File::open(source)?;

    let result = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::from(input))
        .output()?;

    let mut output = String::from_utf8_lossy(&result.stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(&result.stderr));

    if !result.status.success() {
        debug!("Front-end exited with {}", result.status);

        return Err(InterpError::FrontEnd { output });
    }

    strip_source_echo(&output, source_lines)
}
