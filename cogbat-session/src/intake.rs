//! Console participant intake, run before any window opens. Cancelling
//! (blank ID or end of input) returns None and the caller exits without
//! having written anything.

use std::io::{BufRead, Write};

use crate::error::{Result, SessionError};
use crate::session::Participant;

pub fn collect<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Option<Participant>> {
    let id = loop {
        let line = prompt(input, output, "Participant ID (blank to cancel): ")?;
        let line = match line {
            Some(l) => l,
            None => return Ok(None),
        };
        match line.parse::<u32>() {
            Ok(id) => break id,
            Err(_) => writeln!(output, "Please enter a whole number.")
                .map_err(|e| SessionError::Intake(e.to_string()))?,
        }
    };

    let age = match prompt(input, output, "Age (blank to skip): ")? {
        None => None,
        Some(line) => match line.parse::<u32>() {
            Ok(age) => Some(age),
            Err(_) => None,
        },
    };

    let condition = prompt(input, output, "Condition label [A]: ")?.unwrap_or_else(|| "A".into());

    Ok(Some(Participant { id, age, condition }))
}

pub fn collect_from_stdin() -> Result<Option<Participant>> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();
    collect(&mut input, &mut output)
}

/// One prompt/read exchange; None for blank input or EOF.
fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, text: &str) -> Result<Option<String>> {
    write!(output, "{}", text).map_err(|e| SessionError::Intake(e.to_string()))?;
    output
        .flush()
        .map_err(|e| SessionError::Intake(e.to_string()))?;
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|e| SessionError::Intake(e.to_string()))?;
    let line = line.trim().to_string();
    if read == 0 || line.is_empty() {
        Ok(None)
    } else {
        Ok(Some(line))
    }
}
