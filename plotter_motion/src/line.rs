//! Serial command line parser.
//!
//! A line is either a bare keyword (`RESET`, `LED`) or a code word
//! (`G01`, `M114`, `J69`, ...) followed by letter+number parameter words.
//! Case is ignored, `;` starts a comment, whitespace between words is
//! optional. Leading zeros in codes are ignored, so `G0` and `G00` are the
//! same command.

use nom::{
    IResult,
    character::complete::{digit1, one_of, satisfy, space0},
    combinator::{all_consuming, map_res},
    multi::many0,
    number::complete::float,
    sequence::{pair, preceded, terminated},
};
use thiserror::Error;
use tracing::trace;

use crate::command::{Command, MoveParams};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Blank or comment-only line.
    #[error("empty line")]
    Empty,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    /// Known command with unparseable parameters.
    #[error("malformed parameters in `{0}`")]
    Malformed(String),
}

/// `G1`, `M114`, `J69`: letter and numeric code.
fn code_word(input: &str) -> IResult<&str, (char, u16)> {
    preceded(space0, pair(one_of("GMJ"), map_res(digit1, str::parse::<u16>)))(input)
}

/// `X-1.5`, `F 1200`: letter and value.
fn parameter_word(input: &str) -> IResult<&str, (char, f32)> {
    preceded(
        space0,
        pair(satisfy(|c| c.is_ascii_alphabetic()), preceded(space0, float)),
    )(input)
}

fn parameters(input: &str) -> IResult<&str, Vec<(char, f32)>> {
    all_consuming(terminated(many0(parameter_word), space0))(input)
}

fn command_for(letter: char, code: u16) -> Option<fn(MoveParams) -> Command> {
    let ctor: fn(MoveParams) -> Command = match (letter, code) {
        ('M', 112) => |_| Command::EmergencyStop,
        ('M', 114) => |_| Command::ReportPosition,
        ('G', 0) => Command::RapidMove,
        ('G', 1) => Command::LinearMove,
        ('G', 28) => |_| Command::Home,
        ('G', 90) => |_| Command::AbsoluteMode,
        ('G', 91) => |_| Command::RelativeMode,
        ('J', 69) => |_| Command::CustomJog,
        _ => return None,
    };
    Some(ctor)
}

/// Parse one command line.
pub fn parse_line(line: &str) -> Result<Command, ParseError> {
    let line = line
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_uppercase();

    match line.as_str() {
        "" => return Err(ParseError::Empty),
        "RESET" => return Ok(Command::Reset),
        "LED" => return Ok(Command::ToggleLed),
        _ => {}
    }

    let Ok((rest, (letter, code))) = code_word(&line) else {
        return Err(ParseError::UnknownCommand(line));
    };
    let Some(ctor) = command_for(letter, code) else {
        return Err(ParseError::UnknownCommand(line));
    };
    let words = match parameters(rest) {
        Ok((_, words)) => words,
        Err(_) => return Err(ParseError::Malformed(line)),
    };

    let mut params = MoveParams::default();
    for (letter, value) in words {
        match letter {
            'X' => params.x = Some(value),
            'Y' => params.y = Some(value),
            'Z' => params.z = Some(value),
            'F' => params.f = Some(value),
            other => trace!(word = %other, value, "parameter ignored"),
        }
    }
    Ok(ctor(params))
}
