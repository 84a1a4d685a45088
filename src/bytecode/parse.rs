/*!
  Reads the textual ROM format back into a `RomImage`. The parser is deliberately more lenient
  about whitespace than the encoder is, since images are often hand edited: tokens may be
  separated by any run of spaces, tabs, or line endings.
*/

use std::fmt::{Display, Formatter};

use nom::{
  bytes::complete::tag,
  character::complete::{line_ending, multispace0, one_of, space0},
  combinator::{all_consuming, map},
  multi::many0,
  sequence::{preceded, terminated, tuple},
  IResult
};

use super::instruction::{Digit, Instruction};
use super::rom::{RomImage, ROM_HEADER};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RomParseError {
  /// The first line is not `v3.0 hex words plain`.
  MissingHeader,
  /// Something other than an octal digit or whitespace was found at this byte offset.
  UnexpectedText{
    offset: usize
  }
}

impl Display for RomParseError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      RomParseError::MissingHeader => {
        write!(f, "Error: ROM images must begin with the line \"{}\".", ROM_HEADER)
      }
      RomParseError::UnexpectedText{offset} => {
        write!(f, "Error at byte {}: expected an octal digit.", offset)
      }
    }
  }
}

impl std::error::Error for RomParseError {}

fn header(input: &str) -> IResult<&str, &str> {
  terminated(tag(ROM_HEADER), tuple((space0, line_ending)))(input)
}

fn token(input: &str) -> IResult<&str, Instruction> {
  map(
    terminated(one_of("01234567"), multispace0),
    |c: char| {
      match Instruction::from_digit(c as Digit - b'0') {
        Some(instruction) => instruction,
        None => unreachable!("Octal digit without an instruction: {}", c)
      }
    }
  )(input)
}

/// Parses a complete ROM image.
pub fn parse_rom(text: &str) -> Result<RomImage, RomParseError> {
  let body =
    match header(text) {
      Ok((rest, _)) => rest,
      Err(_e) => return Err(RomParseError::MissingHeader)
    };

  let result: IResult<&str, Vec<Instruction>> =
    all_consuming(preceded(multispace0, many0(token)))(body);
  match result {
    Ok((_rest, instructions)) => Ok(RomImage::new(instructions)),
    Err(nom::Err::Error((rest, _kind))) | Err(nom::Err::Failure((rest, _kind))) => {
      Err(RomParseError::UnexpectedText{ offset: text.len() - rest.len() })
    }
    Err(nom::Err::Incomplete(_)) => {
      Err(RomParseError::UnexpectedText{ offset: text.len() })
    }
  }
}
