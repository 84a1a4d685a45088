/*!
  Command line arguments. The first argument selects the mode; the rest are an optional source
  file and, for the simulator, an optional cell width flag:

    toolchain bin [file]                    Make a logisim-evolution ROM
    toolchain sim [file] [-8b|-16b|-32b]    Simulate a program
    toolchain dis [file]                    Turn a ROM back into source

  When the file is omitted, standard input is read.
*/

use std::fmt::{Display, Formatter};

use nom::{
  branch::alt,
  bytes::complete::tag,
  character::complete::char as one_char,
  combinator::{all_consuming, map_res},
  sequence::delimited,
  IResult
};
use strum_macros::{Display as StrumDisplay, EnumString};

use crate::cell::CellWidth;

#[derive(StrumDisplay, EnumString, Clone, Copy, Eq, PartialEq, Debug)]
pub enum Mode {
  /// Encode a ROM image.
  #[strum(serialize = "bin")]
  Bin,
  /// Simulate.
  #[strum(serialize = "sim")]
  Sim,
  /// Decode a ROM image.
  #[strum(serialize = "dis")]
  Dis,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Arguments {
  pub mode       : Mode,
  /// `None` reads standard input.
  pub path       : Option<String>,
  pub cell_width : CellWidth,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ArgumentError {
  /// No mode, or one we don't know. Answered with the usage text.
  Usage,
  UnknownOption{
    mode   : Mode,
    option : String
  },
  MultipleCellWidths{
    option: String
  },
  MultipleFiles{
    path: String
  },
}

impl Display for ArgumentError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      ArgumentError::Usage => {
        write!(f, "{}", USAGE)
      }
      ArgumentError::UnknownOption{mode, option} => {
        write!(f, "Unknown option for {}: \"{}\"", mode, option)
      }
      ArgumentError::MultipleCellWidths{option} => {
        write!(f, "Cannot specify multiple cell widths: error on \"{}\"", option)
      }
      ArgumentError::MultipleFiles{path} => {
        write!(f, "Only one input file allowed: error on \"{}\"", path)
      }
    }
  }
}

impl std::error::Error for ArgumentError {}

pub const USAGE: &str =
"Program usage: ./toolchain bin <file>           - Make logisim-evolution ROM
               ./toolchain sim <file> [options] - Simulate Brainfuck program
               ./toolchain dis <file>           - Decode logisim-evolution ROM

If the file is omitted, stdin is used.

OPTIONS (for simulation):

-8b, -16b, -32b: set width of the cells (default: 8 bits)
";

/// Parses a `-<bits>b` flag into its bit count. Only the exact spellings are flags, so `-08b`
/// is an unknown option.
fn cell_width_flag(input: &str) -> IResult<&str, u8> {
  all_consuming(
    delimited(
      one_char('-'),
      map_res(alt((tag("8"), tag("16"), tag("32"))), |digits: &str| digits.parse::<u8>()),
      one_char('b')
    )
  )(input)
}

/// Parses everything after the program name.
pub fn parse_arguments<S: AsRef<str>>(args: &[S]) -> Result<Arguments, ArgumentError> {
  let (mode, rest) =
    match args.split_first() {
      Some((mode, rest)) => {
        match <S as AsRef<str>>::as_ref(mode).parse::<Mode>() {
          Ok(mode) => (mode, rest),
          Err(_e)  => return Err(ArgumentError::Usage)
        }
      }
      None => return Err(ArgumentError::Usage)
    };

  let mut path: Option<String> = None;
  let mut cell_width: Option<CellWidth> = None;

  for arg in rest.iter().map(|arg| <S as AsRef<str>>::as_ref(arg)) {
    if arg.starts_with('-') {
      let width =
        match (mode, cell_width_flag(arg)) {
          (Mode::Sim, Ok((_, bits))) => CellWidth::from_bits(bits),
          _                          => None
        };
      match (width, cell_width) {
        (Some(_), Some(_)) => {
          return Err(ArgumentError::MultipleCellWidths{ option: arg.to_string() });
        }
        (Some(width), None) => cell_width = Some(width),
        (None, _) => {
          return Err(ArgumentError::UnknownOption{ mode, option: arg.to_string() });
        }
      }
    } else if !arg.is_empty() {
      if path.is_some() {
        return Err(ArgumentError::MultipleFiles{ path: arg.to_string() });
      }
      path = Some(arg.to_string());
    }
  }

  Ok(Arguments{
    mode,
    path,
    cell_width: cell_width.unwrap_or_default()
  })
}
