/*!

  The machine has eight instructions, each written in source as a single character and each
  encoded in a ROM as a single octal digit. Every other source character is a comment.

    Character  Instruction  Digit
        >       MoveRight     0
        <       MoveLeft      1
        +       Increment     2
        -       Decrement     3
        .       Output        4
        ,       Input         5
        [       LoopOpen      6
        ]       LoopClose     7

  There is no halt instruction and no jump table. The simulator stops when it runs off the end
  of the source, and matches brackets at run time with its call stack. The hardware target can
  do neither, so the ROM encoder wraps the program in a prologue that settles the data pointer
  and an epilogue that parks the CPU in an infinite empty loop.

  The ROM text is what logisim-evolution calls the "v3.0 hex words plain" format. Since every
  word is below 8, the hex words are written as single octal digits.

*/

mod instruction;
mod parse;
mod rom;

pub use instruction::{instruction_count, source_digit, Digit, Instruction};
pub use parse::{parse_rom, RomParseError};
pub use rom::{
  nth_rom_character, rom_instruction_count, RomImage, EPILOGUE, PROLOGUE, ROM_HEADER,
  TOKENS_PER_LINE
};
