/*!
  A simulator and ROM encoder for an eight-instruction tape machine.

  The same source text can be run in the simulator (`machine`) or lowered into a
  logisim-evolution ROM (`bytecode`) for the hardware implementation of the machine.
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod address;
pub mod arguments;
pub mod bytecode;
pub mod cell;
pub mod machine;
