//! The simulator: a tape machine that executes source text one character at a time.

use std::fmt::{Display, Formatter};
use std::io::{self, Read, Write};

use prettytable::{format as TableFormat, Table};

use crate::address::{DataPointer, MEMORY_SIZE};
use crate::bytecode::Instruction;
use crate::cell::{Cell, CellWidth};

/// Maximum loop nesting depth.
pub const CALL_STACK_SIZE: usize = 0x100;
/// Number of memory cells shown when the machine is displayed.
const MEMORY_WINDOW: usize = 8;

#[derive(Debug)]
pub enum ExecutionError {
  /// A `]` with no open loop to return to.
  UnmatchedLoopClose{
    position: usize
  },
  /// The source ended inside the loop opened at `position`.
  UnterminatedLoop{
    position: usize
  },
  /// The `[` at `position` nests deeper than `CALL_STACK_SIZE`.
  CallStackOverflow{
    position: usize
  },
  Io(io::Error)
}

impl Display for ExecutionError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      ExecutionError::UnmatchedLoopClose{position} => {
        write!(f, "Error at character {}: ']' without a matching '['.", position)
      }
      ExecutionError::UnterminatedLoop{position} => {
        write!(f, "Error at character {}: '[' without a matching ']'.", position)
      }
      ExecutionError::CallStackOverflow{position} => {
        write!(
          f,
          "Error at character {}: loops cannot be nested more than {} deep.",
          position, CALL_STACK_SIZE
        )
      }
      ExecutionError::Io(e) => {
        write!(f, "I/O error: {}", e)
      }
    }
  }
}

impl std::error::Error for ExecutionError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ExecutionError::Io(e) => Some(e),
      _ => None
    }
  }
}

impl From<io::Error> for ExecutionError {
  fn from(e: io::Error) -> ExecutionError {
    ExecutionError::Io(e)
  }
}

/**
  Machine state for one run of a program.

  Brackets are matched while running rather than ahead of time: every `[` pushes the address of
  the instruction after it onto the call stack, and every `]` either jumps back to that address
  or pops it. A loop whose cell is zero on entry is skipped by fast forwarding: characters are
  still stepped through one at a time, so nested brackets keep the call stack balanced, but
  they have no effect on memory or the streams. Fast forwarding ends at the `]` that brings the
  call stack back to the depth it had when the skip began.
*/
pub struct Machine<R, W> {

  // Flags
  fast_forward        : bool,  // Skipping a loop whose cell was zero on entry
  fast_forward_anchor : usize, // Call stack depth when fast forwarding started

  // Registers
  program_counter : usize,
  data_pointer    : DataPointer,
  call_stack      : Vec<usize>, // Return addresses for `]`

  // Memory store
  memory     : Vec<Cell>,
  cell_width : CellWidth,
  cell_mask  : Cell,

  // Streams
  input  : R,
  output : W,
}

impl<R, W> Machine<R, W> {

  // region Display methods

  /// A window of memory around the data pointer, with the current cell starred.
  fn memory_table(&self) -> Table {
    let pointer = self.data_pointer.idx();
    let start   = pointer.saturating_sub(MEMORY_WINDOW / 2).min(MEMORY_SIZE - MEMORY_WINDOW);

    let mut table = Table::new();
    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubc->"", ubr->"Cell", ubr->"Value", ubc->"Char"]);

    for idx in start..start + MEMORY_WINDOW {
      let value  = self.memory[idx];
      let marker = if idx == pointer { "*" } else { "" };
      let cell   = DataPointer::new(idx).to_string();
      let glyph  =
        match value {
          0x20..=0x7E => (value as u8 as char).to_string(),
          _           => String::new()
        };
      table.add_row(row![c->marker, r->cell, r->value, c->glyph]);
    }
    table
  }

  /// Open loops, innermost first. Loops being skipped by fast forwarding are marked.
  fn call_stack_table(&self) -> Table {
    let mut table = Table::new();
    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Depth", ubr->"Loop at", ubl->"Body at"]);

    for (i, return_address) in self.call_stack.iter().enumerate().rev() {
      let depth    = i + 1;
      let loop_at  = return_address - 1;
      let skipping = self.fast_forward && depth >= self.fast_forward_anchor;
      let body_at  =
        match skipping {
          true  => format!("{} (skipped)", return_address),
          false => return_address.to_string()
        };
      table.add_row(row![r->depth, r->loop_at, l->body_at]);
    }
    table
  }

  // endregion

  // region Accessors

  pub fn program_counter(&self) -> usize {
    self.program_counter
  }

  pub fn data_pointer(&self) -> DataPointer {
    self.data_pointer
  }

  pub fn cell_width(&self) -> CellWidth {
    self.cell_width
  }

  pub fn memory(&self) -> &[Cell] {
    &self.memory
  }

  /// The cell under the data pointer, which controls loops.
  pub fn current_cell(&self) -> Cell {
    self.memory[self.data_pointer.idx()]
  }

  pub fn call_stack_depth(&self) -> usize {
    self.call_stack.len()
  }

  pub fn is_fast_forwarding(&self) -> bool {
    self.fast_forward
  }

  /// Tears the machine down, giving back its streams.
  pub fn into_streams(self) -> (R, W) {
    (self.input, self.output)
  }

  // endregion
}

impl<R: Read, W: Write> Machine<R, W> {

  pub fn new(cell_width: CellWidth, input: R, output: W) -> Machine<R, W> {
    Machine {
      fast_forward        : false,
      fast_forward_anchor : 0,
      program_counter     : 0,
      data_pointer        : DataPointer::default(),
      call_stack          : Vec::with_capacity(CALL_STACK_SIZE),
      memory              : vec![0; MEMORY_SIZE],
      cell_width,
      cell_mask           : cell_width.mask(),
      input,
      output,
    }
  }

  /**
    Runs `program` from the current program counter until it falls off the end. Output is
    flushed before returning, whether or not execution succeeded.
  */
  pub fn run(&mut self, program: &[u8]) -> Result<(), ExecutionError> {
    let result = self.execute(program);
    self.output.flush()?;

    #[cfg(feature = "trace_computation")] eprintln!("{}", self);

    result
  }

  fn execute(&mut self, program: &[u8]) -> Result<(), ExecutionError> {
    while self.program_counter < program.len() {
      self.step(program[self.program_counter])?;
    }

    // The outermost open loop is the one left unterminated.
    match self.call_stack.first() {
      Some(return_address) => Err(ExecutionError::UnterminatedLoop{ position: return_address - 1 }),
      None                 => Ok(())
    }
  }

  /// Executes the single source character `c` found at the program counter.
  pub fn step(&mut self, c: u8) -> Result<(), ExecutionError> {
    let instruction = Instruction::from_source(c);
    let mut advance = true;

    if !self.fast_forward {
      if let Some(instruction) = instruction {
        self.apply(instruction)?;
      }
    }

    #[cfg(feature = "trace_computation")] self.trace(instruction);

    // Loop instructions run even when fast forwarding, so that the call stack mirrors nesting.
    match instruction {
      Some(Instruction::LoopOpen)  => self.loop_open()?,
      Some(Instruction::LoopClose) => advance = self.loop_close()?,
      _                            => {}
    }

    if advance {
      self.program_counter += 1;
    }
    Ok(())
  }

  // region VM instruction methods

  /// Applies the effect of `instruction` on memory and the streams.
  fn apply(&mut self, instruction: Instruction) -> Result<(), ExecutionError> {
    match instruction {

      Instruction::MoveRight => {
        self.data_pointer = self.data_pointer + 1;
      }

      Instruction::MoveLeft => {
        self.data_pointer = self.data_pointer - 1;
      }

      Instruction::Increment => {
        let cell = &mut self.memory[self.data_pointer.idx()];
        *cell = cell.wrapping_add(1) & self.cell_mask;
      }

      Instruction::Decrement => {
        let cell = &mut self.memory[self.data_pointer.idx()];
        *cell = cell.wrapping_sub(1) & self.cell_mask;
      }

      Instruction::Output => {
        self.write_cell()?;
      }

      Instruction::Input => {
        self.read_cell()?;
      }

      Instruction::LoopOpen | Instruction::LoopClose => {}

    }
    Ok(())
  }

  /**
    Writes the current cell as a byte, truncating wider cells. A tab is always written as a
    space: the hardware's terminal does the same, and simulated output must match it.
  */
  fn write_cell(&mut self) -> io::Result<()> {
    let value = self.current_cell();
    let byte =
      match value == b'\t' as Cell {
        true  => b' ',
        false => value as u8
      };
    self.output.write_all(&[byte])
  }

  /// Reads one byte into the current cell. At end of input the cell is left unchanged.
  fn read_cell(&mut self) -> io::Result<()> {
    // Prompts must be visible before we block.
    self.output.flush()?;

    let mut byte = [0u8; 1];
    loop {
      match self.input.read(&mut byte) {
        Ok(0) => return Ok(()),
        Ok(_) => {
          self.memory[self.data_pointer.idx()] = byte[0] as Cell & self.cell_mask;
          return Ok(());
        }
        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
        Err(e) => return Err(e)
      }
    }
  }

  fn loop_open(&mut self) -> Result<(), ExecutionError> {
    if self.call_stack.len() == CALL_STACK_SIZE {
      return Err(ExecutionError::CallStackOverflow{ position: self.program_counter });
    }
    self.call_stack.push(self.program_counter + 1);

    // Start fast forwarding to the matching `]` if the loop would not run at all.
    if self.current_cell() == 0 && !self.fast_forward {
      self.fast_forward        = true;
      self.fast_forward_anchor = self.call_stack.len();
    }
    Ok(())
  }

  /// Returns whether the program counter should advance past the `]`.
  fn loop_close(&mut self) -> Result<bool, ExecutionError> {
    let return_address =
      match self.call_stack.last() {
        Some(address) => *address,
        None => {
          return Err(ExecutionError::UnmatchedLoopClose{ position: self.program_counter });
        }
      };

    if self.fast_forward && self.call_stack.len() == self.fast_forward_anchor {
      // Found the `]` matching the skipped `[`.
      self.fast_forward        = false;
      self.fast_forward_anchor = 0;
    }

    match self.current_cell() == 0 {

      true  => {
        // Stop looping
        self.call_stack.pop();
        Ok(true)
      }

      false => {
        // Keep looping
        self.program_counter = return_address;
        Ok(false)
      }

    }
  }

  #[cfg(feature = "trace_computation")]
  fn trace(&self, instruction: Option<Instruction>) {
    let name: &'static str =
      match instruction {
        Some(instruction) => instruction.into(),
        None              => "-"
      };
    eprintln!(
      "{:>8}  {:<10} {} = {:<10}  depth {}{}",
      self.program_counter,
      name,
      self.data_pointer,
      self.current_cell(),
      self.call_stack.len(),
      match self.fast_forward {
        true  => "  (fast forward)",
        false => ""
      }
    );
  }

  // endregion

}


lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('═', '═', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl<R, W> Display for Machine<R, W> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let mut combined_table = table!([self.memory_table(), self.call_stack_table()]);

    combined_table.set_titles(row![ub->"Memory", ub->"Call Stack"]);
    combined_table.set_format(*TableFormat::consts::FORMAT_CLEAN);

    let mode = match self.fast_forward {
      true  => "Fast forwarding.",
      false => "Executing."
    };

    write!(
      f,
      "PC: {}\tCells: {}\t{}\n{}",
      self.program_counter, self.cell_width, mode, combined_table
    )
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  fn run_with_input<'a>(source: &str, width: CellWidth, input: &'a [u8])
    -> Machine<&'a [u8], Vec<u8>>
  {
    let mut machine = Machine::new(width, input, Vec::new());
    machine.run(source.as_bytes()).unwrap();
    machine
  }

  fn output_of(source: &str, width: CellWidth, input: &[u8]) -> Vec<u8> {
    let machine = run_with_input(source, width, input);
    machine.into_streams().1
  }

  #[test]
  fn add_and_print(){
    assert_eq!(output_of("++.", CellWidth::Eight, b""), vec![2]);
  }

  #[test]
  fn loop_runs_once(){
    let machine = run_with_input("+[-]", CellWidth::Eight, b"");
    assert_eq!(machine.current_cell(), 0);
    assert_eq!(machine.data_pointer().idx(), 0);
    assert_eq!(machine.program_counter(), 4);
    assert_eq!(machine.call_stack_depth(), 0);
    assert!(!machine.is_fast_forwarding());
  }

  #[test]
  fn zero_loop_fast_forwards_once(){
    let program = b"[+]";
    let mut machine = Machine::new(CellWidth::Eight, &b""[..], Vec::new());
    let mut entered = 0;
    let mut exited  = 0;

    while machine.program_counter() < program.len() {
      let before = machine.is_fast_forwarding();
      machine.step(program[machine.program_counter()]).unwrap();
      match (before, machine.is_fast_forwarding()) {
        (false, true) => entered += 1,
        (true, false) => exited  += 1,
        _             => {}
      }
    }

    assert_eq!((entered, exited), (1, 1));
    assert!(machine.memory().iter().all(|cell| *cell == 0));
    assert_eq!(machine.call_stack_depth(), 0);
  }

  #[test]
  fn skipped_loop_has_no_side_effects(){
    let (input, output) = {
      let machine = run_with_input("[.,[.,]+.,[]-.]", CellWidth::Eight, b"xyz");
      assert!(machine.memory().iter().all(|cell| *cell == 0));
      machine.into_streams()
    };
    assert!(output.is_empty());
    assert_eq!(input, b"xyz");
  }

  #[test]
  fn nested_zero_loop_does_not_end_skip(){
    // Without the anchor, the inner `]` would end the skip and `.` would print a zero.
    assert!(output_of("[[].]", CellWidth::Eight, b"").is_empty());
  }

  #[test]
  fn zero_loop_inside_running_loop(){
    let machine = run_with_input("+[>[.]<-]", CellWidth::Eight, b"");
    assert!(machine.memory().iter().all(|cell| *cell == 0));
    assert_eq!(machine.into_streams().1, Vec::<u8>::new());
  }

  #[test]
  fn multiply(){
    assert_eq!(output_of("++++[>+++<-]>.", CellWidth::Eight, b""), vec![12]);
  }

  #[test]
  fn hello_world(){
    let source =
      "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.\
       --------.>>+.>++.";
    assert_eq!(output_of(source, CellWidth::Eight, b""), b"Hello World!\n".to_vec());
  }

  #[test]
  fn comments_are_inert(){
    assert_eq!(output_of("two: + + then print it .", CellWidth::Eight, b""), vec![2]);
  }

  #[test]
  fn eight_bit_wraparound(){
    let source = "+".repeat(256);
    let machine = run_with_input(&source, CellWidth::Eight, b"");
    assert_eq!(machine.current_cell(), 0);

    let machine = run_with_input("-", CellWidth::Eight, b"");
    assert_eq!(machine.current_cell(), 0xFF);
  }

  #[test]
  fn sixteen_bit_wraparound(){
    let machine = run_with_input(&"+".repeat(256), CellWidth::Sixteen, b"");
    assert_eq!(machine.current_cell(), 256);

    let machine = run_with_input(&"+".repeat(1 << 16), CellWidth::Sixteen, b"");
    assert_eq!(machine.current_cell(), 0);

    let machine = run_with_input("-", CellWidth::Sixteen, b"");
    assert_eq!(machine.current_cell(), 0xFFFF);
  }

  #[test]
  fn thirty_two_bit_wraparound(){
    let machine = run_with_input("-", CellWidth::ThirtyTwo, b"");
    assert_eq!(machine.current_cell(), 0xFFFF_FFFF);

    let machine = run_with_input("-+", CellWidth::ThirtyTwo, b"");
    assert_eq!(machine.current_cell(), 0);
  }

  #[test]
  fn wide_cells_print_low_byte(){
    // 0x141 prints as 'A'.
    let source = format!("{}.", "+".repeat(0x141));
    assert_eq!(output_of(&source, CellWidth::Sixteen, b""), b"A".to_vec());
  }

  #[test]
  fn pointer_wraps(){
    let machine = run_with_input("<+", CellWidth::Eight, b"");
    assert_eq!(machine.data_pointer().idx(), MEMORY_SIZE - 1);
    assert_eq!(machine.memory()[MEMORY_SIZE - 1], 1);

    let machine = run_with_input("<>+", CellWidth::Eight, b"");
    assert_eq!(machine.memory()[0], 1);
  }

  #[test]
  fn tab_prints_as_space(){
    assert_eq!(output_of("+++++++++.", CellWidth::Eight, b""), b" ".to_vec());
    assert_eq!(output_of("++++++++++.", CellWidth::Eight, b""), b"\n".to_vec());
  }

  #[test]
  fn input(){
    assert_eq!(output_of(",.,.", CellWidth::Eight, b"hi"), b"hi".to_vec());
  }

  #[test]
  fn end_of_input_leaves_cell(){
    assert_eq!(output_of("+++,.", CellWidth::Eight, b""), vec![3]);
    assert_eq!(output_of(",.,.", CellWidth::Eight, b"A"), b"AA".to_vec());
  }

  #[test]
  fn unmatched_loop_close(){
    let mut machine = Machine::new(CellWidth::Eight, &b""[..], Vec::new());
    match machine.run(b"+]") {
      Err(ExecutionError::UnmatchedLoopClose{position}) => assert_eq!(position, 1),
      other => panic!("expected an unmatched ']', got {:?}", other)
    }
  }

  #[test]
  fn unterminated_loop(){
    let mut machine = Machine::new(CellWidth::Eight, &b""[..], Vec::new());
    match machine.run(b"+[[-]") {
      Err(ExecutionError::UnterminatedLoop{position}) => assert_eq!(position, 1),
      other => panic!("expected an unterminated '[', got {:?}", other)
    }

    let mut machine = Machine::new(CellWidth::Eight, &b""[..], Vec::new());
    assert!(machine.run(b"[").is_err());
  }

  #[test]
  fn call_stack_overflow(){
    let source = "[".repeat(CALL_STACK_SIZE + 1);
    let mut machine = Machine::new(CellWidth::Eight, &b""[..], Vec::new());
    match machine.run(source.as_bytes()) {
      Err(ExecutionError::CallStackOverflow{position}) => assert_eq!(position, CALL_STACK_SIZE),
      other => panic!("expected a call stack overflow, got {:?}", other)
    }

    let source = format!("{}{}", "[".repeat(CALL_STACK_SIZE), "]".repeat(CALL_STACK_SIZE));
    let mut machine = Machine::new(CellWidth::Eight, &b""[..], Vec::new());
    assert!(machine.run(source.as_bytes()).is_ok());
  }

  #[test]
  fn output_survives_errors(){
    let mut machine = Machine::new(CellWidth::Eight, &b""[..], Vec::new());
    assert!(machine.run(b"++.]").is_err());
    assert_eq!(machine.into_streams().1, vec![2]);
  }

  #[test]
  fn display(){
    let mut machine = Machine::new(CellWidth::Sixteen, &b""[..], Vec::new());
    assert!(machine.run(b">>+[").is_err());
    let text = machine.to_string();
    assert!(text.starts_with("PC: 4\tCells: 16 bit\tExecuting."));
    assert!(text.lines().any(|line| line.contains('*') && line.contains("M[2]")));
    assert!(text.contains("Loop at"));
    assert!(!text.contains("(skipped)"));
  }

  #[test]
  fn display_marks_skipped_loops(){
    let mut machine = Machine::new(CellWidth::Eight, &b""[..], Vec::new());
    machine.step(b'[').unwrap();
    let text = machine.to_string();
    assert!(text.contains("Fast forwarding."));
    assert!(text.contains("1 (skipped)"));
  }

  #[test]
  fn display_at_end_of_memory(){
    let mut machine = Machine::new(CellWidth::Eight, &b""[..], Vec::new());
    machine.run(b"<+").unwrap();
    let text = machine.to_string();
    assert!(text.lines().any(|line| line.contains('*') && line.contains("M[65535]")));
    assert!(text.contains("M[65528]"));
    assert!(!text.contains("M[0]"));
  }

}
