use std::error::Error;
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::process;

use octrom::arguments::{parse_arguments, Arguments, ArgumentError, Mode};
use octrom::bytecode::{parse_rom, RomImage};
use octrom::machine::Machine;

/// Reads the whole source, from standard input if there is no path.
fn read_source(path: &Option<String>) -> Result<Vec<u8>, String> {
  let result =
    match path {
      Some(path) => fs::read(path),
      None => {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer).map(|_| buffer)
      }
    };
  result.map_err(|_e| format!("Error opening file: \"{}\"", path.as_deref().unwrap_or("")))
}

/// Runs the selected mode. The simulator reads `input`; every mode writes to `out`.
fn run<R, W>(args: &Arguments, source: &[u8], input: R, mut out: W) -> Result<(), Box<dyn Error>>
  where R: Read,
        W: Write
{
  match args.mode {

    Mode::Bin => {
      writeln!(out, "{}", RomImage::encode(source))?;
    }

    Mode::Sim => {
      #[cfg(feature = "trace_computation")]
      eprintln!("Computation Tracing ENABLED ({} cells)", args.cell_width);

      let mut machine = Machine::new(args.cell_width, input, out);
      machine.run(source)?;
      return Ok(());
    }

    Mode::Dis => {
      let image = parse_rom(&String::from_utf8_lossy(source))?;
      let text  =
        match image.program_source() {
          Some(program) => program,
          // Not padded the way the encoder pads, so show everything.
          None          => image.source()
        };
      writeln!(out, "{}", text)?;
    }

  }

  out.flush()?;
  Ok(())
}

fn main() {
  let argv: Vec<String> = std::env::args().skip(1).collect();

  let args =
    match parse_arguments(&argv) {
      Ok(args) => args,
      Err(e @ ArgumentError::Usage) => {
        eprint!("{}", e);
        process::exit(1);
      }
      Err(e) => {
        eprintln!("{}", e);
        process::exit(1);
      }
    };

  let source =
    match read_source(&args.path) {
      Ok(source) => source,
      Err(message) => {
        eprintln!("{}", message);
        process::exit(1);
      }
    };

  let stdin  = io::stdin();
  let stdout = io::stdout();
  if let Err(e) = run(&args, &source, stdin.lock(), BufWriter::new(stdout.lock())) {
    eprintln!("{}", e);
    process::exit(1);
  }
}
