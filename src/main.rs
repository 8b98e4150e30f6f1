//! # A 6502 Assembler and Emulator written in Rust.
//!
//! ## Getting Started
//! To assemble and run a program:
//! ```
//! cargo run -- -r /path/to/program.asm
//! ```
//! ...or if you've already built the binary then just...
//! ```
//! 6502 -r /path/to/program.asm
//! ```
//! ## Options
//! Help for command line options is available using -h or --help.
#[macro_use]
mod macros;
mod assembler;
mod config;
mod core;
mod error;
mod instructions;
mod memory;
mod parse;
mod program;
mod registers;
mod runtime;
use crate::assembler::Assembler;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;
use std::result::Result;
use std::{fmt, fs, io};
pub(crate) use {crate::core::Core, crate::error::*, program::*};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::init();
    // process_file does all the work
    if let Err(e) = process_file(config::ARGS.file.as_str()) {
        println!("{}", e);
        return Err(Box::new(e));
    }
    Ok(())
}
/// process_file drives the top level functionality (assemble, load, run) of the app
fn process_file(filename: &str) -> Result<(), Error> {
    let path = Path::new(filename);
    let ext = path.extension().and_then(OsStr::to_str).unwrap_or("");
    if !matches!(ext.to_ascii_lowercase().as_str(), "asm" | "s") {
        return Err(general_err!("unrecognized file type"));
    }
    let asm = Assembler::new();
    info!("Assembling {}", filename);
    let program = asm.assemble_from_file(filename)?;
    for d in &program.diagnostics {
        warn!("{}", d);
    }
    verbose_println!(
        "assembled {} bytes at {:04x} with {} labels",
        program.bytes.len(),
        program.origin,
        program.labels.len()
    );
    if config::ARGS.list {
        program.write_listing(&mut io::stdout())?;
    }
    if config::ARGS.write_files {
        _ = program.write_output_files(filename);
    }
    if config::run() {
        // we're going to try to run the program; create a CPU simulator
        let chr = match config::ARGS.chr.as_ref() {
            Some(file) => fs::read(file)?,
            None => Vec::new(),
        };
        let mut core = Core::from_program(&program, chr);
        core.reset_vector = config::ARGS.reset_vector;
        if !core.chr.is_empty() {
            verbose_println!("carrying {} byte character bank", core.chr.len());
        }
        // put the simulator in a reset state and start running the program
        core.reset();
        if config::ARGS.reset_vector.is_none()
            && !(core.image_covers(0xfffc) && core.image_covers(0xfffd))
        {
            // no reset vector in the image; start at the origin
            core.reg.pc = core.origin;
        }
        info!("Executing {}", filename);
        core.exec()?;
        verbose_println!(
            "executed {} instructions in {} cycles",
            core.instruction_count,
            core.clock_cycles
        );
        // if there are any test criteria then check them now
        core.check_criteria(&program.results)?;
    }
    Ok(())
}
