use super::test::TestCriterion;
use super::*;

use std::fs::File;
use std::io::prelude::*;
use std::path::Path;

/// One source line together with everything pass 2 learned about it.
#[derive(Debug)]
pub struct ProgramLine {
    pub src_line_num: usize, // line number in source (1-based)
    pub src: String,         // verbatim line from source
    pub addr: u16,           // the program address corresponding to this line
    pub bytes: Vec<u8>,      // machine code emitted for this line
}
impl ProgramLine {
    pub fn is_inert(&self) -> bool { self.bytes.is_empty() }
}
impl fmt::Display for ProgramLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex: Vec<String> = self.bytes.iter().map(|b| format!("{:02X}", b)).collect();
        write!(f, "{:04X} {:12} {}", self.addr, hex.join(" "), self.src)
    }
}

/// A non-fatal problem found while assembling. The line still occupies
/// zero bytes and assembly continues; the run never aborts for these.
#[derive(Debug)]
pub struct Diagnostic {
    pub src_line_num: usize,
    pub msg: String,
}
impl Diagnostic {
    pub fn new(src_line_num: usize, msg: String) -> Self { Diagnostic { src_line_num, msg } }
}
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: {}", self.src_line_num, self.msg)
    }
}

/// The result of assembling a source file: the machine-code image, the
/// origin it loads at, the final label table, and the structured
/// diagnostics and test criteria gathered along the way.
#[derive(Debug)]
pub struct Program {
    pub origin: u16,                  // load address of the first image byte
    pub bytes: Vec<u8>,               // the machine code image
    pub labels: HashMap<String, u16>, // all labels; case sensitive
    pub lines: Vec<ProgramLine>,      // per-line records for listings
    pub diagnostics: Vec<Diagnostic>, // non-fatal problems, in source order
    pub results: Vec<TestCriterion>,  // expected results for test criteria
}
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Program: {} bytes at {:04X}, {} labels, {} diagnostics",
            self.bytes.len(),
            self.origin,
            self.labels.len(),
            self.diagnostics.len(),
        )
    }
}
impl Program {
    pub fn write_listing(&self, f: &mut dyn io::Write) -> Result<(), io::Error> {
        for line in &self.lines {
            if config::ARGS.code_only && line.is_inert() {
                continue;
            }
            writeln!(f, "{:4} {}", line.src_line_num, line)?;
        }
        Ok(())
    }
    pub fn write_output_files(&self, parent_filename: &str) -> Result<(), Error> {
        let path = Path::new(parent_filename);
        let basename = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or(general_err!("bad filename"))?;
        let mut pb = path.to_path_buf();
        pb.set_file_name(basename);
        // write out the listing file
        pb.set_extension("lst");
        let mut file = File::create(&pb)?;
        self.write_listing(&mut file)?;
        println!("wrote listing file: {}", pb.display());
        // now symbols...
        // first create a collection of (name,addr) label tuples
        let mut labels: Vec<(&String, u16)> = self.labels.iter().map(|(s, &a)| (s, a)).collect();
        // sort them by address
        labels.sort_by(|a, b| a.1.cmp(&b.1));
        // now try to write them out to a *.sym file
        pb.set_extension("sym");
        file = File::create(&pb)?;
        for label in labels {
            writeln!(file, "{:04X},{}", label.1, label.0)?;
        }
        println!("wrote symbol file: {}", pb.display());
        Ok(())
    }
}
