//! Building a 6502 assembly language program takes two passes over the
//! same line-handling logic:
//!
//!  1. Pass 1 walks every line, advancing the current address by each
//!     line's emitted length and recording label definitions. The bytes
//!     themselves are thrown away; the pass exists purely to resolve
//!     forward references.
//!  2. Pass 2 re-walks the lines with the now-complete label table and
//!     concatenates the emitted bytes into the final image.
//!
//! Problems (unknown mnemonics, unsupported addressing modes, malformed
//! expressions) never abort a build: the offending line assembles to zero
//! bytes, a Diagnostic is recorded, and assembly continues. The resulting
//! image may be incomplete but the caller always gets it.
use super::parse::Parser;
use super::test::TestCriterion;
use super::*;

use regex::Regex;
use std::fs::File;
use std::io::{self, BufRead};

/// The container for our assembler methods.
pub struct Assembler {
    parser: Parser,
    re_result_line: Regex, // matches test criterion
}

/// Mutable state threaded through one pass. The label table survives from
/// pass 1 into pass 2 (definitions are simply overwritten); everything
/// else restarts.
struct PassState {
    labels: HashMap<String, u16>,
    origin: u16,
    addr: u16,
    diagnostics: Vec<Diagnostic>,
    results: Vec<TestCriterion>,
    emit: bool, // false during pass 1: bytes are discarded and problems stay quiet
}
impl PassState {
    fn diag(&mut self, src_line_num: usize, msg: String) {
        // both passes share the line handler; only pass 2 reports, so
        // each problem shows up exactly once
        if self.emit {
            self.diagnostics.push(Diagnostic::new(src_line_num, msg));
        }
    }
}

impl Assembler {
    pub fn new() -> Assembler {
        instructions::init();
        Assembler {
            parser: Parser::new(),
            re_result_line: Regex::new(r"^\s*;![ \t]*([^\s]+)[ \t]*=[ \t]*([^\s]+)[ \t]*.*$").unwrap(),
        }
    }

    /// Attempt to load and build an assembly language program from a file with the given path.
    pub fn assemble_from_file(&self, path: &str) -> Result<Program, Error> {
        let src = io::BufReader::new(File::open(path)?)
            .lines()
            .collect::<Result<Vec<String>, io::Error>>()?;
        self.assemble(&src)
    }

    /// Performs the full two-pass build over the given source lines.
    pub fn assemble(&self, lines: &[String]) -> Result<Program, Error> {
        let mut st = PassState {
            labels: HashMap::new(),
            origin: 0,
            addr: 0,
            diagnostics: Vec::new(),
            results: Vec::new(),
            emit: false,
        };
        // pass 1: track addresses and label definitions only
        for (i, line) in lines.iter().enumerate() {
            let bytes = self.assemble_line(&mut st, i + 1, line);
            st.addr = st.addr.wrapping_add(bytes.len() as u16);
        }
        // pass 2: identical walk, but keep the bytes
        st.addr = 0;
        st.origin = 0;
        st.emit = true;
        let mut image = Vec::new();
        let mut prog_lines = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let bytes = self.assemble_line(&mut st, i + 1, line);
            prog_lines.push(ProgramLine {
                src_line_num: i + 1,
                src: line.clone(),
                addr: st.addr,
                bytes: bytes.clone(),
            });
            st.addr = st.addr.wrapping_add(bytes.len() as u16);
            image.extend_from_slice(&bytes);
        }
        // test criteria are parsed after pass 2 so that all labels can be resolved
        let PassState {
            labels,
            origin,
            mut diagnostics,
            mut results,
            ..
        } = st;
        for tc in results.iter_mut() {
            if let Err(e) = self.parser.parse_test_criterion(tc, &labels) {
                diagnostics.push(Diagnostic::new(tc.src_line_num, e.msg));
            }
        }
        Ok(Program {
            origin,
            bytes: image,
            labels,
            lines: prog_lines,
            diagnostics,
            results,
        })
    }

    /// Process one source line, returning the bytes it emits. Handles the
    /// comment strip, `name:` labels, `name = expr` constants, directives
    /// and instructions.
    fn assemble_line(&self, st: &mut PassState, src_line_num: usize, line: &str) -> Vec<u8> {
        let line = line.trim();
        let mut bytes = Vec::new();
        // test criteria look like comments; capture them before the strip
        if let Some(c) = self.re_result_line.captures(line) {
            if st.emit {
                st.results.push(TestCriterion::new(src_line_num, &c[1], &c[2]));
            }
            return bytes;
        }
        // remove any comment
        let linex = line.split(';').next().unwrap_or("");
        let mut chunks: Vec<&str> = linex.split_whitespace().collect();
        if chunks.is_empty() {
            return bytes;
        }
        // look for simple defines: name = expr
        if chunks.len() > 2 && chunks[1] == "=" {
            let val = self.eval_or_zero(st, src_line_num, &chunks[2..].concat());
            st.labels.insert(chunks[0].to_string(), val);
            return bytes;
        }
        // a leading "name:" label takes the current address (case sensitive)
        if let Some(name) = chunks[0].strip_suffix(':') {
            st.labels.insert(name.to_string(), st.addr);
            chunks.remove(0);
        }
        if chunks.is_empty() {
            return bytes;
        }
        let op = chunks[0];
        let rest = &chunks[1..];
        if op.starts_with('.') {
            self.process_directive(st, src_line_num, op, rest, &mut bytes);
        } else {
            self.process_instruction(st, src_line_num, op, rest, &mut bytes);
        }
        bytes
    }

    /// Assembler directives: `.ORG expr`, `.DB v,v,...`, `.DW v,v,...`.
    /// Anything else is reported and emits nothing.
    fn process_directive(&self, st: &mut PassState, src_line_num: usize, op: &str, rest: &[&str], bytes: &mut Vec<u8>) {
        match op.to_ascii_uppercase().as_str() {
            ".ORG" => {
                if rest.is_empty() {
                    st.diag(src_line_num, "no address specified for .ORG".to_string());
                    return;
                }
                // org sets both the image origin and the current address
                let addr = self.eval_or_zero(st, src_line_num, rest[0]);
                st.origin = addr;
                st.addr = addr;
            }
            ".DB" => {
                if rest.is_empty() {
                    st.diag(src_line_num, "missing data for .DB".to_string());
                    return;
                }
                for expr in rest.concat().split(',') {
                    let val = self.eval_or_zero(st, src_line_num, expr);
                    bytes.push(val as u8);
                }
            }
            ".DW" => {
                if rest.is_empty() {
                    st.diag(src_line_num, "missing data for .DW".to_string());
                    return;
                }
                for expr in rest.concat().split(',') {
                    let word = self.eval_or_zero(st, src_line_num, expr);
                    bytes.push(word as u8);
                    bytes.push((word >> 8) as u8);
                }
            }
            _ => st.diag(src_line_num, format!("unrecognized directive \"{}\"", op)),
        }
    }

    /// Assembly instructions. Mnemonic lookup is case insensitive. An
    /// implied-mode opcode is a single byte; branches compute a relative
    /// displacement; everything else classifies its operand shape.
    fn process_instruction(
        &self, st: &mut PassState, src_line_num: usize, mnemonic: &str, rest: &[&str], bytes: &mut Vec<u8>,
    ) {
        use instructions::AddressingMode::{Implied, Relative};
        let name = mnemonic.to_ascii_uppercase();
        let desc = match instructions::name_to_descriptor(&name) {
            Some(desc) => desc,
            None => {
                st.diag(src_line_num, format!("unknown mnemonic \"{}\"", mnemonic));
                return;
            }
        };
        if let Some(md) = desc.get_mode_detail(Implied) {
            bytes.push(md.op);
            return;
        }
        if let Some(md) = desc.get_mode_detail(Relative) {
            // displacement is relative to the instruction that follows the branch
            let target = self.eval_or_zero(st, src_line_num, rest.first().copied().unwrap_or(""));
            let mut disp = (target as i32) - (st.addr as i32 + 2);
            if disp < 0 {
                disp += 65536;
            }
            bytes.push(md.op);
            bytes.push(disp as u8);
            return;
        }
        let operand = rest.first().copied().unwrap_or("");
        match self.parser.parse_operand(operand, desc, &st.labels) {
            Ok(od) => {
                if let Some(md) = desc.get_mode_detail(od.mode) {
                    bytes.push(md.op);
                    bytes.extend_from_slice(&od.bytes);
                } else {
                    st.diag(
                        src_line_num,
                        format!("{} does not support {:?} addressing [ {} ]", name, od.mode, operand),
                    );
                }
            }
            Err(e) => st.diag(src_line_num, e.msg),
        }
    }

    /// Evaluate an expression, degrading a malformed one to a diagnostic
    /// plus the value 0 so that assembly can continue.
    fn eval_or_zero(&self, st: &mut PassState, src_line_num: usize, expr: &str) -> u16 {
        match self.parser.eval_expr(expr, &st.labels) {
            Ok(val) => val,
            Err(e) => {
                st.diag(src_line_num, e.msg);
                0
            }
        }
    }
}
