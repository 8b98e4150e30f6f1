//! Expression evaluation and operand classification for the assembler.
//!
//! Expressions are flat: operators are applied strictly left to right with
//! no precedence and no parentheses. Operands are hex (`$`), binary (`%`),
//! decimal, or label references. A label that cannot be resolved yet
//! evaluates to the sentinel 0xFFFF so that pass 1 can size instructions
//! before all forward references are known.
use super::instructions::{AddressingMode, Descriptor};
use super::test::{AddrOrVal, RegOrAddr, TestCriterion};
use super::*;

use regex::Regex;

/// Value of an unresolved label reference. Pass 1 emits operands of this
/// size/shape; pass 2 re-evaluates with the full label table.
pub const UNRESOLVED: u16 = 0xffff;

/// Seam between expression evaluation and whoever owns the label table.
pub trait LabelResolver {
    fn resolve(&self, label: &str) -> Option<u16>;
}
impl LabelResolver for HashMap<String, u16> {
    fn resolve(&self, label: &str) -> Option<u16> { self.get(label).copied() }
}

/// The result of classifying an instruction operand: the addressing mode
/// plus the operand bytes to emit after the opcode (little-endian for
/// 2-byte values).
#[derive(Debug, PartialEq, Eq)]
pub struct OperandDescriptor {
    pub mode: AddressingMode,
    pub bytes: Vec<u8>,
}
impl OperandDescriptor {
    fn new(mode: AddressingMode, bytes: Vec<u8>) -> Self { OperandDescriptor { mode, bytes } }
}

/// The container for our expression/operand parsing methods.
pub struct Parser {
    re_operators: Regex, // matches any of the flat expression operators
}

impl Parser {
    pub fn new() -> Parser {
        Parser {
            re_operators: Regex::new(r"[+\-*/&|^<>]").unwrap(),
        }
    }

    /// Evaluate a flat expression, folding left to right and masking the
    /// running total to 16 bits after every step.
    ///
    /// Operators: `+ - * / & | ^ < >`. `-` wraps negative results by
    /// +65536. `<`/`>` add the low/high byte of their operand. An
    /// expression beginning with `^` yields the one's complement of its
    /// operand (the empty leading chunk evaluates to 0xFFFF and the XOR
    /// folds against it).
    ///
    /// Malformed input (bad digits, division by zero, length mismatch)
    /// is an `Err`, never a silent zero; callers decide how to degrade.
    pub fn eval_expr(&self, expr: &str, labels: &dyn LabelResolver) -> Result<u16, Error> {
        let chunks: Vec<&str> = self.re_operators.split(expr).collect();
        let chunk_len: usize = chunks.iter().map(|c| c.len()).sum::<usize>() + (chunks.len() - 1);
        if chunk_len != expr.len() {
            return Err(syntax_err!(format!("malformed expression \"{}\"", expr)));
        }
        // now get the operators
        let bytes = expr.as_bytes();
        let mut line_index = 0usize;
        let mut operators_used = Vec::with_capacity(chunks.len());
        for chunk in chunks.iter().take(chunks.len() - 1) {
            line_index += chunk.len();
            operators_used.push(bytes[line_index]);
            line_index += 1;
        }
        let mut total: i64 = 0;
        let mut operator: Option<u8> = None;
        for (i, chunk) in chunks.iter().enumerate() {
            let acc = self.parse_num(chunk, labels)? as i64;
            match operator {
                None | Some(b'+') => total += acc,
                Some(b'-') => {
                    total -= acc;
                    if total < 0 {
                        total += 65536;
                    }
                }
                Some(b'*') => total *= acc,
                Some(b'<') => total += acc & 0xff,
                Some(b'>') => total += (acc >> 8) & 0xff,
                Some(b'/') => {
                    if acc == 0 {
                        return Err(syntax_err!(format!("division by zero in \"{}\"", expr)));
                    }
                    total /= acc;
                }
                Some(b'&') => total &= acc,
                Some(b'|') => total |= acc,
                Some(b'^') => total ^= acc,
                Some(op) => return Err(syntax_err!(format!("invalid operator '{}'", op as char))),
            }
            total &= 0xffff;
            operator = operators_used.get(i).copied();
        }
        Ok(total as u16)
    }

    /// Parse a single operand chunk: `$` hex, `%` binary, all-digits
    /// decimal, anything else is a label lookup (missing -> UNRESOLVED).
    fn parse_num(&self, chunk: &str, labels: &dyn LabelResolver) -> Result<u16, Error> {
        if let Some(hex) = chunk.strip_prefix('$') {
            return u16::from_str_radix(hex, 16)
                .map_err(|_| syntax_err!(format!("invalid hex value \"{}\"", chunk)));
        }
        if let Some(bin) = chunk.strip_prefix('%') {
            return u16::from_str_radix(bin, 2)
                .map_err(|_| syntax_err!(format!("invalid binary value \"{}\"", chunk)));
        }
        if !chunk.is_empty() && chunk.bytes().all(|b| b.is_ascii_digit()) {
            return chunk
                .parse::<u16>()
                .map_err(|_| syntax_err!(format!("decimal value out of range \"{}\"", chunk)));
        }
        Ok(labels.resolve(chunk).unwrap_or(UNRESOLVED))
    }

    /// Classify a trimmed operand string into exactly one addressing mode,
    /// given the set of modes the opcode supports. Zero-page forms are
    /// chosen only when the value fits in a byte AND the opcode has a
    /// zero-page encoding; otherwise the absolute form is used.
    pub fn parse_operand(
        &self, operand: &str, desc: &'static Descriptor, labels: &dyn LabelResolver,
    ) -> Result<OperandDescriptor, Error> {
        use AddressingMode::*;
        let operand = operand.replace(' ', "");
        if operand.is_empty() || operand.eq_ignore_ascii_case("A") {
            return Ok(OperandDescriptor::new(Accumulator, Vec::new()));
        }
        if let Some(expr) = operand.strip_prefix('#') {
            let val = self.eval_expr(expr, labels)?;
            return Ok(OperandDescriptor::new(Immediate, vec![val as u8]));
        }
        if operand.starts_with('(') {
            let upper = operand.to_ascii_uppercase();
            if upper.ends_with("),Y") {
                let val = self.eval_expr(&operand[1..operand.len() - 3], labels)?;
                return Ok(OperandDescriptor::new(IndirectY, vec![val as u8]));
            }
            if upper.ends_with(",X)") {
                let val = self.eval_expr(&operand[1..operand.len() - 3], labels)?;
                return Ok(OperandDescriptor::new(IndirectX, vec![val as u8]));
            }
            if operand.ends_with(')') {
                let val = self.eval_expr(&operand[1..operand.len() - 1], labels)?;
                return Ok(OperandDescriptor::new(Indirect, vec![val as u8, (val >> 8) as u8]));
            }
        }
        let upper = operand.to_ascii_uppercase();
        if upper.ends_with(",X") {
            let val = self.eval_expr(&operand[..operand.len() - 2], labels)?;
            return Ok(if val > 0xff || desc.get_mode_detail(ZeroPageX).is_none() {
                OperandDescriptor::new(AbsoluteX, vec![val as u8, (val >> 8) as u8])
            } else {
                OperandDescriptor::new(ZeroPageX, vec![val as u8])
            });
        }
        if upper.ends_with(",Y") {
            let val = self.eval_expr(&operand[..operand.len() - 2], labels)?;
            return Ok(if val > 0xff || desc.get_mode_detail(ZeroPageY).is_none() {
                OperandDescriptor::new(AbsoluteY, vec![val as u8, (val >> 8) as u8])
            } else {
                OperandDescriptor::new(ZeroPageY, vec![val as u8])
            });
        }
        let val = self.eval_expr(&operand, labels)?;
        Ok(if val > 0xff || desc.get_mode_detail(ZeroPage).is_none() {
            OperandDescriptor::new(Absolute, vec![val as u8, (val >> 8) as u8])
        } else {
            OperandDescriptor::new(ZeroPage, vec![val as u8])
        })
    }

    /// Resolve the two sides of a `;! lhs = rhs` test criterion once the
    /// final label table is known. The LHS is a register name or an
    /// address expression; the RHS is a `#`-prefixed constant or an
    /// address expression.
    pub fn parse_test_criterion(&self, tc: &mut TestCriterion, labels: &dyn LabelResolver) -> Result<(), Error> {
        let reg = registers::Name::from_str(&tc.lhs_src);
        tc.lhs = Some(if reg != registers::Name::None {
            RegOrAddr::Reg(reg)
        } else {
            RegOrAddr::Addr(self.eval_expr(&tc.lhs_src, labels)?)
        });
        tc.rhs = Some(if let Some(expr) = tc.rhs_src.strip_prefix('#') {
            AddrOrVal::Val(self.eval_expr(expr, labels)?)
        } else {
            AddrOrVal::Addr(self.eval_expr(&tc.rhs_src, labels)?)
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> HashMap<String, u16> {
        let mut map = HashMap::new();
        map.insert("START".to_string(), 0x8000);
        map.insert("data".to_string(), 0x0042);
        map
    }

    #[test]
    fn hex_binary_decimal_operands() -> Result<(), Error> {
        let p = Parser::new();
        let l = labels();
        assert_eq!(p.eval_expr("$10+$05", &l)?, 0x15);
        assert_eq!(p.eval_expr("%1010", &l)?, 10);
        assert_eq!(p.eval_expr("255", &l)?, 255);
        assert_eq!(p.eval_expr("START", &l)?, 0x8000);
        assert_eq!(p.eval_expr("data", &l)?, 0x42);
        Ok(())
    }

    #[test]
    fn left_to_right_fold_without_precedence() -> Result<(), Error> {
        let p = Parser::new();
        let l = labels();
        // (1+2)*3, not 1+(2*3)
        assert_eq!(p.eval_expr("1+2*3", &l)?, 9);
        assert_eq!(p.eval_expr("START-1", &l)?, 0x7fff);
        assert_eq!(p.eval_expr("2-5", &l)?, 0xfffd);
        assert_eq!(p.eval_expr("$f0f0&$0ff0", &l)?, 0x00f0);
        assert_eq!(p.eval_expr("$0f00|$00f0", &l)?, 0x0ff0);
        assert_eq!(p.eval_expr("$ff^$0f", &l)?, 0xf0);
        assert_eq!(p.eval_expr("$1000/$10", &l)?, 0x0100);
        Ok(())
    }

    #[test]
    fn angle_operators_extract_bytes() -> Result<(), Error> {
        let p = Parser::new();
        let l = labels();
        // '<' and '>' add the low/high byte of the operand; they are not
        // numeric comparisons
        assert_eq!(p.eval_expr("5<10", &l)?, 15);
        assert_eq!(p.eval_expr("5>$1234", &l)?, 0x17);
        assert_eq!(p.eval_expr("0<START", &l)?, 0x00);
        assert_eq!(p.eval_expr("0>START", &l)?, 0x80);
        Ok(())
    }

    #[test]
    fn leading_caret_is_ones_complement() -> Result<(), Error> {
        let p = Parser::new();
        let l = labels();
        assert_eq!(p.eval_expr("^$0f", &l)?, 0xfff0);
        assert_eq!(p.eval_expr("^0", &l)?, 0xffff);
        Ok(())
    }

    #[test]
    fn unresolved_label_yields_sentinel() -> Result<(), Error> {
        let p = Parser::new();
        let l = labels();
        assert_eq!(p.eval_expr("NOSUCH", &l)?, UNRESOLVED);
        Ok(())
    }

    #[test]
    fn malformed_expressions_are_errors() {
        let p = Parser::new();
        let l = labels();
        assert!(p.eval_expr("$zz", &l).is_err());
        assert!(p.eval_expr("%123", &l).is_err());
        assert!(p.eval_expr("8/0", &l).is_err());
        assert!(p.eval_expr("70000", &l).is_err());
    }

    #[test]
    fn operand_shapes_classify_to_modes() -> Result<(), Error> {
        use AddressingMode::*;
        instructions::init();
        let p = Parser::new();
        let l = labels();
        let lda = instructions::name_to_descriptor("LDA").unwrap();
        let ldx = instructions::name_to_descriptor("LDX").unwrap();
        let jmp = instructions::name_to_descriptor("JMP").unwrap();

        assert_eq!(p.parse_operand("#$05", lda, &l)?.mode, Immediate);
        assert_eq!(p.parse_operand("$10", lda, &l)?.mode, ZeroPage);
        assert_eq!(p.parse_operand("$10,X", lda, &l)?.mode, ZeroPageX);
        assert_eq!(p.parse_operand("$10,Y", ldx, &l)?.mode, ZeroPageY);
        assert_eq!(p.parse_operand("$1234", lda, &l)?.mode, Absolute);
        assert_eq!(p.parse_operand("$1234,X", lda, &l)?.mode, AbsoluteX);
        assert_eq!(p.parse_operand("$1234,Y", lda, &l)?.mode, AbsoluteY);
        assert_eq!(p.parse_operand("($10,X)", lda, &l)?.mode, IndirectX);
        assert_eq!(p.parse_operand("($10),Y", lda, &l)?.mode, IndirectY);
        assert_eq!(p.parse_operand("($1234)", jmp, &l)?.mode, Indirect);
        assert_eq!(p.parse_operand("", lda, &l)?.mode, Accumulator);
        assert_eq!(p.parse_operand("a", lda, &l)?.mode, Accumulator);
        // zero-page-sized value falls back to absolute when the opcode has
        // no zero-page,Y encoding
        assert_eq!(p.parse_operand("$10,Y", lda, &l)?.mode, AbsoluteY);
        Ok(())
    }

    #[test]
    fn two_byte_operands_are_little_endian() -> Result<(), Error> {
        instructions::init();
        let p = Parser::new();
        let l = labels();
        let lda = instructions::name_to_descriptor("LDA").unwrap();
        let od = p.parse_operand("$1234", lda, &l)?;
        assert_eq!(od.bytes, vec![0x34, 0x12]);
        Ok(())
    }
}
