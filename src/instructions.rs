use super::*;
use registers::SRBit;
use std::{fmt::Debug, sync::Once};

pub static mut FLAVOR_TABLE: [Option<Flavor>; 256] = [None; 256];
pub static mut DESC_BY_NAME: Option<HashMap<&'static str, &'static Descriptor>> = None;
static INIT: Once = Once::new();

pub fn opcode_to_flavor(op: u8) -> Option<&'static Flavor> {
    // SAFETY: FLAVOR_TABLE is a static mut that is initialized once by init()
    unsafe { FLAVOR_TABLE[op as usize].as_ref() }
}
pub fn name_to_descriptor(name: &str) -> Option<&'static Descriptor> {
    // SAFETY: DESC_BY_NAME is a static mut that is initialized once by init()
    unsafe { DESC_BY_NAME.as_ref()?.get(name).copied() }
}
/// Initialize static lookup tables. The byte-keyed FLAVOR_TABLE is derived
/// mechanically from DESCRIPTORS here; it is never authored separately, so
/// the assembler and the runtime always agree on every encoding.
pub fn init() {
    INIT.call_once(|| {
        let mut dbn = HashMap::new();
        for desc in DESCRIPTORS {
            dbn.insert(desc.name, desc);
            for detail in desc.md {
                // SAFETY: FLAVOR_TABLE is a static mut that is initialized once by init()
                unsafe {
                    FLAVOR_TABLE[detail.op as usize] = Some(Flavor {
                        desc,
                        mode: AddressingMode::from(detail.am),
                        detail,
                    })
                }
            }
        }
        // SAFETY: DESC_BY_NAME is a static mut that is initialized once by init()
        unsafe { DESC_BY_NAME = Some(dbn) }
    });
}

/// All the supported addressing modes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AddressingMode {
    Immediate = 0,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    IndirectX,
    IndirectY,
    Indirect,
    Implied,
    Accumulator,
    Relative,
}
impl From<usize> for AddressingMode {
    fn from(am: usize) -> AddressingMode {
        match am {
            0 => AddressingMode::Immediate,
            1 => AddressingMode::ZeroPage,
            2 => AddressingMode::ZeroPageX,
            3 => AddressingMode::ZeroPageY,
            4 => AddressingMode::Absolute,
            5 => AddressingMode::AbsoluteX,
            6 => AddressingMode::AbsoluteY,
            7 => AddressingMode::IndirectX,
            8 => AddressingMode::IndirectY,
            9 => AddressingMode::Indirect,
            10 => AddressingMode::Implied,
            11 => AddressingMode::Accumulator,
            12 => AddressingMode::Relative,
            _ => {
                panic!("Invalid AddressingMode")
            }
        }
    }
}

/// Where a handler's result is written back to. Accumulator-mode
/// instructions write to A; everything else with a target writes memory.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Target {
    None,
    Accumulator,
    Mem(u16),
}

/// Tracks a write operation prior to commit.
#[derive(Debug)]
pub struct WriteRecord {
    pub addr: u16,
    pub val: u8,
}
/// Contains all the information about an instruction and the results of executing it
/// in the given context. Instructions are executed virtually first, with their results
/// recorded in the Outcome object. Thereafter, the results of the instruction are
/// committed to the simulator's registers and memory.
#[derive(Debug)]
pub struct Outcome {
    /// the full instance info for this instruction
    pub inst: Instance,
    /// register set as a result of this instruction
    pub new_ctx: registers::Set,
    /// all the memory writes that result from this instruction
    pub writes: Option<Vec<WriteRecord>>,
    /// cycles beyond the base cost (taken branches)
    pub extra_clk: u8,
    /// true if this instruction was a BRK (callers may choose to stop)
    pub brk: bool,
}
impl Outcome {
    pub fn new(inst: Instance, new_ctx: registers::Set) -> Outcome {
        Outcome {
            inst,
            new_ctx,
            writes: None,
            extra_clk: 0,
            brk: false,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        if self.writes.is_none() {
            self.writes = Some(Vec::new());
        }
        self.writes.as_mut().unwrap().push(WriteRecord { addr, val });
    }

    /// Route a result byte to the instruction's target: the accumulator
    /// for Accumulator mode, memory otherwise. Never both.
    pub fn store(&mut self, val: u8) {
        match self.inst.target {
            Target::Accumulator => self.new_ctx.a = val,
            Target::Mem(addr) => self.write(addr, val),
            Target::None => {}
        }
    }
}

/// Information about a specific instance of an instruction in the context of a
/// running program: the registers before execution, the decoded source value and
/// target, and the instruction Flavor itself.
#[derive(Debug)]
pub struct Instance {
    /// Context before this instruction executes (ctx.pc points to this instruction)
    pub ctx: registers::Set,
    /// the Flavor of this instruction
    pub flavor: &'static Flavor,
    /// decoded source value (operand byte, register, memory contents or branch target)
    pub src: u16,
    /// decoded target for writes
    pub target: Target,
    /// the raw operand bytes as a 16-bit value
    pub raw: u16,
    /// The human readable operand
    pub operand: Option<String>,
}
impl Instance {
    pub fn new(context: &registers::Set, flavor: &'static Flavor) -> Instance {
        Instance {
            ctx: *context,
            flavor,
            src: 0,
            target: Target::None,
            raw: 0,
            operand: None,
        }
    }
}
/// Properties of an instruction that vary depending on addressing mode.
#[derive(Debug)]
pub struct ModeDetail {
    /// op code
    pub op: u8,
    /// clock cycle cost
    pub clk: u8,
    /// total size of instruction in bytes
    pub sz: u16,
    /// AddressingMode in number form
    pub am: usize,
    /// documented "+1 cycle on page cross"; annotated only, not applied
    pub xc: bool,
}
impl ModeDetail {
    pub fn addressing_mode(&self) -> AddressingMode { AddressingMode::from(self.am) }
}
type M = ModeDetail;

/// 6502 instructions are executed by the simulator via evaluation functions
/// that have this signature.
type EvalFn = fn(&Core, &mut Outcome);

/// Information about all the instruction variations that share a mnemonic.
/// Each supported addressing mode has an associated ModeDetail; a
/// (Descriptor, ModeDetail) pair is called a Flavor.
pub struct Descriptor {
    /// the instruction mnemonic
    pub name: &'static str,
    /// the evaluation function for this instruction
    pub eval: EvalFn,
    /// details for all the addressing modes supported for this instruction
    pub md: &'static [ModeDetail],
}
// Can't use default impl of Debug because it doesn't know what to do with EvalFn.
impl Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("name", &self.name)
            .field("md", &self.md)
            .finish()
    }
}
impl Descriptor {
    pub fn get_mode_detail(&self, am: AddressingMode) -> Option<&'static ModeDetail> {
        self.md.iter().find(|&m| m.addressing_mode() == am)
    }
}
/// Represents a fully specified instruction, one that maps to a specific op code.
#[derive(Clone, Copy, Debug)]
pub struct Flavor {
    /// the Descriptor for this instruction
    pub desc: &'static Descriptor,
    /// the addressing mode for this instruction
    pub mode: AddressingMode,
    /// the ModeDetail for this instruction
    pub detail: &'static ModeDetail,
}

impl std::fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:width$}",
            format!(
                "{:>2X} {}, {:?}, ({})",
                self.detail.op, self.desc.name, self.mode, self.detail.sz
            ),
            width = f.width().unwrap_or(0)
        )
    }
}

//
// instruction implementations and helpers
//
fn __nop(_: &Core, _: &mut Outcome) {
    // do nothing
}
fn __push(o: &mut Outcome, val: u8) {
    let addr = 0x0100 + o.new_ctx.sp as u16;
    o.write(addr, val);
    o.new_ctx.sp = o.new_ctx.sp.wrapping_sub(1);
}
fn __pull(c: &Core, o: &mut Outcome) -> u8 {
    o.new_ctx.sp = o.new_ctx.sp.wrapping_add(1);
    c.load_u8(0x0100 + o.new_ctx.sp as u16)
}
/// Branch helper: branch targets are pre-computed into inst.src. A taken
/// branch costs one extra cycle, two if it crosses a 256-byte page
/// (detected by comparing the high bytes of the old and new PC).
fn __branch(o: &mut Outcome, taken: bool) {
    if taken {
        let target = o.inst.src;
        o.extra_clk += if (o.new_ctx.pc & 0xff00) != (target & 0xff00) { 2 } else { 1 };
        o.new_ctx.pc = target;
    }
}
fn __bcc(_: &Core, o: &mut Outcome) { __branch(o, !o.new_ctx.sr.is_set(SRBit::C)) }
fn __bcs(_: &Core, o: &mut Outcome) { __branch(o, o.new_ctx.sr.is_set(SRBit::C)) }
fn __beq(_: &Core, o: &mut Outcome) { __branch(o, o.new_ctx.sr.is_set(SRBit::Z)) }
fn __bne(_: &Core, o: &mut Outcome) { __branch(o, !o.new_ctx.sr.is_set(SRBit::Z)) }
fn __bmi(_: &Core, o: &mut Outcome) { __branch(o, o.new_ctx.sr.is_set(SRBit::N)) }
fn __bpl(_: &Core, o: &mut Outcome) { __branch(o, !o.new_ctx.sr.is_set(SRBit::N)) }
fn __bvc(_: &Core, o: &mut Outcome) { __branch(o, !o.new_ctx.sr.is_set(SRBit::V)) }
fn __bvs(_: &Core, o: &mut Outcome) { __branch(o, o.new_ctx.sr.is_set(SRBit::V)) }

/// Add with carry. When the decimal flag is set, BCD nibble correction is
/// applied after the zero flag but interleaved with sign/overflow/carry
/// exactly the way the NMOS part does it; Z is not valid in decimal mode.
fn __adc(_: &Core, o: &mut Outcome) {
    let src = o.inst.src as u32;
    let a = o.new_ctx.a as u32;
    let carry_in = u32::from(o.new_ctx.sr.is_set(SRBit::C));
    let mut temp = src + a + carry_in;
    o.new_ctx.sr.set(SRBit::Z, temp & 0xff == 0);
    if o.new_ctx.sr.is_set(SRBit::D) {
        if (a & 0xf) + (src & 0xf) + carry_in > 9 {
            temp += 6;
        }
        o.new_ctx.sr.set(SRBit::N, temp & 0x80 != 0);
        o.new_ctx
            .sr
            .set(SRBit::V, (a ^ src) & 0x80 == 0 && (a ^ temp) & 0x80 != 0);
        if temp > 0x99 {
            temp += 96;
        }
        o.new_ctx.sr.set(SRBit::C, temp > 0x99);
    } else {
        o.new_ctx.sr.set(SRBit::N, temp & 0x80 != 0);
        o.new_ctx
            .sr
            .set(SRBit::V, (a ^ src) & 0x80 == 0 && (a ^ temp) & 0x80 != 0);
        o.new_ctx.sr.set(SRBit::C, temp > 0xff);
    }
    o.new_ctx.a = (temp & 0xff) as u8;
}
/// Subtract with borrow. Carry and overflow come from the un-adjusted
/// binary result; decimal correction happens afterwards. N and Z are not
/// valid in decimal mode.
fn __sbc(_: &Core, o: &mut Outcome) {
    let src = o.inst.src as i32;
    let a = o.new_ctx.a as i32;
    let borrow = i32::from(!o.new_ctx.sr.is_set(SRBit::C));
    let mut temp = a - src - borrow;
    o.new_ctx.sr.set(SRBit::N, temp & 0x80 != 0);
    o.new_ctx.sr.set(SRBit::Z, temp & 0xff == 0);
    o.new_ctx
        .sr
        .set(SRBit::V, (a ^ temp) & 0x80 != 0 && (a ^ src) & 0x80 != 0);
    if o.new_ctx.sr.is_set(SRBit::D) {
        if (a & 0xf) - borrow < (src & 0xf) {
            temp -= 6;
        }
        if temp > 0x99 {
            temp -= 0x60;
        }
    }
    o.new_ctx.sr.set(SRBit::C, (temp as u32) < 0x100);
    o.new_ctx.a = (temp & 0xff) as u8;
}
/// Compare helper: unsigned subtraction without masking first; carry means
/// "no borrow" (difference below 0x100), then Z/N from the low byte.
fn __compare(o: &mut Outcome, reg: u8) {
    let diff = (reg as u32).wrapping_sub(o.inst.src as u32);
    o.new_ctx.sr.set(SRBit::C, diff < 0x100);
    o.new_ctx.sr.set(SRBit::N, diff & 0x80 != 0);
    o.new_ctx.sr.set(SRBit::Z, diff & 0xff == 0);
}
fn __cmp(_: &Core, o: &mut Outcome) {
    let a = o.new_ctx.a;
    __compare(o, a)
}
fn __cpx(_: &Core, o: &mut Outcome) {
    let x = o.new_ctx.x;
    __compare(o, x)
}
fn __cpy(_: &Core, o: &mut Outcome) {
    let y = o.new_ctx.y;
    __compare(o, y)
}
fn __and(_: &Core, o: &mut Outcome) {
    let res = o.inst.src as u8 & o.new_ctx.a;
    o.new_ctx.sr.set_nz(res);
    o.new_ctx.a = res;
}
fn __ora(_: &Core, o: &mut Outcome) {
    let res = o.inst.src as u8 | o.new_ctx.a;
    o.new_ctx.sr.set_nz(res);
    o.new_ctx.a = res;
}
fn __eor(_: &Core, o: &mut Outcome) {
    let res = o.inst.src as u8 ^ o.new_ctx.a;
    o.new_ctx.sr.set_nz(res);
    o.new_ctx.a = res;
}
fn __bit(_: &Core, o: &mut Outcome) {
    let src = o.inst.src as u8;
    o.new_ctx.sr.set(SRBit::N, src & 0x80 != 0);
    o.new_ctx.sr.set(SRBit::V, src & 0x40 != 0); /* copy bit 6 to the overflow flag */
    o.new_ctx.sr.set(SRBit::Z, src & o.new_ctx.a == 0);
}
fn __asl(_: &Core, o: &mut Outcome) {
    let src = o.inst.src as u8;
    o.new_ctx.sr.set(SRBit::C, src & 0x80 != 0);
    let res = src << 1;
    o.new_ctx.sr.set_nz(res);
    o.store(res);
}
fn __lsr(_: &Core, o: &mut Outcome) {
    let src = o.inst.src as u8;
    o.new_ctx.sr.set(SRBit::C, src & 0x01 != 0);
    let res = src >> 1;
    o.new_ctx.sr.set_nz(res);
    o.store(res);
}
fn __rol(_: &Core, o: &mut Outcome) {
    let mut res = (o.inst.src as u16) << 1;
    if o.new_ctx.sr.is_set(SRBit::C) {
        res |= 0x1;
    }
    o.new_ctx.sr.set(SRBit::C, res > 0xff);
    o.new_ctx.sr.set_nz(res as u8);
    o.store(res as u8);
}
fn __ror(_: &Core, o: &mut Outcome) {
    let mut src = o.inst.src as u16;
    if o.new_ctx.sr.is_set(SRBit::C) {
        src |= 0x100;
    }
    o.new_ctx.sr.set(SRBit::C, src & 0x01 != 0);
    let res = (src >> 1) as u8;
    o.new_ctx.sr.set_nz(res);
    o.store(res);
}
fn __inc(_: &Core, o: &mut Outcome) {
    let res = (o.inst.src as u8).wrapping_add(1);
    o.new_ctx.sr.set_nz(res);
    o.store(res);
}
fn __dec(_: &Core, o: &mut Outcome) {
    let res = (o.inst.src as u8).wrapping_sub(1);
    o.new_ctx.sr.set_nz(res);
    o.store(res);
}
fn __inx(_: &Core, o: &mut Outcome) {
    o.new_ctx.x = o.new_ctx.x.wrapping_add(1);
    let x = o.new_ctx.x;
    o.new_ctx.sr.set_nz(x);
}
fn __iny(_: &Core, o: &mut Outcome) {
    o.new_ctx.y = o.new_ctx.y.wrapping_add(1);
    let y = o.new_ctx.y;
    o.new_ctx.sr.set_nz(y);
}
fn __dex(_: &Core, o: &mut Outcome) {
    o.new_ctx.x = o.new_ctx.x.wrapping_sub(1);
    let x = o.new_ctx.x;
    o.new_ctx.sr.set_nz(x);
}
fn __dey(_: &Core, o: &mut Outcome) {
    o.new_ctx.y = o.new_ctx.y.wrapping_sub(1);
    let y = o.new_ctx.y;
    o.new_ctx.sr.set_nz(y);
}
fn __lda(_: &Core, o: &mut Outcome) {
    let src = o.inst.src as u8;
    o.new_ctx.sr.set_nz(src);
    o.new_ctx.a = src;
}
fn __ldx(_: &Core, o: &mut Outcome) {
    let src = o.inst.src as u8;
    o.new_ctx.sr.set_nz(src);
    o.new_ctx.x = src;
}
fn __ldy(_: &Core, o: &mut Outcome) {
    let src = o.inst.src as u8;
    o.new_ctx.sr.set_nz(src);
    o.new_ctx.y = src;
}
fn __sta(_: &Core, o: &mut Outcome) {
    let a = o.new_ctx.a;
    o.store(a);
}
fn __stx(_: &Core, o: &mut Outcome) {
    let x = o.new_ctx.x;
    o.store(x);
}
fn __sty(_: &Core, o: &mut Outcome) {
    let y = o.new_ctx.y;
    o.store(y);
}
fn __tax(_: &Core, o: &mut Outcome) {
    let a = o.new_ctx.a;
    o.new_ctx.sr.set_nz(a);
    o.new_ctx.x = a;
}
fn __tay(_: &Core, o: &mut Outcome) {
    let a = o.new_ctx.a;
    o.new_ctx.sr.set_nz(a);
    o.new_ctx.y = a;
}
fn __tsx(_: &Core, o: &mut Outcome) {
    let sp = o.new_ctx.sp;
    o.new_ctx.sr.set_nz(sp);
    o.new_ctx.x = sp;
}
fn __txa(_: &Core, o: &mut Outcome) {
    let x = o.new_ctx.x;
    o.new_ctx.sr.set_nz(x);
    o.new_ctx.a = x;
}
fn __txs(_: &Core, o: &mut Outcome) {
    // TXS is the one transfer that leaves the flags alone
    o.new_ctx.sp = o.new_ctx.x;
}
fn __tya(_: &Core, o: &mut Outcome) {
    let y = o.new_ctx.y;
    o.new_ctx.sr.set_nz(y);
    o.new_ctx.a = y;
}
fn __clc(_: &Core, o: &mut Outcome) { o.new_ctx.sr.set(SRBit::C, false) }
fn __sec(_: &Core, o: &mut Outcome) { o.new_ctx.sr.set(SRBit::C, true) }
fn __cli(_: &Core, o: &mut Outcome) { o.new_ctx.sr.set(SRBit::I, false) }
fn __sei(_: &Core, o: &mut Outcome) { o.new_ctx.sr.set(SRBit::I, true) }
fn __clv(_: &Core, o: &mut Outcome) { o.new_ctx.sr.set(SRBit::V, false) }
fn __cld(_: &Core, o: &mut Outcome) { o.new_ctx.sr.set(SRBit::D, false) }
fn __sed(_: &Core, o: &mut Outcome) { o.new_ctx.sr.set(SRBit::D, true) }
fn __pha(_: &Core, o: &mut Outcome) {
    let a = o.new_ctx.a;
    __push(o, a);
}
fn __php(_: &Core, o: &mut Outcome) {
    let sr = o.new_ctx.sr.get_as_byte();
    __push(o, sr);
}
fn __pla(c: &Core, o: &mut Outcome) {
    let val = __pull(c, o);
    o.new_ctx.a = val;
    o.new_ctx.sr.set_nz(val);
}
fn __plp(c: &Core, o: &mut Outcome) {
    let val = __pull(c, o);
    o.new_ctx.sr.set_from_byte(val);
}
fn __jmp(_: &Core, o: &mut Outcome) {
    if let Target::Mem(addr) = o.inst.target {
        o.new_ctx.pc = addr;
    }
}
/// JSR pushes the address of its own last byte (PC already points past the
/// instruction, so minus one); RTS compensates by adding one.
fn __jsr(_: &Core, o: &mut Outcome) {
    let ret = o.new_ctx.pc.wrapping_sub(1);
    __push(o, (ret >> 8) as u8);
    __push(o, ret as u8);
    if let Target::Mem(addr) = o.inst.target {
        o.new_ctx.pc = addr;
    }
}
fn __rts(c: &Core, o: &mut Outcome) {
    let lo = __pull(c, o) as u16;
    let hi = __pull(c, o) as u16;
    o.new_ctx.pc = ((hi << 8) | lo).wrapping_add(1);
}
/// BRK leaves a two-byte footprint: the pushed return address skips the
/// byte after the opcode. The break flag is set before SR is pushed, then
/// interrupts are disabled and PC is loaded from the IRQ vector.
fn __brk(c: &Core, o: &mut Outcome) {
    let ret = o.new_ctx.pc.wrapping_add(1);
    __push(o, (ret >> 8) as u8);
    __push(o, ret as u8);
    o.new_ctx.sr.set(SRBit::B, true);
    let sr = o.new_ctx.sr.get_as_byte();
    __push(o, sr);
    o.new_ctx.sr.set(SRBit::I, true);
    o.new_ctx.pc = c.load_u16(0xfffe);
    o.brk = true;
}
fn __rti(c: &Core, o: &mut Outcome) {
    let sr = __pull(c, o);
    o.new_ctx.sr.set_from_byte(sr);
    let lo = __pull(c, o) as u16;
    let hi = __pull(c, o) as u16;
    o.new_ctx.pc = (hi << 8) | lo;
}

//
// instruction table
//
#[rustfmt::skip]
pub const DESCRIPTORS: &[Descriptor] = &[
 Descriptor{name:"ADC", eval:__adc, md:&[M{op:0x69,clk:2,sz:2,am:0,xc:false},M{op:0x65,clk:3,sz:2,am:1,xc:false},M{op:0x75,clk:4,sz:2,am:2,xc:false},M{op:0x6D,clk:4,sz:3,am:4,xc:false},M{op:0x7D,clk:4,sz:3,am:5,xc:true},M{op:0x79,clk:4,sz:3,am:6,xc:true},M{op:0x61,clk:6,sz:2,am:7,xc:false},M{op:0x71,clk:5,sz:2,am:8,xc:true},]},
 Descriptor{name:"AND", eval:__and, md:&[M{op:0x29,clk:2,sz:2,am:0,xc:false},M{op:0x25,clk:3,sz:2,am:1,xc:false},M{op:0x35,clk:4,sz:2,am:2,xc:false},M{op:0x2D,clk:4,sz:3,am:4,xc:false},M{op:0x3D,clk:4,sz:3,am:5,xc:true},M{op:0x39,clk:4,sz:3,am:6,xc:true},M{op:0x21,clk:6,sz:2,am:7,xc:false},M{op:0x31,clk:5,sz:2,am:8,xc:true},]},
 Descriptor{name:"ASL", eval:__asl, md:&[M{op:0x0A,clk:2,sz:1,am:11,xc:false},M{op:0x06,clk:5,sz:2,am:1,xc:false},M{op:0x16,clk:6,sz:2,am:2,xc:false},M{op:0x0E,clk:6,sz:3,am:4,xc:false},M{op:0x1E,clk:7,sz:3,am:5,xc:false},]},
 Descriptor{name:"BCC", eval:__bcc, md:&[M{op:0x90,clk:2,sz:2,am:12,xc:false},]},
 Descriptor{name:"BCS", eval:__bcs, md:&[M{op:0xB0,clk:2,sz:2,am:12,xc:false},]},
 Descriptor{name:"BEQ", eval:__beq, md:&[M{op:0xF0,clk:2,sz:2,am:12,xc:false},]},
 Descriptor{name:"BIT", eval:__bit, md:&[M{op:0x24,clk:3,sz:2,am:1,xc:false},M{op:0x2C,clk:4,sz:3,am:4,xc:false},]},
 Descriptor{name:"BMI", eval:__bmi, md:&[M{op:0x30,clk:2,sz:2,am:12,xc:false},]},
 Descriptor{name:"BNE", eval:__bne, md:&[M{op:0xD0,clk:2,sz:2,am:12,xc:false},]},
 Descriptor{name:"BPL", eval:__bpl, md:&[M{op:0x10,clk:2,sz:2,am:12,xc:false},]},
 Descriptor{name:"BRK", eval:__brk, md:&[M{op:0x00,clk:7,sz:1,am:10,xc:false},]},
 Descriptor{name:"BVC", eval:__bvc, md:&[M{op:0x50,clk:2,sz:2,am:12,xc:false},]},
 Descriptor{name:"BVS", eval:__bvs, md:&[M{op:0x70,clk:2,sz:2,am:12,xc:false},]},
 Descriptor{name:"CLC", eval:__clc, md:&[M{op:0x18,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"CLD", eval:__cld, md:&[M{op:0xD8,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"CLI", eval:__cli, md:&[M{op:0x58,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"CLV", eval:__clv, md:&[M{op:0xB8,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"CMP", eval:__cmp, md:&[M{op:0xC9,clk:2,sz:2,am:0,xc:false},M{op:0xC5,clk:3,sz:2,am:1,xc:false},M{op:0xD5,clk:4,sz:2,am:2,xc:false},M{op:0xCD,clk:4,sz:3,am:4,xc:false},M{op:0xDD,clk:4,sz:3,am:5,xc:true},M{op:0xD9,clk:4,sz:3,am:6,xc:true},M{op:0xC1,clk:6,sz:2,am:7,xc:false},M{op:0xD1,clk:5,sz:2,am:8,xc:true},]},
 Descriptor{name:"CPX", eval:__cpx, md:&[M{op:0xE0,clk:2,sz:2,am:0,xc:false},M{op:0xE4,clk:3,sz:2,am:1,xc:false},M{op:0xEC,clk:4,sz:3,am:4,xc:false},]},
 Descriptor{name:"CPY", eval:__cpy, md:&[M{op:0xC0,clk:2,sz:2,am:0,xc:false},M{op:0xC4,clk:3,sz:2,am:1,xc:false},M{op:0xCC,clk:4,sz:3,am:4,xc:false},]},
 Descriptor{name:"DEC", eval:__dec, md:&[M{op:0xC6,clk:5,sz:2,am:1,xc:false},M{op:0xD6,clk:6,sz:2,am:2,xc:false},M{op:0xCE,clk:6,sz:3,am:4,xc:false},M{op:0xDE,clk:7,sz:3,am:5,xc:false},]},
 Descriptor{name:"DEX", eval:__dex, md:&[M{op:0xCA,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"DEY", eval:__dey, md:&[M{op:0x88,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"EOR", eval:__eor, md:&[M{op:0x49,clk:2,sz:2,am:0,xc:false},M{op:0x45,clk:3,sz:2,am:1,xc:false},M{op:0x55,clk:4,sz:2,am:2,xc:false},M{op:0x4D,clk:4,sz:3,am:4,xc:false},M{op:0x5D,clk:4,sz:3,am:5,xc:true},M{op:0x59,clk:4,sz:3,am:6,xc:true},M{op:0x41,clk:6,sz:2,am:7,xc:false},M{op:0x51,clk:5,sz:2,am:8,xc:true},]},
 Descriptor{name:"INC", eval:__inc, md:&[M{op:0xE6,clk:5,sz:2,am:1,xc:false},M{op:0xF6,clk:6,sz:2,am:2,xc:false},M{op:0xEE,clk:6,sz:3,am:4,xc:false},M{op:0xFE,clk:7,sz:3,am:5,xc:false},]},
 Descriptor{name:"INX", eval:__inx, md:&[M{op:0xE8,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"INY", eval:__iny, md:&[M{op:0xC8,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"JMP", eval:__jmp, md:&[M{op:0x4C,clk:3,sz:3,am:4,xc:false},M{op:0x6C,clk:5,sz:3,am:9,xc:false},]},
 Descriptor{name:"JSR", eval:__jsr, md:&[M{op:0x20,clk:6,sz:3,am:4,xc:false},]},
 Descriptor{name:"LDA", eval:__lda, md:&[M{op:0xA9,clk:2,sz:2,am:0,xc:false},M{op:0xA5,clk:3,sz:2,am:1,xc:false},M{op:0xB5,clk:4,sz:2,am:2,xc:false},M{op:0xAD,clk:4,sz:3,am:4,xc:false},M{op:0xBD,clk:4,sz:3,am:5,xc:true},M{op:0xB9,clk:4,sz:3,am:6,xc:true},M{op:0xA1,clk:6,sz:2,am:7,xc:false},M{op:0xB1,clk:5,sz:2,am:8,xc:true},]},
 Descriptor{name:"LDX", eval:__ldx, md:&[M{op:0xA2,clk:2,sz:2,am:0,xc:false},M{op:0xA6,clk:3,sz:2,am:1,xc:false},M{op:0xB6,clk:4,sz:2,am:3,xc:false},M{op:0xAE,clk:4,sz:3,am:4,xc:false},M{op:0xBE,clk:4,sz:3,am:6,xc:true},]},
 Descriptor{name:"LDY", eval:__ldy, md:&[M{op:0xA0,clk:2,sz:2,am:0,xc:false},M{op:0xA4,clk:3,sz:2,am:1,xc:false},M{op:0xB4,clk:4,sz:2,am:2,xc:false},M{op:0xAC,clk:4,sz:3,am:4,xc:false},M{op:0xBC,clk:4,sz:3,am:5,xc:true},]},
 Descriptor{name:"LSR", eval:__lsr, md:&[M{op:0x4A,clk:2,sz:1,am:11,xc:false},M{op:0x46,clk:5,sz:2,am:1,xc:false},M{op:0x56,clk:6,sz:2,am:2,xc:false},M{op:0x4E,clk:6,sz:3,am:4,xc:false},M{op:0x5E,clk:7,sz:3,am:5,xc:false},]},
 Descriptor{name:"NOP", eval:__nop, md:&[M{op:0xEA,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"ORA", eval:__ora, md:&[M{op:0x09,clk:2,sz:2,am:0,xc:false},M{op:0x05,clk:3,sz:2,am:1,xc:false},M{op:0x15,clk:4,sz:2,am:2,xc:false},M{op:0x0D,clk:4,sz:3,am:4,xc:false},M{op:0x1D,clk:4,sz:3,am:5,xc:true},M{op:0x19,clk:4,sz:3,am:6,xc:true},M{op:0x01,clk:6,sz:2,am:7,xc:false},M{op:0x11,clk:5,sz:2,am:8,xc:true},]},
 Descriptor{name:"PHA", eval:__pha, md:&[M{op:0x48,clk:3,sz:1,am:10,xc:false},]},
 Descriptor{name:"PHP", eval:__php, md:&[M{op:0x08,clk:3,sz:1,am:10,xc:false},]},
 Descriptor{name:"PLA", eval:__pla, md:&[M{op:0x68,clk:4,sz:1,am:10,xc:false},]},
 Descriptor{name:"PLP", eval:__plp, md:&[M{op:0x28,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"ROL", eval:__rol, md:&[M{op:0x2A,clk:2,sz:1,am:11,xc:false},M{op:0x26,clk:5,sz:2,am:1,xc:false},M{op:0x36,clk:6,sz:2,am:2,xc:false},M{op:0x2E,clk:6,sz:3,am:4,xc:false},M{op:0x3E,clk:7,sz:3,am:5,xc:false},]},
 Descriptor{name:"ROR", eval:__ror, md:&[M{op:0x6A,clk:2,sz:1,am:11,xc:false},M{op:0x66,clk:5,sz:2,am:1,xc:false},M{op:0x76,clk:6,sz:2,am:2,xc:false},M{op:0x6E,clk:6,sz:3,am:4,xc:false},M{op:0x7E,clk:7,sz:3,am:5,xc:false},]},
 Descriptor{name:"RTI", eval:__rti, md:&[M{op:0x40,clk:6,sz:1,am:10,xc:false},]},
 Descriptor{name:"RTS", eval:__rts, md:&[M{op:0x60,clk:6,sz:1,am:10,xc:false},]},
 Descriptor{name:"SBC", eval:__sbc, md:&[M{op:0xE9,clk:2,sz:2,am:0,xc:false},M{op:0xE5,clk:3,sz:2,am:1,xc:false},M{op:0xF5,clk:4,sz:2,am:2,xc:false},M{op:0xED,clk:4,sz:3,am:4,xc:false},M{op:0xFD,clk:4,sz:3,am:5,xc:true},M{op:0xF9,clk:4,sz:3,am:6,xc:true},M{op:0xE1,clk:6,sz:2,am:7,xc:false},M{op:0xF1,clk:5,sz:2,am:8,xc:true},]},
 Descriptor{name:"SEC", eval:__sec, md:&[M{op:0x38,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"SED", eval:__sed, md:&[M{op:0xF8,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"SEI", eval:__sei, md:&[M{op:0x78,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"STA", eval:__sta, md:&[M{op:0x85,clk:3,sz:2,am:1,xc:false},M{op:0x95,clk:4,sz:2,am:2,xc:false},M{op:0x8D,clk:4,sz:3,am:4,xc:false},M{op:0x9D,clk:5,sz:3,am:5,xc:false},M{op:0x99,clk:5,sz:3,am:6,xc:false},M{op:0x81,clk:6,sz:2,am:7,xc:false},M{op:0x91,clk:6,sz:2,am:8,xc:false},]},
 Descriptor{name:"STX", eval:__stx, md:&[M{op:0x86,clk:3,sz:2,am:1,xc:false},M{op:0x96,clk:4,sz:2,am:3,xc:false},M{op:0x8E,clk:4,sz:3,am:4,xc:false},]},
 Descriptor{name:"STY", eval:__sty, md:&[M{op:0x84,clk:3,sz:2,am:1,xc:false},M{op:0x94,clk:4,sz:2,am:2,xc:false},M{op:0x8C,clk:4,sz:3,am:4,xc:false},]},
 Descriptor{name:"TAX", eval:__tax, md:&[M{op:0xAA,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"TAY", eval:__tay, md:&[M{op:0xA8,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"TSX", eval:__tsx, md:&[M{op:0xBA,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"TXA", eval:__txa, md:&[M{op:0x8A,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"TXS", eval:__txs, md:&[M{op:0x9A,clk:2,sz:1,am:10,xc:false},]},
 Descriptor{name:"TYA", eval:__tya, md:&[M{op:0x98,clk:2,sz:1,am:10,xc:false},]},
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_all_documented_mnemonics() {
        assert_eq!(DESCRIPTORS.len(), 56);
    }

    #[test]
    fn opcode_bytes_are_unique_and_inverse_is_complete() {
        init();
        // every (mnemonic, mode) pair owns exactly one opcode byte; if any
        // two collided, the derived table would come up short
        let total: usize = DESCRIPTORS.iter().map(|d| d.md.len()).sum();
        let mapped = (0u16..256)
            .filter(|&b| opcode_to_flavor(b as u8).is_some())
            .count();
        assert_eq!(total, mapped);
    }

    #[test]
    fn inverse_agrees_with_forward_table() {
        init();
        for desc in DESCRIPTORS {
            for detail in desc.md {
                let flavor = opcode_to_flavor(detail.op).unwrap();
                assert_eq!(flavor.desc.name, desc.name);
                assert_eq!(flavor.mode, detail.addressing_mode());
                assert_eq!(flavor.detail.sz, detail.sz);
            }
        }
    }

    #[test]
    fn name_lookup_is_uppercase_only() {
        init();
        assert!(name_to_descriptor("LDA").is_some());
        assert!(name_to_descriptor("lda").is_none());
    }

    #[test]
    fn operand_lengths_match_modes() {
        init();
        for desc in DESCRIPTORS {
            for detail in desc.md {
                use AddressingMode::*;
                let expected = match detail.addressing_mode() {
                    Implied | Accumulator => 1,
                    Immediate | ZeroPage | ZeroPageX | ZeroPageY | IndirectX | IndirectY | Relative => 2,
                    Absolute | AbsoluteX | AbsoluteY | Indirect => 3,
                };
                assert_eq!(detail.sz, expected, "{} {:?}", desc.name, detail.addressing_mode());
            }
        }
    }
}
