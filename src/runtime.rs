/// Implements the runtime engine of the simulator.
use super::instructions::{AddressingMode, Instance, Outcome, Target};
use super::*;

impl Core {
    /// Resets the 6502 by clearing the registers (which disables
    /// interrupts) and then loading the program counter from the reset
    /// vector at 0xFFFC/0xFFFD (or using the override value if one was
    /// supplied).
    pub fn reset(&mut self) {
        self.reg.reset();
        self.reg.pc = match self.reset_vector {
            Some(addr) => addr,
            None => self.load_u16(0xfffc),
        };
        self.instruction_count = 0;
        self.clock_cycles = 0;
    }

    /// Starts executing instructions at the current program counter.
    /// Will attempt to execute until a BRK instruction or a fault is
    /// encountered. A normal exit results in Ok; anything else in Err.
    pub fn exec(&mut self) -> Result<(), Error> {
        loop {
            if let Err(e) = self.exec_one() {
                if e.kind == ErrorKind::Exit {
                    // this is a normal exit; return Ok
                    return Ok(());
                }
                return Err(e);
            }
        }
    }
    /// Helper function for exec.
    /// Wraps calls to step and adds trace output and BRK checks.
    fn exec_one(&mut self) -> Result<(), Error> {
        let outcome = self.step()?;
        if self.trace {
            println!("{}", self.render_trace(&outcome));
        }
        if outcome.brk {
            // BRK semantics (stack pushes, flags, IRQ vector) have already
            // been committed; the driver just stops stepping here
            info!("Encountered BRK. Program execution terminated.");
            return Err(Error::new(ErrorKind::Exit, None, ""));
        }
        Ok(())
    }

    /// Executes exactly one instruction at PC: fetch, decode, compute the
    /// effective address, dispatch to the handler and commit the results.
    /// State between calls is always consistent, so a caller may stop at
    /// any instruction boundary.
    pub fn step(&mut self) -> Result<Outcome, Error> {
        let op = self.load_u8(self.reg.pc);
        // decode via the byte-keyed table derived from DESCRIPTORS
        // Note: doing this with if/else rather than ok_or_else because it performs better
        let flavor = if let Some(flavor) = instructions::opcode_to_flavor(op) {
            flavor
        } else {
            return Err(runtime_err!(
                Some(self.reg),
                "Bad instruction: {:02X} found at {:04X}",
                op,
                self.reg.pc
            ));
        };
        let mut inst = Instance::new(&self.reg, flavor);
        self.decode_operand(&mut inst);

        let mut live_ctx = self.reg;
        // adjust the program counter before evaluating the instruction;
        // relative branch, JSR and BRK math all assume PC already points
        // past the instruction
        live_ctx.pc = live_ctx.pc.wrapping_add(flavor.detail.sz);

        let mut o = Outcome::new(inst, live_ctx);
        (flavor.desc.eval)(self, &mut o);

        // commit the changes to the machine state
        self.reg = o.new_ctx;
        if let Some(writes) = o.writes.as_ref() {
            for w in writes {
                self.store_u8(w.addr, w.val);
            }
        }
        self.instruction_count += 1;
        self.clock_cycles += (flavor.detail.clk + o.extra_clk) as u64;
        Ok(o)
    }

    /// Computes the (source, target, raw operand) triple for the
    /// instruction's addressing mode. The source is the decoded value the
    /// handler consumes; the target is where a result byte would be
    /// written back.
    fn decode_operand(&self, inst: &mut Instance) {
        let ctx = inst.ctx;
        let pc = ctx.pc;
        let param = match inst.flavor.detail.sz {
            2 => self.load_u8(pc.wrapping_add(1)) as u16,
            3 => self.load_u16(pc.wrapping_add(1)),
            _ => 0,
        };
        inst.raw = param;
        match inst.flavor.mode {
            AddressingMode::Implied => {
                // nothing to do. op code itself is sufficient
            }
            AddressingMode::Immediate => {
                inst.src = param;
            }
            AddressingMode::Accumulator => {
                inst.src = ctx.a as u16;
                inst.target = Target::Accumulator;
            }
            AddressingMode::ZeroPage => {
                inst.target = Target::Mem(param);
                inst.src = self.load_u8(param) as u16;
            }
            AddressingMode::ZeroPageX => {
                let target = (param + ctx.x as u16) & 0xff;
                inst.target = Target::Mem(target);
                inst.src = self.load_u8(target) as u16;
            }
            AddressingMode::ZeroPageY => {
                let target = (param + ctx.y as u16) & 0xff;
                inst.target = Target::Mem(target);
                inst.src = self.load_u8(target) as u16;
            }
            AddressingMode::IndirectX => {
                // pointer fetch wraps within the zero page
                let target = self.load_u16_zp((param as u8).wrapping_add(ctx.x));
                inst.target = Target::Mem(target);
                inst.src = self.load_u8(target) as u16;
            }
            AddressingMode::IndirectY => {
                // no page wrap on the Y add
                let target = self.load_u16_zp(param as u8).wrapping_add(ctx.y as u16);
                inst.target = Target::Mem(target);
                inst.src = self.load_u8(target) as u16;
            }
            AddressingMode::Absolute => {
                inst.target = Target::Mem(param);
                inst.src = self.load_u8(param) as u16;
            }
            AddressingMode::AbsoluteX => {
                let target = param.wrapping_add(ctx.x as u16);
                inst.target = Target::Mem(target);
                inst.src = self.load_u8(target) as u16;
            }
            AddressingMode::AbsoluteY => {
                let target = param.wrapping_add(ctx.y as u16);
                inst.target = Target::Mem(target);
                inst.src = self.load_u8(target) as u16;
            }
            AddressingMode::Relative => {
                // the branch target; the signed displacement is relative
                // to the instruction that follows
                inst.src = rel_addr(pc.wrapping_add(2), param as u8);
            }
            AddressingMode::Indirect => {
                let target = self.load_u16(param);
                inst.target = Target::Mem(target);
                inst.src = self.load_u16(target);
            }
        }
        if self.trace {
            inst.operand = Some(self.display_operand(inst));
        }
    }

    /// Renders the operand the way it would appear in source: immediate
    /// and zero-page values as $XX, absolute/relative values as $XXXX or
    /// the label whose address matches.
    fn display_operand(&self, inst: &Instance) -> String {
        match inst.flavor.mode {
            AddressingMode::Implied => String::new(),
            AddressingMode::Accumulator => "A".to_string(),
            AddressingMode::Immediate => format!("#{}", hex8(inst.raw as u8)),
            AddressingMode::ZeroPage => hex8(inst.raw as u8),
            AddressingMode::ZeroPageX => format!("{},X", hex8(inst.raw as u8)),
            AddressingMode::ZeroPageY => format!("{},Y", hex8(inst.raw as u8)),
            AddressingMode::IndirectX => format!("({},X)", hex8(inst.raw as u8)),
            AddressingMode::IndirectY => format!("({}),Y", hex8(inst.raw as u8)),
            AddressingMode::Absolute => self.hex16(inst.raw),
            AddressingMode::AbsoluteX => format!("{},X", self.hex16(inst.raw)),
            AddressingMode::AbsoluteY => format!("{},Y", self.hex16(inst.raw)),
            AddressingMode::Relative => self.hex16(inst.src),
            AddressingMode::Indirect => format!("({})", self.hex16(inst.raw)),
        }
    }
    /// A 16-bit value as a label name when one matches, else $XXXX.
    fn hex16(&self, val: u16) -> String {
        match self.addr_to_sym.get(&val) {
            Some(label) => label.clone(),
            None => format!("${:04X}", val),
        }
    }
    /// One line of trace output for an executed instruction:
    /// `<address-or-label>: <MNEMONIC> <operand-text>`.
    pub fn render_trace(&self, o: &Outcome) -> String {
        let pc = self.hex16(o.inst.ctx.pc);
        match o.inst.operand.as_deref() {
            Some("") | None => format!("{}: {}", pc, o.inst.flavor.desc.name),
            Some(operand) => format!("{}: {} {}", pc, o.inst.flavor.desc.name, operand),
        }
    }
}

fn hex8(val: u8) -> String { format!("${:02X}", val) }

/// Branch target from a signed 8-bit displacement, wrapping around the
/// 16-bit address space.
fn rel_addr(pc: u16, offset: u8) -> u16 { pc.wrapping_add(offset as i8 as u16) }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Assembler;
    use registers::SRBit;

    fn core_for(image: Vec<u8>, origin: u16) -> Core {
        let mut core = Core::new(image, Vec::new(), origin, &HashMap::new());
        core.reg.reset();
        core.reg.pc = origin;
        core
    }
    fn run_source(lines: &[&str]) -> Result<Core, Error> {
        let asm = Assembler::new();
        let program = asm.assemble(&lines.iter().map(|s| s.to_string()).collect::<Vec<_>>())?;
        assert!(program.diagnostics.is_empty(), "{:?}", program.diagnostics);
        let mut core = Core::from_program(&program, Vec::new());
        core.reg.reset();
        core.reg.pc = program.origin;
        core.exec()?;
        Ok(core)
    }

    #[test]
    fn reset_loads_pc_from_reset_vector() {
        // image mapped high enough to cover 0xFFFC/0xFFFD
        let image = vec![0x00, 0x00, 0x34, 0x12, 0x00, 0x00];
        let mut core = Core::new(image, Vec::new(), 0xfffa, &HashMap::new());
        core.reset();
        assert_eq!(core.reg.pc, 0x1234);
        assert!(core.reg.sr.is_set(SRBit::I));
    }

    #[test]
    fn unmapped_opcode_is_fatal() {
        let mut core = core_for(vec![0x02], 0x8000);
        let err = core.step().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Runtime);
    }

    #[test]
    fn load_store_round_trip() -> Result<(), Error> {
        // LDA #$05 / STA $10 / LDX $10
        let mut core = core_for(vec![0xa9, 0x05, 0x85, 0x10, 0xa6, 0x10], 0x8000);
        core.step()?;
        core.step()?;
        core.step()?;
        assert_eq!(core.reg.a, 0x05);
        assert_eq!(core.reg.x, 0x05);
        assert!(!core.reg.sr.is_set(SRBit::Z));
        assert_eq!(core.load_u8(0x10), 0x05);
        assert_eq!(core.clock_cycles, 2 + 3 + 3);
        Ok(())
    }

    #[test]
    fn compare_sets_borrow_style_carry() -> Result<(), Error> {
        // LDA #$50 / CMP #$30
        let mut core = core_for(vec![0xa9, 0x50, 0xc9, 0x30], 0x8000);
        core.step()?;
        core.step()?;
        assert!(core.reg.sr.is_set(SRBit::C));
        assert!(!core.reg.sr.is_set(SRBit::Z));
        assert!(!core.reg.sr.is_set(SRBit::N));

        // LDA #$30 / CMP #$50
        let mut core = core_for(vec![0xa9, 0x30, 0xc9, 0x50], 0x8000);
        core.step()?;
        core.step()?;
        assert!(!core.reg.sr.is_set(SRBit::C));
        assert!(!core.reg.sr.is_set(SRBit::Z));
        assert!(core.reg.sr.is_set(SRBit::N));
        Ok(())
    }

    #[test]
    fn adc_binary_carry_and_overflow() -> Result<(), Error> {
        // LDA #$7F / ADC #$01 -> signed overflow, no carry
        let mut core = core_for(vec![0xa9, 0x7f, 0x69, 0x01], 0x8000);
        core.step()?;
        core.step()?;
        assert_eq!(core.reg.a, 0x80);
        assert!(core.reg.sr.is_set(SRBit::V));
        assert!(core.reg.sr.is_set(SRBit::N));
        assert!(!core.reg.sr.is_set(SRBit::C));

        // LDA #$FF / ADC #$02 -> carry out, no overflow
        let mut core = core_for(vec![0xa9, 0xff, 0x69, 0x02], 0x8000);
        core.step()?;
        core.step()?;
        assert_eq!(core.reg.a, 0x01);
        assert!(core.reg.sr.is_set(SRBit::C));
        assert!(!core.reg.sr.is_set(SRBit::V));
        Ok(())
    }

    #[test]
    fn adc_applies_decimal_correction() -> Result<(), Error> {
        // SED / LDA #$19 / ADC #$28 -> BCD 19 + 28 = 47
        let mut core = core_for(vec![0xf8, 0xa9, 0x19, 0x69, 0x28], 0x8000);
        core.step()?;
        core.step()?;
        core.step()?;
        assert_eq!(core.reg.a, 0x47);
        assert!(!core.reg.sr.is_set(SRBit::C));
        Ok(())
    }

    #[test]
    fn sbc_applies_decimal_correction() -> Result<(), Error> {
        // SED / SEC / LDA #$42 / SBC #$13 -> BCD 42 - 13 = 29
        let mut core = core_for(vec![0xf8, 0x38, 0xa9, 0x42, 0xe9, 0x13], 0x8000);
        core.step()?;
        core.step()?;
        core.step()?;
        core.step()?;
        assert_eq!(core.reg.a, 0x29);
        assert!(core.reg.sr.is_set(SRBit::C));
        Ok(())
    }

    #[test]
    fn shifts_route_to_accumulator_or_memory() -> Result<(), Error> {
        // LDA #$81 / ASL A
        let mut core = core_for(vec![0xa9, 0x81, 0x0a], 0x8000);
        core.step()?;
        core.step()?;
        assert_eq!(core.reg.a, 0x02);
        assert!(core.reg.sr.is_set(SRBit::C));

        // ASL $10 with $10 = $40: result goes to memory, A untouched
        let mut core = core_for(vec![0x06, 0x10], 0x8000);
        core.load_bytes(&[0x40], 0x10);
        core.step()?;
        assert_eq!(core.load_u8(0x10), 0x80);
        assert_eq!(core.reg.a, 0x00);
        assert!(core.reg.sr.is_set(SRBit::N));
        Ok(())
    }

    #[test]
    fn rotates_carry_through() -> Result<(), Error> {
        // SEC / LDA #$40 / ROL A -> 0x81, carry clear
        let mut core = core_for(vec![0x38, 0xa9, 0x40, 0x2a], 0x8000);
        core.step()?;
        core.step()?;
        core.step()?;
        assert_eq!(core.reg.a, 0x81);
        assert!(!core.reg.sr.is_set(SRBit::C));

        // SEC / LDA #$01 / ROR A -> 0x80, carry set from bit 0
        let mut core = core_for(vec![0x38, 0xa9, 0x01, 0x6a], 0x8000);
        core.step()?;
        core.step()?;
        core.step()?;
        assert_eq!(core.reg.a, 0x80);
        assert!(core.reg.sr.is_set(SRBit::C));
        Ok(())
    }

    #[test]
    fn taken_branch_costs_an_extra_cycle() -> Result<(), Error> {
        // LDX #$01 / BNE +2 (taken, same page)
        let mut core = core_for(vec![0xa2, 0x01, 0xd0, 0x02], 0x8000);
        core.step()?;
        let before = core.clock_cycles;
        core.step()?;
        assert_eq!(core.reg.pc, 0x8006);
        assert_eq!(core.clock_cycles - before, 3);

        // LDX #$00 / BNE +2 (not taken)
        let mut core = core_for(vec![0xa2, 0x00, 0xd0, 0x02], 0x8000);
        core.step()?;
        let before = core.clock_cycles;
        core.step()?;
        assert_eq!(core.reg.pc, 0x8004);
        assert_eq!(core.clock_cycles - before, 2);
        Ok(())
    }

    #[test]
    fn page_crossing_branch_costs_two_extra_cycles() -> Result<(), Error> {
        // branch backwards across the page boundary: BNE -6 at 0x8000
        let mut core = core_for(vec![0xd0, 0xfa], 0x8000);
        core.reg.sr.set(SRBit::Z, false);
        let before = core.clock_cycles;
        core.step()?;
        assert_eq!(core.reg.pc, 0x7ffc);
        assert_eq!(core.clock_cycles - before, 4);
        Ok(())
    }

    #[test]
    fn jsr_rts_round_trip() -> Result<(), Error> {
        // JSR $8004 / BRK / ... / LDA #$22 / RTS
        let mut core = core_for(vec![0x20, 0x04, 0x80, 0x00, 0xa9, 0x22, 0x60], 0x8000);
        core.reg.sp = 0xff;
        core.step()?; // JSR
        assert_eq!(core.reg.pc, 0x8004);
        // return address (last byte of the JSR) sits on the stack page
        assert_eq!(core.load_u16(0x0100 + core.reg.sp.wrapping_add(1) as u16), 0x8002);
        core.step()?; // LDA
        core.step()?; // RTS
        assert_eq!(core.reg.pc, 0x8003);
        assert_eq!(core.reg.a, 0x22);
        Ok(())
    }

    #[test]
    fn brk_vectors_through_fffe() -> Result<(), Error> {
        // image spans up to 0xFFFF so the IRQ vector is readable
        let mut image = vec![0u8; 0x8000];
        image[0x7ffe] = 0x34;
        image[0x7fff] = 0x12;
        let mut core = core_for(image, 0x8000);
        core.reg.sp = 0xff;
        let sr_before = core.reg.sr.get_as_byte();
        let o = core.step()?;
        assert!(o.brk);
        assert_eq!(core.reg.pc, 0x1234);
        assert!(core.reg.sr.is_set(SRBit::B));
        assert!(core.reg.sr.is_set(SRBit::I));
        assert_eq!(core.reg.sp, 0xfc);
        // pushed SR has the break flag set
        assert_eq!(core.load_u8(0x01fd), sr_before | 0x10);
        // pushed return address is the BRK address + 2
        assert_eq!(core.load_u16(0x01fe), 0x8002);
        Ok(())
    }

    #[test]
    fn rti_restores_sr_then_pc() -> Result<(), Error> {
        let mut core = core_for(vec![0x40], 0x8000);
        core.reg.sp = 0xfc;
        // stack holds SR, then PC low, PC high
        core.load_bytes(&[0xc3, 0x34, 0x12], 0x01fd);
        core.step()?;
        assert_eq!(core.reg.sr.get_as_byte(), 0xc3);
        assert_eq!(core.reg.pc, 0x1234);
        assert_eq!(core.reg.sp, 0xff);
        Ok(())
    }

    #[test]
    fn indirect_y_effective_address() -> Result<(), Error> {
        // LDY #$01 / LDA ($30),Y with pointer $30 -> $0200, $0201 = $77
        let mut core = core_for(vec![0xa0, 0x01, 0xb1, 0x30], 0x8000);
        core.load_bytes(&[0x00, 0x02], 0x30);
        core.load_bytes(&[0x11, 0x77], 0x0200);
        core.step()?;
        core.step()?;
        assert_eq!(core.reg.a, 0x77);
        Ok(())
    }

    #[test]
    fn indirect_x_pointer_wraps_in_zero_page() -> Result<(), Error> {
        // LDX #$05 / LDA ($FB,X): pointer fetched from $00 after wrap
        let mut core = core_for(vec![0xa2, 0x05, 0xa1, 0xfb], 0x8000);
        core.load_bytes(&[0x00, 0x03], 0x00);
        core.load_bytes(&[0x42], 0x0300);
        core.step()?;
        core.step()?;
        assert_eq!(core.reg.a, 0x42);
        Ok(())
    }

    #[test]
    fn jmp_indirect_follows_pointer() -> Result<(), Error> {
        // JMP ($0020) with pointer -> $8005
        let mut core = core_for(vec![0x6c, 0x20, 0x00], 0x8000);
        core.load_bytes(&[0x05, 0x80], 0x0020);
        core.step()?;
        assert_eq!(core.reg.pc, 0x8005);
        Ok(())
    }

    #[test]
    fn stack_ops_wrap_sp() -> Result<(), Error> {
        // PHA with SP=0 wraps to 0xFF
        let mut core = core_for(vec![0x48, 0x68], 0x8000);
        core.reg.a = 0x99;
        core.step()?;
        assert_eq!(core.reg.sp, 0xff);
        assert_eq!(core.load_u8(0x0100), 0x99);
        core.reg.a = 0;
        core.step()?; // PLA
        assert_eq!(core.reg.sp, 0x00);
        assert_eq!(core.reg.a, 0x99);
        assert!(core.reg.sr.is_set(SRBit::N));
        Ok(())
    }

    #[test]
    fn assembled_program_executes_end_to_end() -> Result<(), Error> {
        let core = run_source(&[
            "        .ORG $8000",
            "START:  LDX #$00",
            "        LDA #$00",
            "LOOP:   CLC",
            "        ADC #$07",
            "        INX",
            "        CPX #$04",
            "        BNE LOOP",
            "        STA $21",
            "        BRK",
        ])?;
        assert_eq!(core.reg.a, 0x1c);
        assert_eq!(core.reg.x, 0x04);
        assert_eq!(core.load_u8(0x21), 0x1c);
        Ok(())
    }

    #[test]
    fn trace_renders_labels_and_hex() -> Result<(), Error> {
        let asm = Assembler::new();
        let program = asm.assemble(
            &[
                "        .ORG $8000",
                "START:  LDA #$05",
                "        STA $10",
                "        JMP START",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>(),
        )?;
        let mut core = Core::from_program(&program, Vec::new());
        core.trace = true;
        core.reg.pc = 0x8000;
        let o = core.step()?;
        assert_eq!(core.render_trace(&o), "START: LDA #$05");
        let o = core.step()?;
        assert_eq!(core.render_trace(&o), "$8002: STA $10");
        let o = core.step()?;
        assert_eq!(core.render_trace(&o), "$8004: JMP START");
        Ok(())
    }

    #[test]
    fn ppu_status_latch_clears_across_steps() -> Result<(), Error> {
        // LDA $2002 / LDA $2002
        let mut core = core_for(vec![0xad, 0x02, 0x20, 0xad, 0x02, 0x20], 0x8000);
        core.load_bytes(&[0x80], memory::PPU_STATUS);
        core.step()?;
        assert_eq!(core.reg.a, 0x80);
        core.step()?;
        assert_eq!(core.reg.a, 0x00);
        Ok(())
    }
}
