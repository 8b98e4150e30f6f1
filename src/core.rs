use super::test::TestCriterion;
use super::*;
use std::sync::{Arc, RwLock};

/// The Core struct implements the 6502 simulator.
/// Its implementation spans multiple files: runtime.rs, memory.rs, registers.rs
pub struct Core {
    pub reg: registers::Set, // the full set of 6502 registers
    pub ram: Arc<RwLock<Vec<u8>>>,
    pub image: Vec<u8>,            // read-only program image mapped at [origin, 0xFFFF]
    pub chr: Vec<u8>,              // auxiliary tile/graphics bank; carried uninterpreted
    pub origin: u16,               // load address of the image; also the RAM/ROM boundary
    pub reset_vector: Option<u16>, // overrides the reset vector if set
    /* tracing */
    pub addr_to_sym: HashMap<u16, String>, // map from address to label (for trace output)
    /* perf measurement */
    pub instruction_count: u64, // the number of instructions executed since the most recent reset
    pub clock_cycles: u64,      // the number of clock cycles consumed since the most recent reset
    pub trace: bool,            // if true then display each instruction as it's executed
}
impl Core {
    pub fn new(image: Vec<u8>, chr: Vec<u8>, origin: u16, labels: &HashMap<String, u16>) -> Core {
        instructions::init();

        let mut addr_to_sym = HashMap::new();
        for (name, &addr) in labels {
            addr_to_sym.insert(addr, name.clone());
        }
        Core {
            reg: Default::default(),
            // allocate the entire 16-bit address space; the image shadows
            // the top of it from the origin up
            ram: Arc::new(RwLock::new(vec![0; 0x10000])),
            image,
            chr,
            origin,
            reset_vector: None,
            addr_to_sym,
            instruction_count: 0,
            clock_cycles: 0,
            trace: config::ARGS.trace,
        }
    }

    /// Builds a Core around an assembled Program plus an optional
    /// auxiliary data bank.
    pub fn from_program(program: &Program, chr: Vec<u8>) -> Core {
        Core::new(program.bytes.clone(), chr, program.origin, &program.labels)
    }

    /// load_bytes copies bytes from a slice of u8 into simulator RAM at addr.
    /// This is only used in tests atm.
    #[cfg(test)]
    pub fn load_bytes(&mut self, bytes: &[u8], addr: u16) {
        let mut ram = self.ram.write().unwrap();
        for (i, byte) in bytes.iter().enumerate() {
            ram[addr as usize + i] = *byte;
        }
    }

    /// check_criteria evaluates each TestCriterion provided and returns Err(Error) if any fail
    pub fn check_criteria(&self, criteria: &Vec<TestCriterion>) -> Result<(), Error> {
        if criteria.is_empty() {
            return Ok(());
        }
        info!(
            "Validating {} test criteri{}",
            criteria.len(),
            if criteria.len() == 1 { "on" } else { "a" }
        );
        let mut error_count = 0;
        for tc in criteria {
            print!("\t{} --> ", tc);
            match tc.eval(self) {
                Ok(_) => println!(green!("PASS")),
                Err(e) => {
                    error_count += 1;
                    println!(red!("FAIL {}"), e.msg)
                }
            }
        }
        if error_count == 0 {
            Ok(())
        } else {
            Err(Error {
                kind: ErrorKind::Test,
                ctx: None,
                msg: format!("Failed {error_count} test(s)"),
            })
        }
    }
}
