use clap::Parser;
use clap_num::maybe_hex;
use lazy_static::lazy_static;

#[derive(Parser, Debug)]
#[command(author,version,about,long_about=None)]
pub struct Args {
    /// Assembly (.asm, .s) file to assemble/run
    pub file: String,

    /// Binary file to load as the auxiliary character/tile bank (passed through uninterpreted)
    #[arg(long)]
    pub chr: Option<String>,

    /// Remove blank and comment-only lines from program listing
    #[arg(short, long)]
    pub code_only: bool,

    /// If there is a program listing then dump it to stdout
    #[arg(short, long)]
    pub list: bool,

    /// Override the reset vector
    #[arg(long,value_parser=maybe_hex::<u16>)]
    pub reset_vector: Option<u16>,

    /// Run the program and evaluate any test criteria
    #[arg(short, long)]
    pub run: bool,

    /// Trace each machine instruction as it is executed
    #[arg(short, long)]
    pub trace: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Write output files after assembly (.lst, .sym)
    #[arg(short, long)]
    pub write_files: bool,
}

lazy_static! {
    pub static ref ARGS: Args = if cfg!(test) {
        // manually set parameters for running tests
        Args::parse_from(["test", "test", "--run"])
    } else {
        Args::parse()
    };
}

pub fn init() {}
pub fn run() -> bool { ARGS.run }
