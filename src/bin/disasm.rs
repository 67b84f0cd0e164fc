//! Disassembler CLI
//!
//! `disasm <prefix>` reads `<prefix>.com`, applies `<prefix>.cfg` when
//! present, merges comments from an existing `<prefix>.asm`, and rewrites
//! `<prefix>.asm`.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;

use remake86::dasm::Disassembler;

#[derive(Parser)]
#[command(
    name = "disasm",
    about = "Disassemble <prefix>.com into <prefix>.asm.\n\
             If <prefix>.asm exists, its comments are merged into the new listing.\n\
             If <prefix>.cfg exists, configuration is read from it:\n\
                 EntryPoint <address>    Add an explicit entry point to explore.\n\
                 DumpRaw                 Include raw instruction bytes in the listing."
)]
struct Args {
    /// Path prefix of the .com/.cfg/.asm file set
    prefix: String,
}

fn run(prefix: &str) -> anyhow::Result<()> {
    let com_path = format!("{}.com", prefix);
    let cfg_path = format!("{}.cfg", prefix);
    let asm_path = format!("{}.asm", prefix);

    let mut dasm = Disassembler::new();

    if Path::new(&cfg_path).exists() {
        let cfg = File::open(&cfg_path).with_context(|| format!("failed to open {}", cfg_path))?;
        dasm.load_config(BufReader::new(cfg))
            .with_context(|| format!("failed to read {}", cfg_path))?;
    }

    let image = fs::read(&com_path).with_context(|| format!("failed to read {}", com_path))?;
    dasm.load_image(&image)?;
    dasm.disassemble();

    if Path::new(&asm_path).exists() {
        let asm = File::open(&asm_path).with_context(|| format!("failed to open {}", asm_path))?;
        dasm.merge_comments(BufReader::new(asm))
            .with_context(|| format!("failed to merge comments from {}", asm_path))?;
    }

    let out = File::create(&asm_path).with_context(|| format!("failed to create {}", asm_path))?;
    let mut out = BufWriter::new(out);
    dasm.write_listing(&mut out)
        .with_context(|| format!("failed to write {}", asm_path))?;

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(1);
        }
    };

    match run(&args.prefix) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {:#}", err);
            ExitCode::from(1)
        }
    }
}
