//! Listing output
//!
//! Ascending-address walk over the fragments. Code lines carry a 4-digit
//! hex address, optional raw bytes, the instruction text, and any line
//! comment. Data regions become `.DB` lines: printable runs of four or
//! more bytes are quoted, everything else is hex-packed with a soft
//! 77-column limit. Blank lines separate data regions and entry points
//! from the surrounding code.

use std::io::{self, Write};

use super::{Disassembler, EntryOrigin, Fragment, FragmentKind};

// Raw-byte columns are padded to the widest common instruction.
const MAX_INSTRUCTION_SIZE: u32 = 6;

fn is_printable(b: u8) -> bool {
    (0x20..0x7F).contains(&b)
}

fn flush_line(out: &mut dyn Write, line: &mut String) -> io::Result<()> {
    if !line.is_empty() {
        writeln!(out, "{}", line)?;
        line.clear();
    }
    Ok(())
}

fn start_line(line: &mut String, address: u32) {
    if line.is_empty() {
        line.push_str(&format!("{:04X}  .DB ", address));
    }
}

impl Disassembler {
    /// Write the whole listing.
    pub fn write_listing(&self, out: &mut dyn Write) -> io::Result<()> {
        for (&address, fragment) in self.fragments() {
            if !fragment.block_comments.is_empty() {
                writeln!(out)?;
                for comment in &fragment.block_comments {
                    writeln!(out, "; {}", comment)?;
                }
            }

            match fragment.kind {
                FragmentKind::Code => self.write_code_fragment(out, address, fragment)?,
                FragmentKind::Data => self.write_data_fragment(out, address, fragment)?,
            }
        }
        Ok(())
    }

    fn write_code_fragment(
        &self,
        out: &mut dyn Write,
        address: u32,
        fragment: &Fragment,
    ) -> io::Result<()> {
        // Visual break before entry points; call targets also get a
        // synthetic address comment.
        if let Some(ep) = self.entry_points().get(&address) {
            if fragment.block_comments.is_empty() {
                writeln!(out)?;
                if ep.origin == EntryOrigin::Call {
                    writeln!(out, "; {:04X}h", address)?;
                }
            }
        }

        write!(out, "{:04X}  ", address)?;

        if self.dump_raw() {
            for &b in self.memory().slice(address, fragment.size as usize) {
                write!(out, "{:02X}", b)?;
            }
            let pad = MAX_INSTRUCTION_SIZE.saturating_sub(fragment.size) * 2;
            write!(out, "{}  ", " ".repeat(pad as usize))?;
        }

        write!(out, "{}", fragment.code)?;

        if !fragment.line_comment.is_empty() {
            write!(out, "    ; {}", fragment.line_comment)?;
        }

        writeln!(out)
    }

    fn write_data_fragment(
        &self,
        out: &mut dyn Write,
        address: u32,
        fragment: &Fragment,
    ) -> io::Result<()> {
        // Blank line before the data dump unless comments already broke
        // the flow.
        if fragment.block_comments.is_empty() {
            writeln!(out)?;
        }

        let data = self.memory().slice(address, fragment.size as usize);
        let size = data.len();
        let mut line = String::new();
        let mut start = 0usize;

        while start < size {
            // Find a run of consistently printable or non-printable bytes.
            let printable = is_printable(data[start]);
            let mut end = start;
            while end < size && is_printable(data[end]) == printable {
                end += 1;
            }

            if printable && end - start > 3 {
                // Long printable runs get their own quoted line.
                flush_line(out, &mut line)?;
                start_line(&mut line, address + start as u32);
                line.push('\'');
                for &b in &data[start..end] {
                    line.push(b as char);
                }
                line.push('\'');
                flush_line(out, &mut line)?;
                start = end;
            } else {
                start_line(&mut line, address + start as u32);
                while start < end && line.len() < 77 {
                    line.push_str(&format!("{:02X}, ", data[start]));
                    start += 1;
                }
                if start < end {
                    flush_line(out, &mut line)?;
                }
            }
        }

        flush_line(out, &mut line)
    }
}
