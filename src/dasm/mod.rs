//! Recursive-descent disassembler
//!
//! Drives the CPU's decoder in dry-run mode over every statically
//! discoverable control-flow edge. Each decoded instruction becomes a
//! CODE fragment; once the entry-point queue is quiescent, the gaps
//! become DATA fragments and the result partitions the image exactly.

mod listing;

use std::collections::BTreeMap;
use std::io::{self, BufRead};
use std::ops::Bound;

use crate::cpu::exec::BranchKind;
use crate::cpu::{regs, Cpu};
use crate::loader::{self, LoadError};
use crate::memory::Memory;
use crate::util;

/// How an entry point was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrigin {
    Call,
    Jump,
    Manual,
}

impl From<BranchKind> for EntryOrigin {
    fn from(kind: BranchKind) -> Self {
        match kind {
            BranchKind::Call => EntryOrigin::Call,
            BranchKind::Jump => EntryOrigin::Jump,
        }
    }
}

/// A linear address statically known to be a control-flow target.
#[derive(Debug, Clone, Copy)]
pub struct EntryPoint {
    pub explored: bool,
    pub origin: EntryOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Code,
    Data,
}

/// One contiguous unit of the disassembly: a decoded instruction or a
/// data blob.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub size: u32,
    /// Instruction text; empty for data fragments.
    pub code: String,
    pub block_comments: Vec<String>,
    pub line_comment: String,
}

impl Fragment {
    fn code(size: u32, text: String) -> Self {
        Self {
            kind: FragmentKind::Code,
            size,
            code: text,
            block_comments: Vec::new(),
            line_comment: String::new(),
        }
    }

    fn data(size: u32) -> Self {
        Self {
            kind: FragmentKind::Data,
            size,
            code: String::new(),
            block_comments: Vec::new(),
            line_comment: String::new(),
        }
    }
}

/// Static disassembler for one loaded `.COM` image.
pub struct Disassembler {
    mem: Memory,
    cpu: Cpu,
    entry_points: BTreeMap<u32, EntryPoint>,
    disassembly: BTreeMap<u32, Fragment>,
    start_offset: u32,
    end_offset: u32,
    dump_raw: bool,
}

impl Disassembler {
    pub fn new() -> Self {
        Self {
            mem: Memory::default(),
            cpu: Cpu::new(),
            entry_points: BTreeMap::new(),
            disassembly: BTreeMap::new(),
            start_offset: 0,
            end_offset: 0,
            dump_raw: false,
        }
    }

    /// Load the image at 0x0100 and seed an entry point at its start.
    pub fn load_image(&mut self, image: &[u8]) -> Result<(), LoadError> {
        let (start, end) = loader::load_com_image(image, &mut self.mem, &mut self.cpu)?;
        self.start_offset = start;
        self.end_offset = end;
        self.add_entry_point(start, EntryOrigin::Jump);
        Ok(())
    }

    pub fn start_offset(&self) -> u32 {
        self.start_offset
    }

    pub fn end_offset(&self) -> u32 {
        self.end_offset
    }

    pub fn fragments(&self) -> &BTreeMap<u32, Fragment> {
        &self.disassembly
    }

    pub fn entry_points(&self) -> &BTreeMap<u32, EntryPoint> {
        &self.entry_points
    }

    pub(crate) fn dump_raw(&self) -> bool {
        self.dump_raw
    }

    pub(crate) fn memory(&self) -> &Memory {
        &self.mem
    }

    /// Read config directives: `EntryPoint <address>` adds a manual entry,
    /// `DumpRaw` enables raw-byte columns in the listing.
    pub fn load_config(&mut self, reader: impl BufRead) -> io::Result<()> {
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let cmd = tokens.next().unwrap_or_default().to_ascii_lowercase();
            match cmd.as_str() {
                "entrypoint" => match tokens.next().map(util::parse_number) {
                    Some(Ok(address)) => self.add_entry_point(address, EntryOrigin::Manual),
                    Some(Err(_)) => log::warn!("bad entrypoint address in config: {}", line),
                    None => log::warn!("syntax: EntryPoint <address>"),
                },
                "dumpraw" => self.dump_raw = true,
                other => log::warn!("unknown config directive '{}'", other),
            }
        }
        Ok(())
    }

    pub fn add_entry_point(&mut self, address: u32, origin: EntryOrigin) {
        self.entry_points.entry(address).or_insert(EntryPoint {
            explored: false,
            origin,
        });
    }

    /// Explore every entry point, fill the gaps with data fragments, and
    /// check the coverage invariant.
    pub fn disassemble(&mut self) {
        self.explore_entry_points();
        self.add_data_fragments();
        self.verify_coverage();
    }

    fn explore_entry_points(&mut self) {
        loop {
            let unexplored: Vec<u32> = self
                .entry_points
                .iter()
                .filter(|(_, ep)| !ep.explored)
                .map(|(&address, _)| address)
                .collect();
            if unexplored.is_empty() {
                break;
            }
            for address in unexplored {
                if let Some(ep) = self.entry_points.get_mut(&address) {
                    ep.explored = true;
                }
                self.explore(address);
            }
        }
    }

    /// Straight-line decode from `address` until a terminator. Branches
    /// and calls queue their targets; JMP and RET end the line.
    fn explore(&mut self, address: u32) {
        log::debug!("exploring from {:04X}h", address);
        assert!(address < 0x10000, "entry point {:#X} outside the segment", address);

        self.cpu.clear_execution_state();
        self.cpu.regs.set16(regs::CS, 0);
        self.cpu.regs.set16(regs::IP, address as u16);

        loop {
            let at = self.cpu.linear_cs_ip();
            self.cpu.fetch_and_decode(&self.mem);

            if !self.disassembly.contains_key(&at) {
                let p = self.cpu.prepared().expect("decode left nothing prepared");
                self.disassembly
                    .insert(at, Fragment::code(p.len as u32, p.desc.clone()));
            }

            let flow = self.cpu.execute_dry(&self.mem);
            if let Some((target, kind)) = flow.target {
                self.add_entry_point(target, kind.into());
            }
            if flow.stop {
                break;
            }
        }
    }

    /// Walk the fragments in address order; every gap becomes DATA.
    fn add_data_fragments(&mut self) {
        let mut gaps: Vec<(u32, u32)> = Vec::new();
        let mut next_address = self.start_offset;
        for (&address, fragment) in &self.disassembly {
            if address > next_address {
                gaps.push((next_address, address));
            }
            next_address = address + fragment.size;
        }
        if next_address < self.end_offset {
            gaps.push((next_address, self.end_offset));
        }
        for (begin, end) in gaps {
            self.disassembly.insert(begin, Fragment::data(end - begin));
        }
    }

    /// The disassembly must partition `[start_offset, end_offset)`.
    pub fn verify_coverage(&self) {
        let mut next_address = self.start_offset;
        for (&address, fragment) in &self.disassembly {
            assert_eq!(
                address, next_address,
                "coverage hole or overlap at {:04X}h",
                next_address
            );
            next_address = address + fragment.size;
        }
        assert_eq!(
            next_address, self.end_offset,
            "coverage ends at {:04X}h, image ends at {:04X}h",
            next_address, self.end_offset
        );
    }

    /// Split the fragment containing `address` so a new data fragment
    /// starts exactly there.
    fn insert_data_fragment(&mut self, address: u32) {
        let next_address = self
            .disassembly
            .range((Bound::Excluded(address), Bound::Unbounded))
            .next()
            .map(|(&a, _)| a)
            .unwrap_or(self.end_offset);
        assert!(
            next_address > address,
            "fragment split at {:04X}h is outside the image",
            address
        );

        let prev_address = self
            .disassembly
            .range(..=address)
            .next_back()
            .map(|(&a, _)| a)
            .unwrap_or_else(|| panic!("no fragment precedes {:04X}h", address));
        assert!(prev_address < address);

        if let Some(prev) = self.disassembly.get_mut(&prev_address) {
            prev.size = address - prev_address;
        }
        self.disassembly
            .insert(address, Fragment::data(next_address - address));
    }

    fn fragment_mut(&mut self, address: u32, add_if_needed: bool) -> Option<&mut Fragment> {
        if !self.disassembly.contains_key(&address) {
            if !add_if_needed {
                return None;
            }
            self.insert_data_fragment(address);
        }
        self.disassembly.get_mut(&address)
    }

    /// True when a listing line carries an address: four hex digits and a
    /// space.
    fn starts_with_address(line: &str) -> bool {
        let bytes = line.as_bytes();
        bytes.len() >= 5
            && bytes[..4].iter().all(u8::is_ascii_hexdigit)
            && bytes[4] == b' '
    }

    /// Re-attach comments from a previous listing. Whole-line `;` comments
    /// accumulate and attach as block comments to the next addressed line;
    /// trailing `;` text attaches as that fragment's line comment. An
    /// address inside an existing fragment splits it. The coverage
    /// invariant must survive the merge.
    pub fn merge_comments(&mut self, reader: impl BufRead) -> io::Result<()> {
        let mut block_comments: Vec<String> = Vec::new();

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(comment) = line.strip_prefix(';') {
                block_comments.push(comment.trim().to_string());
                continue;
            }

            if !Self::starts_with_address(line) {
                continue;
            }
            let address = u32::from_str_radix(&line[..4], 16).expect("checked hex digits");

            if !block_comments.is_empty() {
                if let Some(fragment) = self.fragment_mut(address, true) {
                    fragment.block_comments = std::mem::take(&mut block_comments);
                }
            }

            if let Some(idx) = line.find(';') {
                if let Some(fragment) = self.fragment_mut(address, false) {
                    fragment.line_comment = line[idx + 1..].trim().to_string();
                }
            }
        }

        self.verify_coverage();
        Ok(())
    }
}

impl Default for Disassembler {
    fn default() -> Self {
        Self::new()
    }
}
