//! .COM image loading
//!
//! A `.COM` image is raw machine code loaded at linear 0x0100 in a 64 KiB
//! segment, entered at its first byte with all segment registers zero.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::cpu::{regs, Cpu};
use crate::memory::Memory;

/// Linear load offset of a `.COM` image.
pub const COM_OFFSET: u16 = 0x0100;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("image of {size:#X} bytes does not fit below {mem:#X}")]
    TooLarge { size: usize, mem: usize },
}

/// Copy an image to linear 0x0100 and set the `.COM` entry state:
/// CS=DS=ES=SS=0, SP=0xFFFF, IP=0x0100, flags clear. Returns the image's
/// `(start_offset, end_offset)` linear range.
pub fn load_com_image(
    image: &[u8],
    mem: &mut Memory,
    cpu: &mut Cpu,
) -> Result<(u32, u32), LoadError> {
    let start = COM_OFFSET as usize;
    if start + image.len() >= mem.size() {
        return Err(LoadError::TooLarge {
            size: image.len(),
            mem: mem.size(),
        });
    }
    mem.load(image, start);

    cpu.regs.set16(regs::CS, 0);
    cpu.regs.set16(regs::DS, 0);
    cpu.regs.set16(regs::ES, 0);
    cpu.regs.set16(regs::SS, 0);
    cpu.regs.set16(regs::SP, 0xFFFF);
    cpu.regs.set16(regs::IP, COM_OFFSET);
    cpu.regs.flags = 0;

    Ok((start as u32, (start + image.len()) as u32))
}

/// Load a `.COM` file from disk.
pub fn load_com(
    path: impl AsRef<Path>,
    mem: &mut Memory,
    cpu: &mut Cpu,
) -> Result<(u32, u32), LoadError> {
    let path = path.as_ref();
    let image = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_com_image(&image, mem, cpu)
}
