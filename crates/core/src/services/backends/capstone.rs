use std::fs;
use std::path::Path;

use capstone::arch::arm::{ArmOperandType, ArmReg};
use capstone::arch::arm64::Arm64OperandType;
use capstone::arch::mips::MipsOperand;
use capstone::arch::ppc::PpcOperand;
use capstone::arch::riscv::RiscVOperand;
use capstone::arch::x86::{X86OperandType, X86Reg};
use capstone::arch::ArchOperand;
use capstone::{arch, prelude::*, Capstone, Endian};
use goblin::{elf, mach, pe, Object};
use tracing::debug;

use crate::db::{SymbolKind, SymbolRecord};
use crate::host::HostError;
use crate::services::sources::{ImportedSymbols, SourceError, SymbolRequest, SymbolSource};

/// Reads the symbol table embedded in ELF, PE (exports) and Mach-O files.
pub struct ObjectSource;

impl SymbolSource for ObjectSource {
    fn load(&self, request: &SymbolRequest) -> Result<ImportedSymbols, SourceError> {
        if !request.binary_path.is_file() {
            return Err(SourceError::MissingBinary(request.binary_path.clone()));
        }
        let bytes = fs::read(&request.binary_path)
            .map_err(|_| SourceError::MissingBinary(request.binary_path.clone()))?;
        let (format, symbols) = extract_symbols(&bytes);
        debug!(binary = %request.binary_name, format, count = symbols.len(), "object symbols loaded");
        Ok(ImportedSymbols { symbols, source_version: Some(format!("goblin/{format}")) })
    }

    fn name(&self) -> &'static str {
        "object"
    }
}

fn extract_symbols(bytes: &[u8]) -> (&'static str, Vec<SymbolRecord>) {
    match Object::parse(bytes) {
        Ok(Object::Elf(elf)) => ("elf", elf_symbols(&elf)),
        Ok(Object::PE(pe)) => ("pe", pe_symbols(&pe)),
        Ok(Object::Mach(mach::Mach::Binary(bin))) => ("mach-o", mach_symbols(&bin)),
        _ => ("raw", Vec::new()),
    }
}

fn elf_symbols(elf: &elf::Elf) -> Vec<SymbolRecord> {
    let mut symbols = Vec::new();
    for sym in &elf.syms {
        if sym.st_shndx == elf::section_header::SHN_UNDEF as usize {
            continue;
        }
        let kind = if sym.is_function() {
            SymbolKind::Function
        } else if sym.st_type() == elf::sym::STT_OBJECT {
            SymbolKind::Data
        } else {
            continue;
        };
        let name = elf.strtab.get_at(sym.st_name).unwrap_or("");
        if name.is_empty() {
            continue;
        }
        symbols.push(SymbolRecord::new(sym.st_value, name, kind));
    }
    symbols
}

fn mach_symbols(bin: &mach::MachO) -> Vec<SymbolRecord> {
    let mut symbols = Vec::new();
    for sym in bin.symbols() {
        let Ok((name, nlist)) = sym else { continue };
        if nlist.n_value == 0 || nlist.is_undefined() {
            continue;
        }
        let name = name.trim_start_matches('_');
        if name.is_empty() {
            continue;
        }
        symbols.push(SymbolRecord::new(nlist.n_value, name, SymbolKind::Function));
    }
    symbols
}

fn pe_symbols(pe: &pe::PE) -> Vec<SymbolRecord> {
    let image_base = pe.image_base as u64;
    pe.exports
        .iter()
        .filter(|exp| exp.rva != 0)
        .filter_map(|exp| {
            let name = exp.name?;
            if name.is_empty() {
                return None;
            }
            let address = image_base.checked_add(exp.rva as u64)?;
            Some(SymbolRecord::new(address, name, SymbolKind::Function))
        })
        .collect()
}

/// A loaded section with both its virtual range and its bytes in the file.
#[derive(Debug, Clone)]
struct MappedSection {
    name: String,
    start: u64,
    end: u64,
    file_offset: usize,
    file_size: usize,
}

/// Raw bytes of a binary plus enough layout to decode instructions by address.
#[derive(Debug, Clone)]
pub struct BinaryImage {
    bytes: Vec<u8>,
    arch: String,
    sections: Vec<MappedSection>,
}

impl BinaryImage {
    /// Load `path`; the architecture comes from `arch_hint`, then the file header.
    pub fn load(path: &Path, arch_hint: Option<&str>) -> Result<Self, HostError> {
        let bytes = fs::read(path)
            .map_err(|e| HostError::Storage(format!("failed to read {}: {e}", path.display())))?;
        Self::from_bytes(bytes, arch_hint)
    }

    /// Raw blobs without a hint decode as x86_64; an object file whose machine
    /// type has no decoder is rejected rather than guessed.
    pub fn from_bytes(bytes: Vec<u8>, arch_hint: Option<&str>) -> Result<Self, HostError> {
        let is_object = is_object_file(&bytes);
        let arch = match (arch_hint, arch_from_object(&bytes)) {
            (Some(hint), _) => hint.to_lowercase(),
            (None, Some(detected)) => detected,
            (None, None) if is_object => {
                return Err(HostError::Unsupported(
                    "object header names a machine type with no decoder; pass an arch".into(),
                ));
            }
            (None, None) => "x86_64".to_string(),
        };
        let mut sections = collect_sections(&bytes);
        if sections.is_empty() && !is_object {
            // Not an object file we understand: treat it as a flat blob at address 0.
            sections.push(MappedSection {
                name: "raw".into(),
                start: 0,
                end: bytes.len() as u64,
                file_offset: 0,
                file_size: bytes.len(),
            });
        }
        Ok(Self { bytes, arch, sections })
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// File bytes from `address` to the end of its section.
    fn bytes_at(&self, address: u64) -> Option<&[u8]> {
        let sec = self.sections.iter().find(|s| address >= s.start && address < s.end)?;
        let offset_in_sec = (address - sec.start) as usize;
        if offset_in_sec >= sec.file_size {
            return None;
        }
        let start = sec.file_offset.checked_add(offset_in_sec)?;
        let end = sec.file_offset.saturating_add(sec.file_size).min(self.bytes.len());
        if start >= end {
            return None;
        }
        debug!(section = %sec.name, "mapped 0x{address:X} to file offset 0x{start:X}");
        Some(&self.bytes[start..end])
    }

    /// Decode the instruction at `address` and evaluate operand `operand_index` as an address.
    pub fn operand_value(
        &self,
        address: u64,
        operand_index: usize,
    ) -> Result<Option<u64>, HostError> {
        let code = self
            .bytes_at(address)
            .ok_or_else(|| HostError::Decode(format!("address 0x{address:X} is not mapped")))?;
        let cs = make_cs(&self.arch)?;
        let insns = cs
            .disasm_count(code, address, 1)
            .map_err(|e| HostError::Decode(format!("disassembly failed at 0x{address:X}: {e}")))?;
        let insn = insns
            .iter()
            .next()
            .ok_or_else(|| HostError::Decode(format!("no instruction at 0x{address:X}")))?;
        let detail = cs
            .insn_detail(&insn)
            .map_err(|e| HostError::Decode(format!("no detail for 0x{address:X}: {e}")))?;
        let next = address.wrapping_add(insn.bytes().len() as u64);
        debug!(
            "decoded 0x{address:X}: {} {}",
            insn.mnemonic().unwrap_or(""),
            insn.op_str().unwrap_or("")
        );

        let operands = detail.arch_detail().operands();
        let pc = PcModel { address, next, thumb: self.arch == "thumb" };
        Ok(operands.get(operand_index).and_then(|op| operand_address(op, &pc)))
    }
}

/// Where the program counter points while an instruction executes.
struct PcModel {
    address: u64,
    next: u64,
    thumb: bool,
}

impl PcModel {
    /// ARM reads PC as the instruction address plus 8 (plus 4, word aligned, in Thumb).
    fn arm_pc(&self) -> u64 {
        if self.thumb {
            self.address.wrapping_add(4) & !3
        } else {
            self.address.wrapping_add(8)
        }
    }
}

fn displacement(disp: i64) -> Option<u64> {
    (disp != 0).then_some(disp as u64)
}

fn operand_address(op: &ArchOperand, pc: &PcModel) -> Option<u64> {
    match op {
        ArchOperand::X86Operand(op) => match &op.op_type {
            X86OperandType::Imm(imm) => Some(*imm as u64),
            X86OperandType::Mem(mem) => {
                let disp = mem.disp();
                if mem.base().0 == X86Reg::X86_REG_RIP as u16 {
                    Some(pc.next.wrapping_add_signed(disp))
                } else {
                    displacement(disp)
                }
            }
            _ => None,
        },
        ArchOperand::ArmOperand(op) => match &op.op_type {
            ArmOperandType::Imm(imm) => Some(*imm as u32 as u64),
            ArmOperandType::Mem(mem) => {
                let disp = mem.disp() as i64;
                if mem.base().0 == ArmReg::ARM_REG_PC as u16 {
                    Some(pc.arm_pc().wrapping_add_signed(disp) & 0xFFFF_FFFF)
                } else {
                    displacement(disp).map(|d| d & 0xFFFF_FFFF)
                }
            }
            _ => None,
        },
        ArchOperand::Arm64Operand(op) => match op.op_type {
            Arm64OperandType::Imm(imm) => Some(imm as u64),
            _ => None,
        },
        ArchOperand::MipsOperand(op) => match op {
            MipsOperand::Imm(imm) => Some(*imm as u64),
            MipsOperand::Mem(mem) => displacement(mem.disp()),
            _ => None,
        },
        ArchOperand::PpcOperand(op) => match op {
            PpcOperand::Imm(imm) => Some(*imm as u64),
            PpcOperand::Mem(mem) => displacement(mem.disp() as i64),
            _ => None,
        },
        ArchOperand::RiscVOperand(op) => match op {
            RiscVOperand::Imm(imm) => Some(*imm as u64),
            RiscVOperand::Mem(mem) => displacement(mem.disp()),
            _ => None,
        },
        _ => None,
    }
}

/// Architecture named by an ELF/PE/Mach-O header.
pub fn arch_from_object(bytes: &[u8]) -> Option<String> {
    match Object::parse(bytes).ok()? {
        Object::Elf(elf) => match elf.header.e_machine {
            elf::header::EM_X86_64 => Some("x86_64".into()),
            elf::header::EM_386 => Some("x86".into()),
            elf::header::EM_AARCH64 => Some("arm64".into()),
            elf::header::EM_ARM => Some("arm".into()),
            elf::header::EM_MIPS => Some(
                match (elf.is_64, elf.little_endian) {
                    (false, false) => "mips",
                    (false, true) => "mipsel",
                    (true, false) => "mips64",
                    (true, true) => "mips64el",
                }
                .into(),
            ),
            elf::header::EM_PPC => Some("ppc".into()),
            elf::header::EM_PPC64 => {
                Some(if elf.little_endian { "ppc64le" } else { "ppc64" }.into())
            }
            elf::header::EM_RISCV => Some(if elf.is_64 { "riscv64" } else { "riscv32" }.into()),
            _ => None,
        },
        Object::PE(pe) => match pe.header.coff_header.machine {
            pe::header::COFF_MACHINE_X86 => Some("x86".into()),
            pe::header::COFF_MACHINE_X86_64 => Some("x86_64".into()),
            pe::header::COFF_MACHINE_ARM => Some("arm".into()),
            pe::header::COFF_MACHINE_ARM64 => Some("arm64".into()),
            _ => None,
        },
        Object::Mach(mach::Mach::Binary(bin)) => match bin.header.cputype() {
            mach::cputype::CPU_TYPE_X86 => Some("x86".into()),
            mach::cputype::CPU_TYPE_X86_64 => Some("x86_64".into()),
            mach::cputype::CPU_TYPE_ARM => Some("arm".into()),
            mach::cputype::CPU_TYPE_ARM64 => Some("arm64".into()),
            mach::cputype::CPU_TYPE_POWERPC => Some("ppc".into()),
            mach::cputype::CPU_TYPE_POWERPC64 => Some("ppc64".into()),
            _ => None,
        },
        _ => None,
    }
}

fn is_object_file(bytes: &[u8]) -> bool {
    matches!(Object::parse(bytes), Ok(Object::Elf(_) | Object::PE(_) | Object::Mach(_)))
}

fn collect_sections(bytes: &[u8]) -> Vec<MappedSection> {
    match Object::parse(bytes) {
        Ok(Object::Elf(elf)) => elf
            .section_headers
            .iter()
            .filter(|sh| {
                sh.sh_flags & elf::section_header::SHF_ALLOC as u64 != 0
                    && sh.sh_type != elf::section_header::SHT_NOBITS
            })
            .map(|sh| MappedSection {
                name: elf.shdr_strtab.get_at(sh.sh_name).unwrap_or("").to_string(),
                start: sh.sh_addr,
                end: sh.sh_addr.saturating_add(sh.sh_size),
                file_offset: sh.sh_offset as usize,
                file_size: sh.sh_size as usize,
            })
            .collect(),
        Ok(Object::PE(pe)) => {
            let image_base = pe.image_base as u64;
            pe.sections
                .iter()
                .filter_map(|sec| {
                    let size = if sec.virtual_size == 0 {
                        sec.size_of_raw_data as u64
                    } else {
                        sec.virtual_size as u64
                    };
                    // Sections past the end of the address space are unmappable.
                    let start = image_base.checked_add(sec.virtual_address as u64)?;
                    let end = start.checked_add(size)?;
                    Some(MappedSection {
                        name: sec.name().unwrap_or_default().to_string(),
                        start,
                        end,
                        file_offset: sec.pointer_to_raw_data as usize,
                        file_size: sec.size_of_raw_data as usize,
                    })
                })
                .collect()
        }
        Ok(Object::Mach(mach::Mach::Binary(bin))) => bin
            .segments
            .sections()
            .flatten()
            .filter_map(|res| res.ok())
            .map(|(sec, _)| MappedSection {
                name: sec.name().unwrap_or("").to_string(),
                start: sec.addr,
                end: sec.addr.saturating_add(sec.size),
                file_offset: sec.offset as usize,
                file_size: sec.size as usize,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn make_cs(arch: &str) -> Result<Capstone, HostError> {
    let built = match arch {
        "x86_64" | "amd64" => {
            Capstone::new().x86().mode(arch::x86::ArchMode::Mode64).detail(true).build()
        }
        "x86" | "i386" => {
            Capstone::new().x86().mode(arch::x86::ArchMode::Mode32).detail(true).build()
        }
        "arm" | "armv7" => {
            Capstone::new().arm().mode(arch::arm::ArchMode::Arm).detail(true).build()
        }
        "thumb" => Capstone::new().arm().mode(arch::arm::ArchMode::Thumb).detail(true).build(),
        "arm64" | "aarch64" => {
            Capstone::new().arm64().mode(arch::arm64::ArchMode::Arm).detail(true).build()
        }
        "mips" | "mipsel" | "mips64" | "mips64el" => {
            let mode = if arch.starts_with("mips64") {
                arch::mips::ArchMode::Mips64
            } else {
                arch::mips::ArchMode::Mips32
            };
            let endian = if arch.ends_with("el") { Endian::Little } else { Endian::Big };
            Capstone::new().mips().mode(mode).endian(endian).detail(true).build()
        }
        "ppc" | "powerpc" => Capstone::new()
            .ppc()
            .mode(arch::ppc::ArchMode::Mode32)
            .endian(Endian::Big)
            .detail(true)
            .build(),
        "ppc64" | "ppc64le" => {
            let endian = if arch == "ppc64le" { Endian::Little } else { Endian::Big };
            Capstone::new()
                .ppc()
                .mode(arch::ppc::ArchMode::Mode64)
                .endian(endian)
                .detail(true)
                .build()
        }
        "riscv" | "riscv64" => {
            Capstone::new().riscv().mode(arch::riscv::ArchMode::RiscV64).detail(true).build()
        }
        "riscv32" => {
            Capstone::new().riscv().mode(arch::riscv::ArchMode::RiscV32).detail(true).build()
        }
        other => return Err(HostError::Unsupported(format!("no decoder for architecture {other}"))),
    };
    built.map_err(|e| HostError::Decode(format!("capstone init failed for {arch}: {e}")))
}
