//! Attributes: named, length-prefixed chunks attached to the class, its
//! members and `Code` bodies.

use crate::error::{Error, Result};
use crate::insn::Instruction;

/// Attribute names the codec interprets. Any other name round-trips as
/// [`AttributeInfo::Raw`].
pub mod attribute_name {
	pub const CONSTANT_VALUE: &str = "ConstantValue";
	pub const CODE: &str = "Code";
	pub const SOURCE_FILE: &str = "SourceFile";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
	pub name_index: u16,
	pub info: AttributeInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeInfo {
	ConstantValue {
		index: u16,
	},
	SourceFile {
		sourcefile_index: u16,
	},
	Code {
		max_stack: u16,
		max_locals: u16,
		code: Vec<Instruction>,
		exception_table: Vec<ExceptionHandler>,
		attributes: Vec<Attribute>,
	},
	/// Verbatim bytes of an attribute the codec does not interpret.
	Raw {
		bytes: Vec<u8>,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionHandler {
	pub start_pc: u16,
	pub end_pc: u16,
	pub handler_pc: u16,
	pub catch_type: u16,
}

impl Attribute {
	/// The body length as written after the attribute's name index, computed
	/// from the components in one pass. Fails if the result cannot fit the
	/// `u32` wire field.
	pub fn length(&self) -> Result<u32> {
		let length = self.length_u64()?;
		u32::try_from(length).map_err(|_| {
			Error::length_mismatch(format!(
				"attribute length {length} does not fit into the u32 length field"
			))
		})
	}

	fn length_u64(&self) -> Result<u64> {
		Ok(match &self.info {
			AttributeInfo::ConstantValue { .. } | AttributeInfo::SourceFile { .. } => 2,
			AttributeInfo::Raw { bytes } => bytes.len() as u64,
			AttributeInfo::Code { code, exception_table, attributes, .. } => {
				// max_stack, max_locals, code_length
				let mut length = 2 + 2 + 4u64;
				for instruction in code {
					length += u64::from(instruction.length());
				}
				length += 2 + 8 * exception_table.len() as u64;
				length += 2;
				for attribute in attributes {
					// each nested attribute carries its own six-byte header
					length += 6 + attribute.length_u64()?;
				}
				length
			},
		})
	}
}

#[cfg(test)]
mod testing {
	use super::{Attribute, AttributeInfo, ExceptionHandler};
	use crate::insn::Instruction;
	use crate::opcode_from_mnemonic;

	fn instruction(mnemonic: &str) -> Instruction {
		Instruction::new(opcode_from_mnemonic(mnemonic).unwrap()).unwrap()
	}

	#[test]
	fn fixed_size_attributes() {
		let constant_value = Attribute {
			name_index: 1,
			info: AttributeInfo::ConstantValue { index: 2 },
		};
		assert_eq!(constant_value.length().unwrap(), 2);

		let source_file = Attribute {
			name_index: 1,
			info: AttributeInfo::SourceFile { sourcefile_index: 2 },
		};
		assert_eq!(source_file.length().unwrap(), 2);
	}

	#[test]
	fn raw_reports_its_byte_count() {
		let raw = Attribute {
			name_index: 1,
			info: AttributeInfo::Raw { bytes: vec![0; 17] },
		};
		assert_eq!(raw.length().unwrap(), 17);
	}

	#[test]
	fn code_length_counts_every_component() {
		let code = Attribute {
			name_index: 1,
			info: AttributeInfo::Code {
				max_stack: 1,
				max_locals: 1,
				// aload_0 (1) + invokespecial u16 (3) + return (1) = 5 bytes
				code: vec![
					instruction("aload_0"),
					instruction("invokespecial"),
					instruction("return"),
				],
				exception_table: vec![ExceptionHandler {
					start_pc: 0,
					end_pc: 4,
					handler_pc: 4,
					catch_type: 0,
				}],
				attributes: vec![Attribute {
					name_index: 2,
					info: AttributeInfo::Raw { bytes: vec![0xAB; 4] },
				}],
			},
		};

		// 12-byte header + 5 code + (2 + 8) handlers + 2 + (6 + 4) nested
		assert_eq!(code.length().unwrap(), 12 + 5 + 10 + 2 + 10);
	}
}
