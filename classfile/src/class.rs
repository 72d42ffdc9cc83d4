//! The top-level class file structure.

use crate::attribute::{Attribute, AttributeInfo};
use crate::pool::ConstantPool;

pub const MAGIC: u32 = 0xCAFE_BABE;

/// An in-memory class file, jvms-4.1. Built by the parser or the assembler,
/// consumed whole by the serializer or the disassembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
	pub magic: u32,
	pub minor_version: u16,
	pub major_version: u16,
	pub const_pool: ConstantPool,
	pub access_flags: u16,
	pub this_class: u16,
	pub super_class: u16,
	pub interfaces: Vec<u16>,
	pub fields: Vec<FieldMethodInfo>,
	pub methods: Vec<FieldMethodInfo>,
	pub attributes: Vec<Attribute>,
}

/// `field_info` and `method_info` share one layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMethodInfo {
	pub access_flags: u16,
	pub name_index: u16,
	pub descriptor_index: u16,
	pub attributes: Vec<Attribute>,
}

impl ClassFile {
	/// The pool index named by a `SourceFile` attribute, if the class has one.
	pub fn source_file_index(&self) -> Option<u16> {
		self.attributes.iter().find_map(|attribute| match attribute.info {
			AttributeInfo::SourceFile { sourcefile_index } => Some(sourcefile_index),
			_ => None,
		})
	}
}
