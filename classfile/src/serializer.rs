//! [`ClassFile`] tree → binary class file. The exact adjoint of the parser:
//! serializing a parsed tree reproduces the input bytes.

use crate::attribute::{Attribute, AttributeInfo, ExceptionHandler};
use crate::class::{ClassFile, FieldMethodInfo};
use crate::error::{Error, ErrorContext, Result};
use crate::insn::{Instruction, OperandType};
use crate::pool::{ConstantPool, PoolEntry};
use crate::ClassWrite;
use std::io::Write;

/// Writes one class file to the writer.
///
/// Fails without writing further if a `Code` attribute holds a complex
/// instruction or a recomputed length does not fit its wire field.
pub fn serialize_class_file(writer: &mut impl Write, class: &ClassFile) -> Result<()> {
	writer.write_u32(class.magic)?;
	writer.write_u16(class.minor_version)?;
	writer.write_u16(class.major_version)?;

	serialize_constant_pool(writer, &class.const_pool)
		.context("while serializing constant pool")?;

	writer.write_u16(class.access_flags)?;
	writer.write_u16(class.this_class)?;
	writer.write_u16(class.super_class)?;

	writer.write_slice(
		&class.interfaces,
		|w, n| w.write_usize_as_u16(n),
		|w, &interface| w.write_u16(interface),
	)?;

	writer
		.write_slice(
			&class.fields,
			|w, n| w.write_usize_as_u16(n),
			|w, field| serialize_field_method(w, field),
		)
		.context("while serializing fields")?;

	writer
		.write_slice(
			&class.methods,
			|w, n| w.write_usize_as_u16(n),
			|w, method| serialize_field_method(w, method),
		)
		.context("while serializing methods")?;

	writer
		.write_slice(
			&class.attributes,
			|w, n| w.write_usize_as_u16(n),
			|w, attribute| serialize_attribute(w, attribute),
		)
		.context("while serializing class attributes")?;

	Ok(())
}

fn serialize_constant_pool(writer: &mut impl ClassWrite, pool: &ConstantPool) -> Result<()> {
	writer.write_u16(pool.count())?;

	// Placeholder slots write no bytes; they are only accounted for in the count.
	for entry in pool.iter() {
		serialize_constant(writer, entry)?;
	}

	Ok(())
}

fn serialize_constant(writer: &mut impl ClassWrite, entry: &PoolEntry) -> Result<()> {
	writer.write_u8(entry.tag())?;

	match entry {
		PoolEntry::Utf8 { bytes } => {
			writer
				.write_usize_as_u16(bytes.len())
				.context("while writing the length of a Utf8 constant")?;
			writer.write_u8_slice(bytes)?;
		},
		PoolEntry::Integer { bytes } | PoolEntry::Float { bytes } => {
			writer.write_u32(*bytes)?;
		},
		PoolEntry::Long { high_bytes, low_bytes }
		| PoolEntry::Double { high_bytes, low_bytes } => {
			writer.write_u32(*high_bytes)?;
			writer.write_u32(*low_bytes)?;
		},
		PoolEntry::Class { name_index } => {
			writer.write_u16(*name_index)?;
		},
		PoolEntry::String { string_index } => {
			writer.write_u16(*string_index)?;
		},
		PoolEntry::FieldRef { class_index, name_and_type_index }
		| PoolEntry::MethodRef { class_index, name_and_type_index }
		| PoolEntry::InterfaceMethodRef { class_index, name_and_type_index } => {
			writer.write_u16(*class_index)?;
			writer.write_u16(*name_and_type_index)?;
		},
		PoolEntry::NameAndType { name_index, descriptor_index } => {
			writer.write_u16(*name_index)?;
			writer.write_u16(*descriptor_index)?;
		},
		PoolEntry::MethodHandle { reference_kind, reference_index } => {
			writer.write_u8(*reference_kind)?;
			writer.write_u16(*reference_index)?;
		},
		PoolEntry::MethodType { descriptor_index } => {
			writer.write_u16(*descriptor_index)?;
		},
		PoolEntry::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index } => {
			writer.write_u16(*bootstrap_method_attr_index)?;
			writer.write_u16(*name_and_type_index)?;
		},
	}

	Ok(())
}

fn serialize_field_method(writer: &mut impl ClassWrite, info: &FieldMethodInfo) -> Result<()> {
	writer.write_u16(info.access_flags)?;
	writer.write_u16(info.name_index)?;
	writer.write_u16(info.descriptor_index)?;

	writer.write_slice(
		&info.attributes,
		|w, n| w.write_usize_as_u16(n),
		|w, attribute| serialize_attribute(w, attribute),
	)
}

fn serialize_attribute(writer: &mut impl ClassWrite, attribute: &Attribute) -> Result<()> {
	// The length goes out before the body, so it is computed up front.
	let length = attribute.length()?;

	writer.write_u16(attribute.name_index)?;
	writer.write_u32(length)?;

	match &attribute.info {
		AttributeInfo::ConstantValue { index } => writer.write_u16(*index),
		AttributeInfo::SourceFile { sourcefile_index } => writer.write_u16(*sourcefile_index),
		AttributeInfo::Raw { bytes } => writer.write_u8_slice(bytes),
		AttributeInfo::Code { max_stack, max_locals, code, exception_table, attributes } => {
			serialize_code(writer, *max_stack, *max_locals, code, exception_table, attributes)
		},
	}
}

fn serialize_code(
	writer: &mut impl ClassWrite,
	max_stack: u16,
	max_locals: u16,
	code: &[Instruction],
	exception_table: &[ExceptionHandler],
	attributes: &[Attribute],
) -> Result<()> {
	writer.write_u16(max_stack)?;
	writer.write_u16(max_locals)?;

	let code_length = code.iter().map(|i| u64::from(i.length())).sum::<u64>();
	let code_length = u32::try_from(code_length).map_err(|_| {
		Error::length_mismatch(format!(
			"code length {code_length} does not fit into the u32 length field"
		))
	})?;
	writer.write_u32(code_length)?;

	for instruction in code {
		serialize_instruction(writer, instruction)?;
	}

	writer.write_slice(
		exception_table,
		|w, n| w.write_usize_as_u16(n),
		|w, handler| {
			w.write_u16(handler.start_pc)?;
			w.write_u16(handler.end_pc)?;
			w.write_u16(handler.handler_pc)?;
			w.write_u16(handler.catch_type)
		},
	)?;

	writer.write_slice(
		attributes,
		|w, n| w.write_usize_as_u16(n),
		|w, attribute| serialize_attribute(w, attribute),
	)
}

fn serialize_instruction(writer: &mut impl ClassWrite, instruction: &Instruction) -> Result<()> {
	if instruction.is_complex() {
		return Err(Error::not_implemented(format!(
			"serialization of complex instruction \"{}\"",
			instruction.mnemonic()
		)));
	}

	writer.write_u8(instruction.op())?;

	for i in 0..instruction.n_operands() {
		let value = instruction.get_operand(i)?;
		match instruction.operand_type(i)? {
			OperandType::U8 => writer.write_u8(value as u8)?,
			OperandType::U16 => writer.write_u16(value as u16)?,
			OperandType::S8 => writer.write_i8(value as i8)?,
			OperandType::S16 => writer.write_i16(value as i16)?,
			OperandType::S32 => writer.write_i32(value)?,
		}
	}

	Ok(())
}
