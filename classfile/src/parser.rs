//! Binary class file → [`ClassFile`] tree.

use crate::attribute::{attribute_name, Attribute, AttributeInfo, ExceptionHandler};
use crate::class::{ClassFile, FieldMethodInfo};
use crate::error::{Error, ErrorContext, Result};
use crate::insn::{self, Instruction, OperandType};
use crate::pool::{tag, ConstantPool, PoolEntry};
use crate::ClassRead;
use log::warn;
use std::io::{Read, Seek};

/// Decodes one class file from the reader.
///
/// Reads the jvms-4.1 sequence: header, constant pool, access/this/super,
/// interfaces, fields, methods, class attributes. On failure no partial
/// class file is returned; the error names the enclosing item and carries
/// the byte offset where reading went wrong.
pub fn parse_class_file(reader: &mut (impl Read + Seek)) -> Result<ClassFile> {
	let magic = reader.read_u32().context("while reading the magic number")?;
	let minor_version = reader.read_u16()?;
	let major_version = reader.read_u16()?;

	let const_pool = parse_constant_pool(reader).context("while parsing constant pool")?;

	let access_flags = reader.read_u16()?;
	let this_class = reader.read_u16()?;
	let super_class = reader.read_u16()?;

	let interfaces = reader.read_vec(|r| r.read_u16_as_usize(), |r| r.read_u16())?;

	let fields_count = reader.read_u16()?;
	let mut fields = Vec::with_capacity(fields_count as usize);
	for i in 0..fields_count {
		let field = parse_field_method(reader, &const_pool)
			.with_context(|| format!("while parsing field {i}"))?;
		fields.push(field);
	}

	let methods_count = reader.read_u16()?;
	let mut methods = Vec::with_capacity(methods_count as usize);
	for i in 0..methods_count {
		let method = parse_field_method(reader, &const_pool)
			.with_context(|| format!("while parsing method {i}"))?;
		methods.push(method);
	}

	let attributes = parse_attributes(reader, &const_pool)
		.context("while parsing class attributes")?;

	Ok(ClassFile {
		magic,
		minor_version,
		major_version,
		const_pool,
		access_flags,
		this_class,
		super_class,
		interfaces,
		fields,
		methods,
		attributes,
	})
}

fn parse_constant_pool(reader: &mut impl ClassRead) -> Result<ConstantPool> {
	let count = reader.read_u16()?;

	let mut pool = ConstantPool::new();
	pool.reserve(count);

	// `count` is one more than the number of slots; a long or double entry
	// consumes two of them, which `add` accounts for.
	while pool.count() < count {
		let index = pool.count();
		let entry = parse_constant(reader)
			.with_context(|| format!("while parsing constant {index}"))?;
		pool.add(entry);
	}

	Ok(pool)
}

fn parse_constant(reader: &mut impl ClassRead) -> Result<PoolEntry> {
	let pos = reader.marker()?;

	let entry = match reader.read_u8()? {
		tag::UTF8 => {
			let length = reader.read_u16_as_usize()?;
			PoolEntry::Utf8 { bytes: reader.read_u8_vec(length)? }
		},
		tag::INTEGER => PoolEntry::Integer { bytes: reader.read_u32()? },
		tag::FLOAT => PoolEntry::Float { bytes: reader.read_u32()? },
		tag::LONG => PoolEntry::Long {
			high_bytes: reader.read_u32()?,
			low_bytes: reader.read_u32()?,
		},
		tag::DOUBLE => PoolEntry::Double {
			high_bytes: reader.read_u32()?,
			low_bytes: reader.read_u32()?,
		},
		tag::CLASS => PoolEntry::Class { name_index: reader.read_u16()? },
		tag::STRING => PoolEntry::String { string_index: reader.read_u16()? },
		tag::FIELD_REF => PoolEntry::FieldRef {
			class_index: reader.read_u16()?,
			name_and_type_index: reader.read_u16()?,
		},
		tag::METHOD_REF => PoolEntry::MethodRef {
			class_index: reader.read_u16()?,
			name_and_type_index: reader.read_u16()?,
		},
		tag::INTERFACE_METHOD_REF => PoolEntry::InterfaceMethodRef {
			class_index: reader.read_u16()?,
			name_and_type_index: reader.read_u16()?,
		},
		tag::NAME_AND_TYPE => PoolEntry::NameAndType {
			name_index: reader.read_u16()?,
			descriptor_index: reader.read_u16()?,
		},
		tag::METHOD_HANDLE => PoolEntry::MethodHandle {
			reference_kind: reader.read_u8()?,
			reference_index: reader.read_u16()?,
		},
		tag::METHOD_TYPE => PoolEntry::MethodType { descriptor_index: reader.read_u16()? },
		tag::INVOKE_DYNAMIC => PoolEntry::InvokeDynamic {
			bootstrap_method_attr_index: reader.read_u16()?,
			name_and_type_index: reader.read_u16()?,
		},
		tag => return Err(Error::UnknownTag { tag, pos: Some(pos) }),
	};

	Ok(entry)
}

fn parse_field_method(
	reader: &mut impl ClassRead,
	pool: &ConstantPool,
) -> Result<FieldMethodInfo> {
	let access_flags = reader.read_u16()?;
	let name_index = reader.read_u16()?;
	let descriptor_index = reader.read_u16()?;
	let attributes = parse_attributes(reader, pool)?;

	Ok(FieldMethodInfo {
		access_flags,
		name_index,
		descriptor_index,
		attributes,
	})
}

fn parse_attributes(reader: &mut impl ClassRead, pool: &ConstantPool) -> Result<Vec<Attribute>> {
	let count = reader.read_u16()?;
	let mut attributes = Vec::with_capacity(count as usize);
	for i in 0..count {
		let attribute = parse_attribute(reader, pool)
			.with_context(|| format!("while parsing attribute {i}"))?;
		attributes.push(attribute);
	}
	Ok(attributes)
}

fn parse_attribute(reader: &mut impl ClassRead, pool: &ConstantPool) -> Result<Attribute> {
	let pos = reader.marker()?;
	let name_index = reader.read_u16()?;
	let length = reader.read_u32()?;

	let name = pool
		.lookup_string(name_index)
		.context("while resolving the attribute name")?;

	let info = match name {
		attribute_name::CONSTANT_VALUE => {
			AttributeInfo::ConstantValue { index: reader.read_u16()? }
		},
		attribute_name::SOURCE_FILE => {
			AttributeInfo::SourceFile { sourcefile_index: reader.read_u16()? }
		},
		attribute_name::CODE => parse_code(reader, pool)?,
		other => {
			// Unknown attributes are kept, not rejected: the bytes pass
			// through untouched so the file still round-trips.
			warn!("unknown attribute name {other:?} at byte {pos:#x}, keeping {length} byte(s) raw");
			AttributeInfo::Raw { bytes: reader.read_u8_vec(length as usize)? }
		},
	};

	let attribute = Attribute { name_index, info };

	let computed = attribute.length()?;
	if computed != length {
		return Err(Error::length_mismatch(format!(
			"attribute at byte {pos:#x} declares a length of {length} \
			but its body measures {computed} byte(s)"
		)));
	}

	Ok(attribute)
}

fn parse_code(reader: &mut impl ClassRead, pool: &ConstantPool) -> Result<AttributeInfo> {
	let max_stack = reader.read_u16()?;
	let max_locals = reader.read_u16()?;
	let code_length = reader.read_u32()?;

	let mut code = Vec::new();
	let mut parsed = 0u64;
	while parsed < u64::from(code_length) {
		let instruction = parse_instruction(reader)
			.with_context(|| format!("while parsing the instruction at code offset {parsed}"))?;
		parsed += u64::from(instruction.length());
		code.push(instruction);
	}

	if parsed != u64::from(code_length) {
		return Err(Error::length_mismatch(format!(
			"Code declares a code length of {code_length} but {parsed} byte(s) were parsed"
		)));
	}

	let exception_table = reader.read_vec(
		|r| r.read_u16_as_usize(),
		|r| {
			Ok(ExceptionHandler {
				start_pc: r.read_u16()?,
				end_pc: r.read_u16()?,
				handler_pc: r.read_u16()?,
				catch_type: r.read_u16()?,
			})
		},
	)?;

	let attributes = parse_attributes(reader, pool)?;

	Ok(AttributeInfo::Code {
		max_stack,
		max_locals,
		code,
		exception_table,
		attributes,
	})
}

fn parse_instruction(reader: &mut impl ClassRead) -> Result<Instruction> {
	let pos = reader.marker()?;

	let opcode = reader.read_u8()?;
	let Some(info) = insn::lookup(opcode) else {
		return Err(Error::UnknownOpcode { opcode, pos: Some(pos) });
	};

	if info.complex {
		return Err(Error::not_implemented(format!(
			"parsing of complex instruction \"{}\"",
			info.mnemonic
		)));
	}

	let mut instruction = Instruction::new(opcode)?;
	for i in 0..instruction.n_operands() {
		let value = match instruction.operand_type(i)? {
			OperandType::U8 => i32::from(reader.read_u8()?),
			OperandType::U16 => i32::from(reader.read_u16()?),
			OperandType::S8 => i32::from(reader.read_i8()?),
			OperandType::S16 => i32::from(reader.read_i16()?),
			OperandType::S32 => reader.read_i32()?,
		};
		instruction.set_operand(i, value)?;
	}

	Ok(instruction)
}
