//! [`ClassFile`] → Jasmin text.
//!
//! The textual form is not required to round-trip byte for byte; the goal is
//! the canonical Jasmin opening followed by readable field and method
//! sections.

use crate::error::Result;
use classfile::{flags, AttributeInfo, ClassFile, FieldMethodInfo};
use std::io::Write;

/// Output options, passed explicitly per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisassemblerConfig {
	/// Suppresses the `; Disassembled by …` banner.
	pub disable_header_comments: bool,
}

const CLASS_WORDS: &[(u16, &str)] = &[
	(flags::ACC_PUBLIC, "public"),
	(flags::ACC_FINAL, "final"),
	(flags::ACC_ABSTRACT, "abstract"),
];

const MEMBER_WORDS: &[(u16, &str)] = &[
	(flags::ACC_PUBLIC, "public"),
	(flags::ACC_PRIVATE, "private"),
	(flags::ACC_PROTECTED, "protected"),
	(flags::ACC_STATIC, "static"),
	(flags::ACC_FINAL, "final"),
	(flags::ACC_SYNCHRONIZED, "synchronized"),
	(flags::ACC_VOLATILE, "volatile"),
	(flags::ACC_TRANSIENT, "transient"),
	(flags::ACC_NATIVE, "native"),
	(flags::ACC_ABSTRACT, "abstract"),
];

/// Emits Jasmin text for the class.
pub fn disassemble(
	class: &ClassFile,
	out: &mut impl Write,
	config: DisassemblerConfig,
) -> Result<()> {
	if !config.disable_header_comments {
		writeln!(out, "; Disassembled by jbkit")?;
	}

	writeln!(out, ".bytecode {}.{}", class.major_version, class.minor_version)?;

	if let Some(index) = class.source_file_index() {
		let source = class.const_pool.lookup_string(index)?;
		writeln!(out, ".source {source}")?;
	}

	let keyword = if class.access_flags & flags::ACC_INTERFACE != 0 {
		"interface"
	} else {
		"class"
	};
	write!(out, ".{keyword}")?;
	write_words(out, class.access_flags, CLASS_WORDS)?;
	if class.this_class != 0 {
		let name = class.const_pool.lookup_string(class.this_class)?;
		write!(out, " {name}")?;
	}
	writeln!(out)?;

	if class.super_class != 0 {
		let name = class.const_pool.lookup_string(class.super_class)?;
		writeln!(out, ".super {name}")?;
	}

	for &interface in &class.interfaces {
		let name = class.const_pool.lookup_string(interface)?;
		writeln!(out, ".implements {name}")?;
	}

	for field in &class.fields {
		disassemble_field(class, field, out)?;
	}

	for method in &class.methods {
		disassemble_method(class, method, out)?;
	}

	Ok(())
}

fn disassemble_field(
	class: &ClassFile,
	field: &FieldMethodInfo,
	out: &mut impl Write,
) -> Result<()> {
	let name = class.const_pool.lookup_string(field.name_index)?;
	let descriptor = class.const_pool.lookup_string(field.descriptor_index)?;

	write!(out, ".field")?;
	write_words(out, field.access_flags, MEMBER_WORDS)?;
	writeln!(out, " {name} {descriptor}")?;
	Ok(())
}

fn disassemble_method(
	class: &ClassFile,
	method: &FieldMethodInfo,
	out: &mut impl Write,
) -> Result<()> {
	let name = class.const_pool.lookup_string(method.name_index)?;
	let descriptor = class.const_pool.lookup_string(method.descriptor_index)?;

	writeln!(out)?;
	write!(out, ".method")?;
	write_words(out, method.access_flags, MEMBER_WORDS)?;
	writeln!(out, " {name}{descriptor}")?;

	let code = method.attributes.iter().find_map(|attribute| match &attribute.info {
		AttributeInfo::Code { max_stack, max_locals, code, .. } => {
			Some((*max_stack, *max_locals, code))
		},
		_ => None,
	});

	if let Some((max_stack, max_locals, code)) = code {
		writeln!(out, ".limit stack {max_stack}")?;
		writeln!(out, ".limit locals {max_locals}")?;

		for instruction in code {
			write!(out, "\t{}", instruction.mnemonic())?;
			for i in 0..instruction.n_operands() {
				write!(out, " {}", instruction.get_operand(i)?)?;
			}
			writeln!(out)?;
		}
	}

	writeln!(out, ".end method")?;
	Ok(())
}

fn write_words(out: &mut impl Write, access: u16, table: &[(u16, &str)]) -> Result<()> {
	for (bit, word) in table {
		if access & bit != 0 {
			write!(out, " {word}")?;
		}
	}
	Ok(())
}
