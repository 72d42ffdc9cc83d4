//! Syntax tree → [`ClassFile`].
//!
//! Directives build up the class skeleton, instructions accumulate into the
//! open method's `Code` attribute. Constructs the assembler recognizes but
//! does not support yet (labels, `.catch`, `.throws`, `.var`, `.line`,
//! symbolic operands beyond the reference-shaped opcodes) are reported as
//! warnings and skipped; they never corrupt what is already built.

use crate::assembler::pool::PoolBuilder;
use crate::ast::{Arg, Node};
use crate::error::{Error, Result};
use classfile::{
	attribute_name, flags, opcode_from_mnemonic, Attribute, AttributeInfo, ClassFile,
	FieldMethodInfo, Instruction, MAGIC,
};
use log::warn;

mod pool;

/// Builds a class file from parsed Jasmin nodes.
pub fn assemble(nodes: Vec<Node>) -> Result<ClassFile> {
	let mut assembler = Assembler::new();
	for node in nodes {
		assembler.node(node)?;
	}
	assembler.finish()
}

struct Assembler {
	pool: PoolBuilder,
	access_flags: u16,
	this_class: u16,
	super_class: u16,
	interfaces: Vec<u16>,
	fields: Vec<FieldMethodInfo>,
	methods: Vec<FieldMethodInfo>,
	attributes: Vec<Attribute>,
	method: Option<MethodBuilder>,
}

struct MethodBuilder {
	access_flags: u16,
	name_index: u16,
	descriptor_index: u16,
	// Jasmin's defaults when no .limit directive is given
	max_stack: u16,
	max_locals: u16,
	code: Vec<Instruction>,
	has_code: bool,
}

impl Assembler {
	fn new() -> Assembler {
		Assembler {
			pool: PoolBuilder::new(),
			access_flags: 0,
			this_class: 0,
			super_class: 0,
			interfaces: Vec::new(),
			fields: Vec::new(),
			methods: Vec::new(),
			attributes: Vec::new(),
			method: None,
		}
	}

	fn node(&mut self, node: Node) -> Result<()> {
		match node {
			Node::Directive { name, params } => self.directive(&name, &params),
			Node::Instruction { name, args } => self.instruction(&name, &args),
			Node::Label { name, body } => {
				warn!("labels are not supported yet, dropping label {name:?} but keeping its body");
				for node in body {
					self.node(node)?;
				}
				Ok(())
			},
		}
	}

	fn directive(&mut self, name: &str, params: &[String]) -> Result<()> {
		match name {
			"class" | "interface" => {
				let (access, rest) = split_access(params);
				let [class_name] = rest else {
					return Err(Error::assemble(format!(
						".{name} takes access words and exactly one name, got {params:?}"
					)));
				};
				self.access_flags |= access;
				if name == "interface" {
					self.access_flags |= flags::ACC_INTERFACE;
				}
				self.this_class = self.pool.put_class(class_name)?;
			},
			"super" => {
				let [class_name] = params else {
					return Err(Error::assemble(format!(
						".super takes exactly one class name, got {params:?}"
					)));
				};
				self.super_class = self.pool.put_class(class_name)?;
			},
			"implements" => {
				let [class_name] = params else {
					return Err(Error::assemble(format!(
						".implements takes exactly one class name, got {params:?}"
					)));
				};
				let index = self.pool.put_class(class_name)?;
				self.interfaces.push(index);
			},
			"source" => {
				let [file] = params else {
					return Err(Error::assemble(format!(
						".source takes exactly one file name, got {params:?}"
					)));
				};
				let name_index = self.pool.put_utf8(attribute_name::SOURCE_FILE)?;
				let sourcefile_index = self.pool.put_utf8(file)?;
				self.attributes.push(Attribute {
					name_index,
					info: AttributeInfo::SourceFile { sourcefile_index },
				});
			},
			"field" => {
				let (access, rest) = split_access(params);
				let [field_name, descriptor] = rest else {
					return Err(Error::assemble(format!(
						".field takes access words, a name and a descriptor, got {params:?}"
					)));
				};
				self.fields.push(FieldMethodInfo {
					access_flags: access,
					name_index: self.pool.put_utf8(field_name)?,
					descriptor_index: self.pool.put_utf8(descriptor)?,
					attributes: Vec::new(),
				});
			},
			"method" => {
				if self.method.is_some() {
					return Err(Error::assemble(
						"a .method directive is already open, missing .end method",
					));
				}
				let (access, rest) = split_access(params);
				let [spec] = rest else {
					return Err(Error::assemble(format!(
						".method takes access words and one name(descriptor), got {params:?}"
					)));
				};
				let (method_name, descriptor) = split_method_spec(spec)?;
				self.method = Some(MethodBuilder {
					access_flags: access,
					name_index: self.pool.put_utf8(method_name)?,
					descriptor_index: self.pool.put_utf8(descriptor)?,
					max_stack: 1,
					max_locals: 1,
					code: Vec::new(),
					has_code: false,
				});
			},
			"limit" => {
				let Some(method) = self.method.as_mut() else {
					return Err(Error::assemble(".limit outside of a method"));
				};
				let [what, value] = params else {
					return Err(Error::assemble(format!(
						".limit takes a kind and a value, got {params:?}"
					)));
				};
				let value = value.parse().map_err(|_| {
					Error::assemble(format!(".limit value {value:?} is not a u16"))
				})?;
				match what.as_str() {
					"stack" => method.max_stack = value,
					"locals" => method.max_locals = value,
					other => {
						return Err(Error::assemble(format!(
							".limit knows stack and locals, not {other:?}"
						)));
					},
				}
				method.has_code = true;
			},
			"end" => {
				if params != ["method"] {
					return Err(Error::assemble(format!(
						".end closes a method, got .end {params:?}"
					)));
				}
				self.end_method()?;
			},
			"catch" | "line" | "throws" | "var" => {
				warn!(".{name} directives are not supported yet, skipping");
			},
			other => {
				// the lexer only produces the names above, but stay graceful
				warn!("unhandled directive .{other}, skipping");
			},
		}
		Ok(())
	}

	fn instruction(&mut self, name: &str, args: &[Arg]) -> Result<()> {
		if self.method.is_none() {
			return Err(Error::assemble(format!("instruction {name:?} outside of a method")));
		}

		let opcode = opcode_from_mnemonic(name)?;
		let mut instruction = Instruction::new(opcode)?;

		if instruction.is_complex() {
			warn!("complex instruction {name:?} is not supported yet, skipping");
			return Ok(());
		}

		match name {
			// reference-shaped operands go through the pool
			"new" | "checkcast" | "instanceof" | "anewarray" => {
				let class_name = expect_str(name, args, 0)?;
				let index = self.pool.put_class(class_name)?;
				instruction.set_operand(0, i32::from(index))?;
			},
			"getstatic" | "putstatic" | "getfield" | "putfield" => {
				let spec = expect_str(name, args, 0)?;
				let descriptor = expect_str(name, args, 1)?;
				let (class_name, field_name) = split_member_spec(spec)?;
				let index = self.pool.put_field_ref(class_name, field_name, descriptor)?;
				instruction.set_operand(0, i32::from(index))?;
			},
			"invokevirtual" | "invokespecial" | "invokestatic" => {
				let spec = expect_str(name, args, 0)?;
				let (path, descriptor) = split_method_spec(spec)?;
				let (class_name, method_name) = split_member_spec(path)?;
				let index = self.pool.put_method_ref(class_name, method_name, descriptor)?;
				instruction.set_operand(0, i32::from(index))?;
			},
			"ldc" => {
				let index = match args.first() {
					Some(Arg::Num(value)) => self.pool.put_integer(*value as i32)?,
					Some(Arg::Str(value)) => self.pool.put_string(value)?,
					None => {
						return Err(Error::assemble("ldc takes a constant argument"));
					},
				};
				if index > u16::from(u8::MAX) {
					return Err(Error::assemble(format!(
						"ldc cannot reach pool index {index}, it only takes one byte"
					)));
				}
				instruction.set_operand(0, i32::from(index))?;
			},
			_ => {
				for i in 0..instruction.n_operands() {
					let Some(arg) = args.get(i) else {
						return Err(Error::assemble(format!(
							"{name:?} wants {} operand(s), got {}",
							instruction.n_operands(),
							args.len()
						)));
					};
					let Arg::Num(value) = arg else {
						warn!("symbolic operand {arg:?} of {name:?} is not supported yet, \
							skipping the instruction");
						return Ok(());
					};
					instruction.set_operand(i, *value as i32)?;
				}
			},
		}

		// the open method was checked before any pool interning happened
		if let Some(method) = self.method.as_mut() {
			method.code.push(instruction);
			method.has_code = true;
		}
		Ok(())
	}

	fn end_method(&mut self) -> Result<()> {
		let Some(method) = self.method.take() else {
			return Err(Error::assemble(".end method without an open .method"));
		};

		let mut attributes = Vec::new();
		if method.has_code {
			let name_index = self.pool.put_utf8(attribute_name::CODE)?;
			attributes.push(Attribute {
				name_index,
				info: AttributeInfo::Code {
					max_stack: method.max_stack,
					max_locals: method.max_locals,
					code: method.code,
					exception_table: Vec::new(),
					attributes: Vec::new(),
				},
			});
		}

		self.methods.push(FieldMethodInfo {
			access_flags: method.access_flags,
			name_index: method.name_index,
			descriptor_index: method.descriptor_index,
			attributes,
		});
		Ok(())
	}

	fn finish(self) -> Result<ClassFile> {
		if self.method.is_some() {
			return Err(Error::assemble("a .method directive was never closed with .end method"));
		}

		Ok(ClassFile {
			magic: MAGIC,
			minor_version: 0,
			major_version: 52,
			const_pool: self.pool.finish(),
			access_flags: self.access_flags,
			this_class: self.this_class,
			super_class: self.super_class,
			interfaces: self.interfaces,
			fields: self.fields,
			methods: self.methods,
			attributes: self.attributes,
		})
	}
}

fn access_flag(word: &str) -> Option<u16> {
	Some(match word {
		"public" => flags::ACC_PUBLIC,
		"private" => flags::ACC_PRIVATE,
		"protected" => flags::ACC_PROTECTED,
		"static" => flags::ACC_STATIC,
		"final" => flags::ACC_FINAL,
		// same bit, class vs method context
		"super" => flags::ACC_SUPER,
		"synchronized" => flags::ACC_SYNCHRONIZED,
		"volatile" => flags::ACC_VOLATILE,
		"transient" => flags::ACC_TRANSIENT,
		"native" => flags::ACC_NATIVE,
		"abstract" => flags::ACC_ABSTRACT,
		_ => return None,
	})
}

/// Splits leading access words off a directive's parameters.
fn split_access(params: &[String]) -> (u16, &[String]) {
	let mut access = 0;
	let mut taken = 0;
	for param in params {
		let Some(flag) = access_flag(param) else { break };
		access |= flag;
		taken += 1;
	}
	(access, &params[taken..])
}

/// Splits `name(descriptor)` at the opening parenthesis; the descriptor keeps it.
fn split_method_spec(spec: &str) -> Result<(&str, &str)> {
	let open = spec.find('(').ok_or_else(|| {
		Error::assemble(format!("{spec:?} is missing its (descriptor)"))
	})?;
	Ok(spec.split_at(open))
}

/// Splits `pkg/Owner/member` into the owner class and the member name.
fn split_member_spec(spec: &str) -> Result<(&str, &str)> {
	spec.rsplit_once('/').ok_or_else(|| {
		Error::assemble(format!("{spec:?} is missing its owner class"))
	})
}

fn expect_str<'a>(name: &str, args: &'a [Arg], i: usize) -> Result<&'a str> {
	args.get(i).and_then(Arg::as_str).ok_or_else(|| {
		Error::assemble(format!("{name:?} wants a symbol as argument {i}, got {args:?}"))
	})
}

#[cfg(test)]
mod testing {
	use super::{split_access, split_member_spec, split_method_spec};

	#[test]
	fn access_words_stop_at_the_first_name() {
		let params: Vec<String> =
			["public", "static", "Main"].iter().map(|s| (*s).to_owned()).collect();

		let (access, rest) = split_access(&params);
		assert_eq!(access, 0x0001 | 0x0008);
		assert_eq!(rest, ["Main".to_owned()]);
	}

	#[test]
	fn method_specs_split_at_the_descriptor() {
		let (name, descriptor) = split_method_spec("main([Ljava/lang/String;)V").unwrap();
		assert_eq!((name, descriptor), ("main", "([Ljava/lang/String;)V"));

		assert!(split_method_spec("nodescriptor").is_err());
	}

	#[test]
	fn member_specs_split_at_the_last_slash() {
		let (class, member) = split_member_spec("java/lang/Object/<init>").unwrap();
		assert_eq!((class, member), ("java/lang/Object", "<init>"));
	}
}
