//! The detailed class file dump: constant pool with resolved references,
//! flag words, and per-method code listings.

use anyhow::Context;
use clap::Parser;
use classfile::{flags, AttributeInfo, ClassFile, Instruction, OperandType, PoolEntry};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(about = "Dumps the structure of a class file")]
struct Args {
	/// the class file to inspect
	file: PathBuf,
	/// also dump constants, interfaces and code
	#[arg(long)]
	details: bool,
	/// print Jasmin disassembly instead of the dump
	#[arg(long)]
	disassemble: bool,
	/// leave out the comment banner when disassembling
	#[arg(long)]
	no_banner: bool,
}

fn main() {
	env_logger::init();
	let args = Args::parse();
	std::process::exit(run(&args));
}

fn run(args: &Args) -> i32 {
	let (mut reader, file_size) = match open_input(&args.file) {
		Ok(input) => input,
		Err(err) => {
			eprintln!("{err:#}");
			return -3;
		},
	};

	let before = Instant::now();
	let class = match classfile::parse_class_file(&mut reader) {
		Ok(class) => class,
		Err(err) => {
			eprintln!("ERROR: {err}");
			return -1;
		},
	};
	let elapsed = before.elapsed();

	println!(
		"Parsed {file_size} bytes in ~{:.3} milliseconds\n",
		elapsed.as_secs_f64() * 1000.0
	);

	if args.disassemble {
		let config = jasmin::DisassemblerConfig {
			disable_header_comments: args.no_banner,
		};
		if let Err(err) = jasmin::disassemble(&class, &mut std::io::stdout(), config) {
			eprintln!("ERROR: {err}");
			return -2;
		}
		return 0;
	}

	print_class_info(&class, args.details);
	0
}

fn open_input(path: &Path) -> anyhow::Result<(BufReader<File>, u64)> {
	let file = File::open(path).with_context(|| format!("unable to open {}", path.display()))?;
	let size = file.metadata().map(|m| m.len()).unwrap_or(0);
	Ok((BufReader::new(file), size))
}

fn print_class_info(class: &ClassFile, details: bool) {
	let pool = &class.const_pool;
	let name_of = |index| pool.lookup_string(index).unwrap_or("???");

	println!("Magic number: {:#010X}", class.magic);
	println!("Classfile version: {}.{}", class.major_version, class.minor_version);
	println!("Const pool size: {}", pool.size());

	if details {
		for (index, slot) in pool.slots() {
			let Some(entry) = slot else { continue };
			print_const_info(index, entry, class);
		}
		println!();
	}

	println!(
		"Access flags: {:#06X} ({})",
		class.access_flags,
		flags::class_flag_names(class.access_flags).join(", ")
	);
	println!("ThisClass: {}", name_of(class.this_class));
	println!("SuperClass: {}", name_of(class.super_class));

	print!("Interfaces count: {}", class.interfaces.len());
	if details {
		for (i, &interface) in class.interfaces.iter().enumerate() {
			print!("\n  Interfaces[{i}] = {interface}");
		}
	}
	println!();

	println!("\nMethods:");
	for method in &class.methods {
		print!(
			"  {} - {} [{}]",
			name_of(method.descriptor_index),
			name_of(method.name_index),
			flags::member_flag_names(method.access_flags).join(", ")
		);

		if details {
			for attribute in &method.attributes {
				let AttributeInfo::Code { ref code, .. } = attribute.info else {
					continue;
				};
				for (i, instruction) in code.iter().enumerate() {
					if i == 0 {
						print!(":");
					}
					print!("\n    ");
					print_instr_info(instruction);
				}
			}
		}
		println!();
	}

	println!("\nFields:");
	for field in &class.fields {
		println!(
			"  {} ({}): {}",
			name_of(field.name_index),
			flags::member_flag_names(field.access_flags).join(", "),
			name_of(field.descriptor_index)
		);
	}
}

fn print_const_info(index: u16, entry: &PoolEntry, class: &ClassFile) {
	let pool = &class.const_pool;
	print!("  ConstPool[{index}] = {}", entry.tag_name());

	match entry {
		PoolEntry::Utf8 { .. } | PoolEntry::Class { .. } | PoolEntry::String { .. } => {
			match pool.lookup_string(index) {
				Ok(string) => println!(": {string:?}"),
				Err(_) => println!(": ???"),
			}
		},
		PoolEntry::NameAndType { name_index, descriptor_index } => {
			println!(
				": {:?} {}",
				pool.lookup_string(*name_index).unwrap_or("???"),
				pool.lookup_string(*descriptor_index).unwrap_or("???")
			);
		},
		PoolEntry::FieldRef { class_index, .. }
		| PoolEntry::MethodRef { class_index, .. }
		| PoolEntry::InterfaceMethodRef { class_index, .. } => {
			println!(
				": {} ({})",
				class_index,
				pool.lookup_string(*class_index).unwrap_or("???")
			);
		},
		_ => println!(),
	}
}

fn print_instr_info(instruction: &Instruction) {
	print!("{} ({:#04x})", instruction.mnemonic(), instruction.op());

	if instruction.n_operands() == 0 {
		return;
	}

	print!(": Operands[");
	for i in 0..instruction.n_operands() {
		let ty = match instruction.operand_type(i) {
			Ok(OperandType::U8) => "U8",
			Ok(OperandType::U16) => "U16",
			Ok(OperandType::S8) => "S8",
			Ok(OperandType::S16) => "S16",
			Ok(OperandType::S32) => "S32",
			Err(_) => "???",
		};
		print!("{ty}{{{}}}", instruction.get_operand(i).unwrap_or(0));
		if i + 1 != instruction.n_operands() {
			print!(", ");
		}
	}
	print!("]");
}
