//! Parses a class file and prints a summary of it.

use anyhow::Context;
use clap::Parser;
use classfile::{flags, ClassFile};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(about = "Parses a class file and prints a summary of it")]
struct Args {
	/// the class file to read
	file: PathBuf,
	/// also dump constants, interfaces and code
	#[arg(long)]
	details: bool,
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
			return -2;
		},
	};

	let before = Instant::now();
	let class = match classfile::parse_class_file(&mut reader) {
		Ok(class) => class,
		Err(err) => {
			eprintln!("parsing error: {err}");
			return -3;
		},
	};
	let elapsed = before.elapsed();

	println!(
		"Parsed {file_size} bytes in ~{:.3} milliseconds",
		elapsed.as_secs_f64() * 1000.0
	);
	print_summary(&class, args.details);
	0
}

fn open_input(path: &Path) -> anyhow::Result<(BufReader<File>, u64)> {
	let file = File::open(path).with_context(|| format!("unable to open {}", path.display()))?;
	let size = file.metadata().map(|m| m.len()).unwrap_or(0);
	Ok((BufReader::new(file), size))
}

fn print_summary(class: &ClassFile, details: bool) {
	let pool = &class.const_pool;
	// the original tools print "???" where a name does not resolve
	let name_of = |index| pool.lookup_string(index).unwrap_or("???");

	println!("Magic number: {:#010X}", class.magic);
	println!("Classfile version: {}.{}", class.major_version, class.minor_version);

	println!("Const pool size: {}", pool.size());
	if details {
		for (index, slot) in pool.slots() {
			let Some(entry) = slot else { continue };
			print!("  ConstPool[{index}] = {}", entry.tag_name());
			if let Ok(string) = pool.lookup_string(index) {
				print!(" {string:?}");
			}
			if let Ok(descriptor) = pool.lookup_descriptor(index) {
				print!(" {descriptor}");
			}
			println!();
		}
	}

	println!(
		"Access flags: {:#06X} ({})",
		class.access_flags,
		flags::class_flag_names(class.access_flags).join(", ")
	);
	println!("ThisClass: {}", name_of(class.this_class));
	println!("SuperClass: {}", name_of(class.super_class));

	println!("Interfaces count: {}", class.interfaces.len());
	if details {
		for (i, &interface) in class.interfaces.iter().enumerate() {
			println!("  Interfaces[{i}] = {} ({})", interface, name_of(interface));
		}
	}

	println!("\nMethods:");
	for method in &class.methods {
		println!(
			"  {} - {} [{}]",
			name_of(method.descriptor_index),
			name_of(method.name_index),
			flags::member_flag_names(method.access_flags).join(", ")
		);
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
