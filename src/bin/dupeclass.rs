//! Parses a class file and serializes it back out as `dupe.class` — the
//! round-trip check in executable form.

use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(about = "Parses a class file and writes it back out as dupe.class")]
struct Args {
	/// the class file to duplicate
	file: PathBuf,
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

	let outfile = match File::create("dupe.class") {
		Ok(outfile) => outfile,
		Err(err) => {
			eprintln!("unable to create output file: {err}");
			return -4;
		},
	};
	let mut writer = BufWriter::new(outfile);

	let before = Instant::now();
	if let Err(err) = classfile::serialize_class_file(&mut writer, &class) {
		eprintln!("serialization error: {err}");
		return -5;
	}
	if let Err(err) = writer.flush() {
		eprintln!("serialization error: {err}");
		return -5;
	}
	let elapsed = before.elapsed();

	println!(
		"Serialized class in ~{:.3} milliseconds",
		elapsed.as_secs_f64() * 1000.0
	);
	0
}

fn open_input(path: &Path) -> anyhow::Result<(BufReader<File>, u64)> {
	let file = File::open(path).with_context(|| format!("unable to open {}", path.display()))?;
	let size = file.metadata().map(|m| m.len()).unwrap_or(0);
	Ok((BufReader::new(file), size))
}
