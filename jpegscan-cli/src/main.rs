use std::{
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
};

use anyhow::Result;
use clap::Parser;
use jpegscan::{DecodeOptions, ErrorPolicy, Limits};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;
mod decode;
mod info;
mod pnm;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = cli::Cli::parse();
    run(&args)
}

fn run(args: &cli::Cli) -> Result<()> {
    let options = decode_options(args);
    if args.info {
        return info::print_info(&args.input, args.backend, options);
    }

    let out_path = match &args.out {
        Some(out) => out.clone(),
        None => default_out(&args.input, args.backend, options.clone())?,
    };
    decode::run_decode(&args.input, &out_path, args.mode, args.backend, options)?;
    println!("Wrote {}", out_path.display());
    Ok(())
}

fn decode_options(args: &cli::Cli) -> DecodeOptions {
    let policy = if args.abort_on_error {
        ErrorPolicy::Abort
    } else {
        ErrorPolicy::Recover
    };
    DecodeOptions::new()
        .limits(Limits {
            max_width: args.max_width,
            max_height: args.max_height,
            max_memory_bytes: args.max_memory,
            ..Limits::default()
        })
        .policy(policy)
}

/// `photo.jpg` becomes `photo.ppm` (or `.pgm`/`.pam`) next to the input.
fn default_out(input: &Path, backend: cli::BackendKind, options: DecodeOptions) -> Result<PathBuf> {
    let info = decode::probe(input, backend, options)?;
    let stem = input.file_stem().unwrap_or_else(|| OsStr::new("decoded"));
    let parent = input.parent().unwrap_or_else(|| Path::new("."));

    let mut filename = stem.to_os_string();
    filename.push(".");
    filename.push(pnm::extension(info.pixel_format));
    Ok(parent.join(filename))
}
