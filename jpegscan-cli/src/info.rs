use std::path::Path;

use anyhow::Result;
use jpegscan::DecodeOptions;

use crate::cli::BackendKind;
use crate::decode;

pub fn print_info(input: &Path, backend: BackendKind, options: DecodeOptions) -> Result<()> {
    let info = decode::probe(input, backend, options)?;
    println!("{}", input.display());
    println!("  size:    {}x{}", info.width, info.height);
    println!("  format:  {:?}", info.pixel_format);
    match info.coding_process {
        Some(process) => println!("  process: {process:?}"),
        None => println!("  process: not reported by backend"),
    }
    println!("  stride:  {} bytes", info.stride()?);
    println!("  decoded: {} bytes", info.buffer_len()?);
    Ok(())
}
