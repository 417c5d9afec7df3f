//! Packing value lists with a few formats.
//!
//! Run with: cargo run --example simple

use pubpack::{serialize, to_bytes, values};
use serde::Serialize;
use std::error::Error;

#[derive(Serialize)]
struct Marker {
    id: u16,
    x: f32,
    y: f32,
    label: String,
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> Result<(), Box<dyn Error>> {
    let inputs = values![1, 2.5, "hi"];

    // One token per value
    let flat = serialize(&inputs, "cft")?;
    println!("cft   -> {}", hex(&flat));

    // Repeat a span until the values run out
    let repeated = serialize(&values![1, 2, 3, 4], "[c]")?;
    println!("[c]   -> {}", hex(&repeated));

    // Skip a value, then pad with a zero byte
    let skipped = serialize(&values![99, 7], "_0C")?;
    println!("_0C   -> {}", hex(&skipped));

    // Everything as text (the default format)
    let text = serialize(&inputs, "[t]")?;
    println!("[t]   -> {:?}", String::from_utf8_lossy(&text));

    // Rust structs go through serde
    let marker = Marker {
        id: 12,
        x: 0.5,
        y: -1.0,
        label: "entry".to_string(),
    };
    let packed = to_bytes(&marker, "Sfft")?;
    println!("Sfft  -> {}", hex(&packed));

    Ok(())
}
