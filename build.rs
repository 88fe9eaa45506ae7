use std::env;
use std::f64::consts::PI;
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;

fn write_twiddle_table() {
    const DEPTH: usize = 12;

    let out_dir = env::var_os("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("twiddle_table.rs");
    let mut file = File::create(dest_path).unwrap();

    writeln!(file, "pub(crate) const TWIDDLE_DEPTH: usize = {};", DEPTH).unwrap();
    write!(
        file,
        "pub(crate) const TWIDDLE: [i32; 1 << TWIDDLE_DEPTH] = ["
    )
    .unwrap();

    // Full period cosine in Q1.30 so that `cos(0) = 1 << 30` is representable.
    // Sines are read a quarter period later.
    const AMPLITUDE: f64 = (1u32 << 30) as f64;

    for i in 0..(1 << DEPTH) {
        if i % 8 == 0 {
            write!(file, "\n   ").unwrap();
        }
        let cos = (2. * PI * i as f64 / (1 << DEPTH) as f64).cos();
        write!(file, " {},", (cos * AMPLITUDE).round() as i32).unwrap();
    }
    writeln!(file, "\n];").unwrap();
}

fn main() {
    write_twiddle_table();
    println!("cargo:rerun-if-changed=build.rs");
}
