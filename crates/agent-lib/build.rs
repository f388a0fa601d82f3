//! Build script for generating protobuf code
//!
//! Code generation only runs with the `proto-gen` feature; otherwise the
//! message types bundled in `src/proto` are used.

use std::path::PathBuf;
use std::process::Command;

const PROTOS: &[&str] = &[
    "../../proto/runtime/v1/api.proto",
    "../../proto/relay/v1/relay.proto",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    for proto in PROTOS {
        println!("cargo:rerun-if-changed={proto}");
    }

    if std::env::var_os("CARGO_FEATURE_PROTO_GEN").is_none() {
        return Ok(());
    }

    // Check if protoc is available
    let protoc_available =
        std::env::var("PROTOC").is_ok() || Command::new("protoc").arg("--version").output().is_ok();

    if !protoc_available {
        println!("cargo:warning=protoc not found, proto-gen feature requires protoc");
        println!("cargo:warning=Install protoc or set PROTOC env var to generate proto code");
        return Ok(());
    }

    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);

    tonic_build::configure()
        .build_server(false) // Agent only needs clients
        .build_client(true)
        .out_dir(&out_dir)
        .compile(PROTOS, &["../../proto"])?;

    Ok(())
}
