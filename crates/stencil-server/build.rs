fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/stencil/v1/template_service.proto");
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/stencil/v1/template_service.proto"], &["proto"])?;
    Ok(())
}
