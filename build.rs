fn main() {
    println!("cargo:rerun-if-env-changed=MOTIONALERT_CONFIG");

    // Host builds (`--no-default-features`) have no ESP-IDF toolchain to forward.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
