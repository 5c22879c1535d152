fn main() {
    built::write_built_file().expect("failed to collect build metadata");
}
