// Main entry point that forwards to the wave-weaver-app binary
fn main() {
    // Exit with the same code as the app
    std::process::exit(match wave_weaver_app::main() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    });
}
