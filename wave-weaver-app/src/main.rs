//! # Wave Weaver Application (Binary)
//!
//! Main executable entry point.

fn main() {
    std::process::exit(match wave_weaver_app::main() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    });
}
