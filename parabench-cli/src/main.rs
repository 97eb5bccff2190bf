//! Parabench binary entry point.

fn main() {
    if let Err(e) = parabench_cli::run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
