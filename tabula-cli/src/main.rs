//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = tabula_cli::run() {
        eprintln!("tabula: {err}");
        std::process::exit(1);
    }
}
