use std::process;

fn main() {
    if let Err(e) = pfsense2unifi::cli::run_with_args(std::env::args_os()) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
