// src/main.rs

use tfpilot::{cli, logging, run, PilotError};

#[tokio::main]
async fn main() {
    let code = match run_main().await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("tfpilot error: {err}");
            err.exit_code().filter(|c| *c != 0).unwrap_or(1)
        }
    };
    // A PTY reader still blocked on a grandchild's output must not keep
    // the process alive.
    std::process::exit(code);
}

async fn run_main() -> Result<(), PilotError> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
