//! RX Gap Tester - command line entry point

use clap::Parser;
use rx_gap_tester::{
    app::App,
    cli::Cli,
    error::{AppError, ErrorReporter},
};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();
    let verbose = cli.verbose || cli.debug;

    let mut app = match App::new(cli) {
        Ok(app) => app,
        Err(e) => fail(&ErrorReporter::new(false, verbose), e),
    };

    if let Err(e) = app.run().await {
        fail(&ErrorReporter::new(app.use_color(), verbose), e);
    }
}

fn fail(reporter: &ErrorReporter, error: AppError) -> ! {
    reporter.report_error(&error);
    process::exit(error.exit_code());
}
