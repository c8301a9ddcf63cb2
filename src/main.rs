//! Console front end for the numstream pipeline.
//!
//! Reads integers line by line from stdin, runs them through the positive
//! and multiple-of-three filters into the buffering stage, and prints each
//! value the pipeline emits. Typing `exit` (or pressing Ctrl-C) raises the
//! shared cancellation signal and tears the pipeline down.

use clap::Parser;
use crossbeam::channel::{bounded, Receiver};
use crossbeam::select;
use numstream::{
    logging, BufferConfig, BufferStage, CancelSignal, FilterStage, PipelineBuilder,
};
use std::io::BufRead;
use std::thread;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "numstream",
    version,
    about = "Filter and batch integers read from the console"
)]
struct Cli {
    /// Capacity of the buffering stage's ring buffer
    #[arg(long, default_value_t = 5)]
    buffer_capacity: usize,

    /// Flush interval of the buffering stage, in milliseconds
    #[arg(long, default_value_t = 5000)]
    flush_interval_ms: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let cli = Cli::parse();

    let cancel = CancelSignal::new();
    {
        let cancel = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            tracing::info!("interrupt received");
            cancel.raise();
        }) {
            // Signal handling is best-effort; `exit` still works.
            tracing::warn!(error = %e, "could not install Ctrl-C handler");
        }
    }

    let config = BufferConfig::new(
        cli.buffer_capacity,
        Duration::from_millis(cli.flush_interval_ms),
    );
    let pipeline = PipelineBuilder::new()
        .stage(FilterStage::positive())
        .stage(FilterStage::multiple_of_three())
        .stage(BufferStage::new(config)?)
        .build(cancel.clone())?;

    let source = spawn_console_source(cancel.clone());
    let running = pipeline.start(source);

    consume(&cancel, &running.output());
    running.wait()?;
    Ok(())
}

/// Read integers from stdin into a conduit until `exit` or cancellation.
///
/// Lines that do not parse as integers are reported to the user and never
/// enter the pipeline.
fn spawn_console_source(cancel: CancelSignal) -> Receiver<i64> {
    let (tx, rx) = bounded(0);
    thread::spawn(move || {
        let done = cancel.done();
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case("exit") {
                println!("Exiting");
                cancel.raise();
                break;
            }
            match line.parse::<i64>() {
                Ok(value) => {
                    select! {
                        send(tx, value) -> res => {
                            if res.is_err() {
                                break;
                            }
                        }
                        recv(done) -> _ => break,
                    }
                }
                Err(_) => println!("Only whole numbers are accepted"),
            }
        }
    });
    rx
}

/// Print every value the pipeline emits until cancellation or end of stream.
fn consume(cancel: &CancelSignal, output: &Receiver<i64>) {
    let done = cancel.done();
    loop {
        select! {
            recv(output) -> msg => match msg {
                Ok(value) => println!("Processed data: {value}"),
                Err(_) => break,
            },
            recv(done) -> _ => break,
        }
    }
}
