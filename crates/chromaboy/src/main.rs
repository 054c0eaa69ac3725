use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use chromaboy::{Options, USAGE};

fn main() -> Result<()> {
    env_logger::init();

    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{err}\n{USAGE}");
            std::process::exit(2);
        }
    };

    let stop = Arc::new(AtomicBool::new(false));
    if options.frames.is_none() {
        eprintln!("Running until Enter is pressed or input closes");
        let _stop_watcher = chromaboy::stop_on_input(stop.clone(), std::io::stdin());
    }

    let summary = chromaboy::run(&options, stop)?;
    println!(
        "{} frame(s) emulated, {} presented",
        summary.frames_run, summary.frames_received
    );

    if let Some(path) = &options.dump {
        let frame = summary
            .last_frame
            .context("no frame was produced to dump")?;
        std::fs::write(path, frame.to_rgb24())
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        println!("Wrote last frame to '{}'", path.display());
    }
    Ok(())
}
