use std::env;
use std::process;

use anyhow::{Context, Result};
use log::error;
use synacor_image::Image;
use synacor_vm::{Engine, StdIo};

fn main() {
    env_logger::init();

    let path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            println!("usage: synacor <program.bin>");
            process::exit(0);
        }
    };

    if let Err(err) = run(&path) {
        error!("{:#}", err);
        eprintln!("synacor: {:#}", err);
        process::exit(1);
    }
}

fn run(path: &str) -> Result<()> {
    let image = Image::from_path(path).with_context(|| format!("failed to load {}", path))?;
    let mut engine = Engine::new(&image.words).context("failed to initialize engine")?;
    let mut io = StdIo::new();

    engine.run(&mut io).context("execution failed")?;

    Ok(())
}
