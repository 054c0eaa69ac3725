//! Headless runner: the emulator runs on a worker thread and hands frames to
//! the calling thread through a single-slot channel.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, bail, Context, Result};
use chromaboy_common::{frame_channel, FrameBuffer};
use chromaboy_gbc::{EmulatorConfig, GameBoyColor, InstructionUnit, NopCore};

pub const USAGE: &str =
    "Usage: chromaboy <rom> [--boot <path>] [--color] [--frames N] [--dump <out.rgb>]";

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Options {
    pub rom: PathBuf,
    pub boot: Option<PathBuf>,
    pub color: bool,
    pub frames: Option<u64>,
    pub dump: Option<PathBuf>,
}

impl Options {
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        let mut rom = None;
        let mut options = Options::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--boot" => options.boot = Some(PathBuf::from(value_for(&mut args, "--boot")?)),
                "--color" => options.color = true,
                "--frames" => {
                    let value = value_for(&mut args, "--frames")?;
                    let frames = value
                        .parse()
                        .with_context(|| format!("invalid frame count '{value}'"))?;
                    options.frames = Some(frames);
                }
                "--dump" => options.dump = Some(PathBuf::from(value_for(&mut args, "--dump")?)),
                flag if flag.starts_with("--") => bail!("unknown option '{flag}'"),
                path => {
                    if rom.is_some() {
                        bail!("unexpected argument '{path}'");
                    }
                    rom = Some(PathBuf::from(path));
                }
            }
        }

        options.rom = rom.ok_or_else(|| anyhow!("no ROM path given"))?;
        Ok(options)
    }

    fn config(&self) -> EmulatorConfig {
        let builder = EmulatorConfig::builder()
            .color_mode(self.color)
            .skip_boot(self.boot.is_none());
        match self.frames {
            Some(frames) => builder.max_frames(frames).build(),
            None => builder.build(),
        }
    }
}

fn value_for(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("{flag} needs a value"))
}

/// What a finished run produced.
#[derive(Debug)]
pub struct Summary {
    /// Frames the emulator completed.
    pub frames_run: u64,
    /// Frames that reached this thread; the rest were superseded.
    pub frames_received: u64,
    pub last_frame: Option<FrameBuffer>,
}

/// Load the images named in `options` and run until the frame limit or
/// until `stop` is raised.
pub fn run(options: &Options, stop: Arc<AtomicBool>) -> Result<Summary> {
    let rom = std::fs::read(&options.rom)
        .with_context(|| format!("failed to read ROM '{}'", options.rom.display()))?;
    let boot = options
        .boot
        .as_ref()
        .map(|path| {
            std::fs::read(path)
                .with_context(|| format!("failed to read boot image '{}'", path.display()))
        })
        .transpose()?;
    let config = options.config();

    let (sender, receiver) = frame_channel();
    // The machine is single-threaded and never leaves the worker.
    let worker = thread::Builder::new()
        .name("chromaboy-emu".into())
        .spawn(move || -> Result<u64> {
            let mut gbc = GameBoyColor::new(config, NopCore::new());
            if let Some(boot) = &boot {
                gbc.load_boot(boot).context("boot image rejected")?;
            }
            let header = gbc.load_cartridge(&rom).context("cartridge rejected")?;
            log::info!("Running \"{}\"", header.title);
            gbc.link_screen(Box::new(sender));

            gbc.run(&stop).with_context(|| {
                format!(
                    "emulation stopped at frame {} (pc=0x{:04X})",
                    gbc.frames(),
                    gbc.cpu().pc()
                )
            })
        })
        .context("failed to spawn emulator thread")?;

    let mut frames_received = 0u64;
    let mut last_frame = None;
    while let Some(frame) = receiver.recv() {
        frames_received += 1;
        if let Some(previous) = last_frame.replace(frame) {
            receiver.recycle(previous);
        }
    }

    let frames_run = worker
        .join()
        .map_err(|_| anyhow!("emulator thread panicked"))??;
    log::info!("{frames_run} frame(s) run, {frames_received} presented");

    Ok(Summary {
        frames_run,
        frames_received,
        last_frame,
    })
}

/// Raise `stop` once `input` yields a line or reaches end of input.
pub fn stop_on_input<R>(stop: Arc<AtomicBool>, input: R) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut line = String::new();
        if let Err(err) = BufReader::new(input).read_line(&mut line) {
            log::warn!("failed to read stop request: {err}");
        }
        log::info!("stop requested");
        stop.store(true, Ordering::Relaxed);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_all_options() {
        let options = Options::parse(args(&[
            "game.gbc", "--boot", "boot.bin", "--color", "--frames", "30", "--dump", "out.rgb",
        ]))
        .unwrap();
        assert_eq!(
            options,
            Options {
                rom: PathBuf::from("game.gbc"),
                boot: Some(PathBuf::from("boot.bin")),
                color: true,
                frames: Some(30),
                dump: Some(PathBuf::from("out.rgb")),
            }
        );
        let config = options.config();
        assert!(!config.skip_boot);
        assert_eq!(config.max_frames, Some(30));
    }

    #[test]
    fn rom_alone_uses_defaults() {
        let options = Options::parse(args(&["game.gb"])).unwrap();
        assert_eq!(options.rom, PathBuf::from("game.gb"));
        assert_eq!(options.config(), EmulatorConfig::default());
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(Options::parse(args(&[])).is_err());
        assert!(Options::parse(args(&["a.gb", "b.gb"])).is_err());
        assert!(Options::parse(args(&["a.gb", "--frames"])).is_err());
        assert!(Options::parse(args(&["a.gb", "--frames", "ten"])).is_err());
        assert!(Options::parse(args(&["a.gb", "--turbo"])).is_err());
    }

    #[test]
    fn missing_rom_file_is_reported() {
        let options = Options {
            rom: PathBuf::from("/nonexistent/chromaboy.gb"),
            ..Options::default()
        };
        let err = run(&options, Arc::new(AtomicBool::new(false))).unwrap_err();
        assert!(err.to_string().contains("failed to read ROM"));
    }

    #[test]
    fn input_line_raises_the_stop_flag() {
        let stop = Arc::new(AtomicBool::new(false));
        stop_on_input(stop.clone(), std::io::Cursor::new(b"\n".to_vec()))
            .join()
            .unwrap();
        assert!(stop.load(Ordering::Relaxed));
    }

    #[test]
    fn raised_stop_ends_a_run_without_frame_limit() {
        let rom_path =
            std::env::temp_dir().join(format!("chromaboy-stop-{}.gb", std::process::id()));
        std::fs::write(&rom_path, vec![0u8; 0x8000]).unwrap();
        let options = Options {
            rom: rom_path.clone(),
            ..Options::default()
        };

        let summary = run(&options, Arc::new(AtomicBool::new(true)));
        std::fs::remove_file(&rom_path).unwrap();

        let summary = summary.unwrap();
        assert_eq!(summary.frames_run, 0);
        assert_eq!(summary.frames_received, 0);
        assert!(summary.last_frame.is_none());
    }
}
