mod live;
mod sinks;

use std::error::Error;
use std::path::PathBuf;
use std::process;

use clap::{error::ErrorKind, CommandFactory, Parser};
use log::info;
use moticam::{CaptureSummary, DeviceSettings, Moticam, OutputMode, SettingsError};

use live::LiveSink;
use sinks::{PngSink, RawSink};

const DEFAULT_COUNT: u32 = 30;

#[derive(Parser, Debug)]
#[command(author, version, about = "Moticam 3+ viewer")]
struct Args {
    /// Output file; PNG images are numbered after it
    #[arg(default_value = "out")]
    out: PathBuf,

    /// Image width (512, 1024 or 2048)
    #[arg(short, long, default_value_t = 1024)]
    width: usize,

    /// Exposure value in milliseconds (1 to 5000)
    #[arg(short, long, value_name = "MS", default_value_t = 100.0)]
    exposure: f64,

    /// Gain value (0.33 to 42.66)
    #[arg(short, long, default_value_t = 1.0)]
    gain: f64,

    /// Number of images to take [default: 30, unlimited with --live]
    #[arg(short = 'n', long, value_name = "N")]
    count: Option<u32>,

    /// Append raw sensor data to the output file instead of writing PNG images
    #[arg(long, conflicts_with = "live")]
    raw: bool,

    /// Show frames in a window until it is closed
    #[arg(short, long)]
    live: bool,
}

impl Args {
    fn settings(&self) -> Result<DeviceSettings, SettingsError> {
        DeviceSettings::from_width(self.width, self.exposure, self.gain)
    }

    fn frame_count(&self) -> Option<u32> {
        match (self.count, self.live) {
            (Some(n), _) => Some(n),
            (None, true) => None,
            (None, false) => Some(DEFAULT_COUNT),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = match args.settings() {
        Ok(settings) => settings,
        Err(err) => Args::command().error(ErrorKind::ValueValidation, err).exit(),
    };

    if let Err(err) = run(&args, &settings) {
        eprintln!("{}: {}", env!("CARGO_PKG_NAME"), err);
        process::exit(1);
    }
}

fn run(args: &Args, settings: &DeviceSettings) -> Result<(), Box<dyn Error>> {
    let count = args.frame_count();
    let camera = Moticam::connect()?;

    let summary = if args.live {
        let mut sink = LiveSink::new(settings.resolution())?;
        camera.run(settings, &mut sink, OutputMode::Color, count)?
    } else if args.raw {
        let mut sink = RawSink::create(&args.out)?;
        let summary = camera.run(settings, &mut sink, OutputMode::Raw, count)?;
        sink.finish()?;
        summary
    } else {
        let mut sink = PngSink::new(&args.out);
        camera.run(settings, &mut sink, OutputMode::Color, count)?
    };

    report(&summary);
    Ok(())
}

fn report(summary: &CaptureSummary) {
    info!(
        "{} frames captured, {} dropped{}",
        summary.frames,
        summary.dropped,
        if summary.cancelled { ", cancelled" } else { "" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use moticam::Resolution;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["moticam_view"]).unwrap();
        assert_eq!(args.out, PathBuf::from("out"));
        assert_eq!(args.frame_count(), Some(30));
        assert_eq!(args.settings().unwrap(), DeviceSettings::default());
    }

    #[test]
    fn live_mode_is_unbounded_unless_counted() {
        let args = Args::try_parse_from(["moticam_view", "--live"]).unwrap();
        assert_eq!(args.frame_count(), None);
        let args = Args::try_parse_from(["moticam_view", "-l", "-n", "5"]).unwrap();
        assert_eq!(args.frame_count(), Some(5));
    }

    #[test]
    fn short_options() {
        let args =
            Args::try_parse_from(["moticam_view", "-w", "2048", "-e", "250", "-g", "4.5", "-n", "3", "shot"])
                .unwrap();
        let settings = args.settings().unwrap();
        assert_eq!(settings.resolution(), Resolution::Full);
        assert_eq!(settings.exposure_ms(), 250.0);
        assert_eq!(settings.gain(), 4.5);
        assert_eq!(args.frame_count(), Some(3));
        assert_eq!(args.out, PathBuf::from("shot"));
    }

    #[test]
    fn bad_values_are_rejected() {
        let args = Args::try_parse_from(["moticam_view", "-w", "640"]).unwrap();
        assert_eq!(args.settings(), Err(SettingsError::Width(640)));
        let args = Args::try_parse_from(["moticam_view", "-e", "0"]).unwrap();
        assert_eq!(args.settings(), Err(SettingsError::Exposure(0.0)));
        let args = Args::try_parse_from(["moticam_view", "-g", "43"]).unwrap();
        assert_eq!(args.settings(), Err(SettingsError::Gain(43.0)));
        assert!(Args::try_parse_from(["moticam_view", "-n", "many"]).is_err());
    }

    #[test]
    fn raw_and_live_conflict() {
        assert!(Args::try_parse_from(["moticam_view", "--raw", "--live"]).is_err());
    }

    #[test]
    fn cli_is_well_formed() {
        Args::command().debug_assert();
    }
}
