use anyhow::{Context, Result};
use clap::Parser;
use hab_camcontrol::{
    CameraRig, FailurePolicy, RigConfig, Scheduler, SchedulerConfig, SerialLink, SystemClock,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serial device connected to the flight computer
    #[arg(short, long, default_value = "/dev/ttyACM0")]
    port: String,

    /// Serial baud rate
    #[arg(short, long, default_value_t = 115200)]
    baud: u32,

    /// Seconds spent reading commands between capture rounds
    #[arg(long, default_value_t = 30)]
    capture_interval: u64,

    /// Milliseconds to pause after each capture
    #[arg(long, default_value_t = 1000)]
    settle_ms: u64,

    /// Milliseconds between serial polls when the link is quiet
    #[arg(long, default_value_t = 50)]
    poll_ms: u64,

    /// Directory that receives photos/ and videos/
    #[arg(short, long, default_value = "media")]
    media_dir: PathBuf,

    /// Video device index of the upward-facing webcam
    #[arg(long, default_value_t = 0)]
    up_device: u32,

    /// Video device index of the downward-facing webcam
    #[arg(long, default_value_t = 1)]
    down_device: u32,

    /// Board camera resolution width
    #[arg(long, default_value_t = 2592)]
    board_width: u32,

    /// Board camera resolution height
    #[arg(long, default_value_t = 1944)]
    board_height: u32,

    /// Board camera warm-up before each still, in milliseconds
    #[arg(long, default_value_t = 2000)]
    board_warmup_ms: u64,

    /// Only mark a webcam as recording when its recorder started successfully
    #[arg(long)]
    confirmed_only: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            poll_window: Duration::from_secs(self.capture_interval),
            settle: Duration::from_millis(self.settle_ms),
            poll_interval: Duration::from_millis(self.poll_ms),
            failure_policy: if self.confirmed_only {
                FailurePolicy::ConfirmedOnly
            } else {
                FailurePolicy::Optimistic
            },
        }
    }

    fn rig_config(&self) -> RigConfig {
        RigConfig {
            media_dir: self.media_dir.clone(),
            up_index: self.up_device,
            down_index: self.down_device,
            board_width: self.board_width,
            board_height: self.board_height,
            board_warmup: Duration::from_millis(self.board_warmup_ms),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("HAB camera control starting");
    tracing::info!("Command link: {} @ {}", args.port, args.baud);
    tracing::info!("Capture interval: {}s", args.capture_interval);

    let config = args.scheduler_config();
    if config.failure_policy == FailurePolicy::ConfirmedOnly {
        tracing::info!("Webcams marked recording only on confirmed start");
    }

    let link = SerialLink::open(&args.port, args.baud, Duration::from_secs(1))
        .context("Failed to open command link")?;

    let rig = CameraRig::new(&args.rig_config()).context("Failed to set up cameras")?;

    let mut scheduler = Scheduler::new(link, rig, SystemClock::new(), config);
    scheduler.run()
}
