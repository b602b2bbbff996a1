// CLI front end: plays a .sid file against the virtual SID device,
// pacing frames from a dedicated timer thread the way the engine would
// be driven by a hardware interrupt.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;

use sidereal::{Player, ShadowSid, SidFile};

/// Frame period in microseconds.
const PAL_FRAME_US: u64 = 20_000;
const NTSC_FRAME_US: u64 = 16_667;

#[derive(Parser)]
#[command(name = "sidereal", version, about = "Play a PSID tune against a virtual SID device")]
struct Args {
    /// Path to a .sid file
    file: PathBuf,

    /// Subsong to play, 1-based (defaults to the file's start song)
    #[arg(short, long)]
    song: Option<u8>,

    /// Seconds to play before exiting
    #[arg(short = 't', long, default_value_t = 10)]
    seconds: u64,

    /// Pace frames at the 60 Hz NTSC rate instead of 50 Hz PAL
    #[arg(long)]
    ntsc: bool,
}

fn main() {
    env_logger::init();
    if let Err(e) = run(Args::parse()) {
        eprintln!("sidereal: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), String> {
    let data = std::fs::read(&args.file)
        .map_err(|e| format!("cannot read {}: {e}", args.file.display()))?;

    // Peek at the header so a missing --song falls back to the file's
    // default subsong.
    let sid = SidFile::parse(&data)?;
    let song = match args.song {
        Some(s) => s.saturating_sub(1),
        None => sid.start_song,
    };

    let mut player = Player::new(ShadowSid::new());
    player.load(&data, song)?;

    println!("title:     {}", player.title());
    println!("author:    {}", player.author());
    println!("copyright: {}", player.copyright());
    println!(
        "song:      {}/{}",
        player.current_song() + 1,
        player.num_songs()
    );

    player.play(true);

    // Timer context: raises the pending-tick flag at the frame rate.
    // The flag is the only state shared with the processing loop below.
    let handle = player.tick_handle();
    let frame = Duration::from_micros(if args.ntsc { NTSC_FRAME_US } else { PAL_FRAME_US });
    thread::Builder::new()
        .name("sid-timer".into())
        .spawn(move || {
            let ticker = crossbeam_channel::tick(frame);
            while ticker.recv().is_ok() {
                handle.raise();
            }
        })
        .map_err(|e| format!("cannot spawn timer thread: {e}"))?;

    // Processing loop: consume ticks until the requested duration is up.
    let deadline = Instant::now() + Duration::from_secs(args.seconds);
    while Instant::now() < deadline {
        player.update();
        thread::sleep(Duration::from_millis(1));
    }
    player.play(false);

    println!(
        "{} register writes forwarded, volume {:#03x}",
        player.device().writes,
        player.device().volume()
    );
    Ok(())
}
