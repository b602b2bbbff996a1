// Playback engine: owns the 6502, the address space and the loaded
// tune's metadata, and turns timer ticks into play-routine calls.
//
// The timer context and the processing loop share exactly one word: the
// pending-tick flag. The timer raises it, `update` consumes it. A tick
// that arrives while another is still pending coalesces with it — the
// engine never queues frames, matching the original player (a consumer
// that falls behind drops frames rather than deferring them).

pub mod memory;
pub mod sid_file;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cpu::Cpu;
use crate::sid_device::SidDevice;
use memory::SidMemory;
use sid_file::{field_to_string, SidFile, FIELD_SIZE};

/// Software IRQ vector; tunes with a zero play field install their play
/// routine here during init.
const IRQ_VECTOR_LO: u16 = 0x0314;
const IRQ_VECTOR_HI: u16 = 0x0315;

/// Playback state. Loading does not change it; `play` gates on a
/// successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
}

/// Cloneable handle the timer context uses to raise the pending-tick
/// flag. The flag is the only state shared across contexts.
#[derive(Debug, Clone)]
pub struct TickHandle(Arc<AtomicBool>);

impl TickHandle {
    /// Raise the tick flag. Safe to call from any thread or interrupt
    /// context; a flag already raised stays raised (ticks coalesce).
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
//  Player
// ─────────────────────────────────────────────────────────────────────────────

pub struct Player<D: SidDevice> {
    cpu: Cpu<SidMemory<D>>,
    state: PlayState,
    loaded: bool,
    tick_pending: Arc<AtomicBool>,
    /// Optional step ceiling for init/play calls. None (the default)
    /// runs unbounded like the original engine, so a routine that never
    /// returns hangs the processing loop.
    call_budget: Option<u32>,

    load_address: u16,
    init_address: u16,
    play_address: u16,
    num_songs: u8,
    current_song: u8,
    title: [u8; FIELD_SIZE],
    author: [u8; FIELD_SIZE],
    copyright: [u8; FIELD_SIZE],
}

impl<D: SidDevice> Player<D> {
    pub fn new(device: D) -> Self {
        Self {
            cpu: Cpu::new(SidMemory::new(device)),
            state: PlayState::Stopped,
            loaded: false,
            tick_pending: Arc::new(AtomicBool::new(false)),
            call_budget: None,
            load_address: 0,
            init_address: 0,
            play_address: 0,
            num_songs: 1,
            current_song: 0,
            title: [0; FIELD_SIZE],
            author: [0; FIELD_SIZE],
            copyright: [0; FIELD_SIZE],
        }
    }

    /// Bound every init/play trampoline call to at most `steps`
    /// instructions. Intended for tests and fuzzing; the default is
    /// unbounded.
    pub fn set_call_budget(&mut self, steps: Option<u32>) {
        self.call_budget = steps;
    }

    // ── Loading ──────────────────────────────────────────────────────────

    /// Parse a SID file, copy its program image into the address space
    /// and run the init routine with `subsong` in the accumulator. A
    /// subsong past the file's count falls back to 0. On a parse error
    /// nothing is mutated.
    pub fn load(&mut self, data: &[u8], subsong: u8) -> Result<(), String> {
        let sid = SidFile::parse(data)?;

        self.load_address = sid.load_address;
        self.init_address = sid.init_address;
        self.play_address = sid.play_address;
        self.num_songs = sid.songs;
        self.current_song = if subsong < sid.songs { subsong } else { 0 };
        self.title = sid.title;
        self.author = sid.author;
        self.copyright = sid.copyright;

        self.cpu.memory.clear();
        self.cpu.memory.load(sid.load_address, &sid.payload);
        self.cpu.reset();

        log::info!(
            "loaded \"{}\" by {} — song {}/{} load=${:04X} init=${:04X} play=${:04X}",
            self.title(),
            self.author(),
            self.current_song + 1,
            self.num_songs,
            self.load_address,
            self.init_address,
            self.play_address,
        );

        if !self
            .cpu
            .call(self.init_address, self.current_song, self.call_budget)
        {
            return Err("init routine exceeded the call budget".into());
        }

        // A zero play field means init installed the play routine via
        // the software IRQ vector.
        if self.play_address == 0 {
            let lo = self.cpu.memory.ram[IRQ_VECTOR_LO as usize] as u16;
            let hi = self.cpu.memory.ram[IRQ_VECTOR_HI as usize] as u16;
            self.play_address = (hi << 8) | lo;
            log::debug!("play address from IRQ vector: ${:04X}", self.play_address);
        }

        self.loaded = true;
        Ok(())
    }

    // ── Transport ────────────────────────────────────────────────────────

    /// Start (`true`) or stop playback. Starting is a no-op until a file
    /// has loaded successfully.
    pub fn play(&mut self, play: bool) {
        if play && !self.loaded {
            log::warn!("play requested with no file loaded");
            return;
        }
        self.state = if play {
            PlayState::Playing
        } else {
            PlayState::Stopped
        };
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// Handle for the timer context. Raise it at the tune's frame rate
    /// (50 Hz PAL, 60 Hz NTSC).
    pub fn tick_handle(&self) -> TickHandle {
        TickHandle(Arc::clone(&self.tick_pending))
    }

    /// Raise the pending-tick flag directly (single-threaded callers).
    pub fn tick(&self) {
        self.tick_pending.store(true, Ordering::Release);
    }

    /// Processing-loop entry point: if playing and a tick is pending,
    /// consume it and run one frame of the play routine. An in-flight
    /// frame is never interrupted; a hung play routine hangs here when
    /// no call budget is set.
    pub fn update(&mut self) {
        if self.state == PlayState::Playing && self.tick_pending.swap(false, Ordering::AcqRel) {
            if !self.cpu.call(self.play_address, 0, self.call_budget) {
                log::error!(
                    "play routine at ${:04X} exceeded the call budget, stopping",
                    self.play_address
                );
                self.state = PlayState::Stopped;
            }
        }
    }

    // ── Subsong control ──────────────────────────────────────────────────

    /// Advance to the next subsong; no-op on the last one. The CPU is
    /// reset and init re-runs with the new index in the accumulator.
    pub fn next_song(&mut self) {
        if self.loaded && self.current_song < self.num_songs - 1 {
            let song = self.current_song + 1;
            self.switch_song(song);
        }
    }

    /// Step back to the previous subsong; no-op on the first one.
    pub fn prev_song(&mut self) {
        if self.loaded && self.current_song > 0 {
            let song = self.current_song - 1;
            self.switch_song(song);
        }
    }

    fn switch_song(&mut self, song: u8) {
        self.current_song = song;
        self.cpu.reset();
        log::debug!("subsong {}/{}", song + 1, self.num_songs);
        if !self.cpu.call(self.init_address, song, self.call_budget) {
            log::error!("init routine exceeded the call budget on subsong change");
        }
    }

    // ── Metadata ─────────────────────────────────────────────────────────

    pub fn title(&self) -> String {
        field_to_string(&self.title)
    }

    pub fn author(&self) -> String {
        field_to_string(&self.author)
    }

    pub fn copyright(&self) -> String {
        field_to_string(&self.copyright)
    }

    pub fn num_songs(&self) -> u8 {
        self.num_songs
    }

    pub fn current_song(&self) -> u8 {
        self.current_song
    }

    pub fn play_address(&self) -> u16 {
        self.play_address
    }

    // ── Introspection (tests, visualizers, front ends) ───────────────────

    pub fn device(&self) -> &D {
        &self.cpu.memory.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.cpu.memory.device
    }

    pub fn memory(&self) -> &SidMemory<D> {
        &self.cpu.memory
    }

    pub fn cpu(&self) -> &Cpu<SidMemory<D>> {
        &self.cpu
    }
}
