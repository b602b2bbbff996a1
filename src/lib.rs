// Sidereal — a PSID tune playback engine.
//
// Plays .sid music files by emulating the 6502 that the tune's player
// code was written for, and redirecting its stores into the SID
// register window to a chip driver behind the `SidDevice` trait. The
// engine is transport-agnostic: hand it a device and a periodic tick
// and it produces register writes in program order.

pub mod cpu;
pub mod player;
pub mod sid_device;

pub use player::sid_file::SidFile;
pub use player::{PlayState, Player, TickHandle};
pub use sid_device::{ShadowSid, SidDevice};
