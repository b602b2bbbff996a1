// End-to-end playback tests against the virtual SID device.

use sidereal::{Player, ShadowSid, SidFile};

const HEADER_SIZE: usize = 0x7C;

/// Build a PSID image: header, embedded load address, program bytes.
fn build_sid(load: u16, init: u16, play: u16, songs: u8, start_song: u8, program: &[u8]) -> Vec<u8> {
    let mut data = vec![0u8; HEADER_SIZE];
    data[0..4].copy_from_slice(b"PSID");
    data[5] = 0x02;
    data[7] = HEADER_SIZE as u8;
    data[8..10].copy_from_slice(&load.to_be_bytes());
    data[0x0A..0x0C].copy_from_slice(&init.to_be_bytes());
    data[0x0C..0x0E].copy_from_slice(&play.to_be_bytes());
    data[0x0F] = songs;
    data[0x11] = start_song;
    data[0x16..0x16 + 9].copy_from_slice(b"Ode To 64");
    data[0x36..0x36 + 9].copy_from_slice(b"A. Tester");
    data[0x56..0x56 + 4].copy_from_slice(b"1987");
    data.extend_from_slice(&load.to_le_bytes());
    data.extend_from_slice(program);
    data
}

fn bounded_player() -> Player<ShadowSid> {
    let mut player = Player::new(ShadowSid::new());
    player.set_call_budget(Some(10_000));
    player
}

#[test]
fn test_load_single_rts_tune() {
    // Init at $1000 is a lone RTS; play at $1003.
    let data = build_sid(0x1000, 0x1000, 0x1003, 1, 1, &[0x60, 0x00, 0x00, 0x60]);
    let mut player = bounded_player();
    player.load(&data, 0).unwrap();

    assert_eq!(player.num_songs(), 1);
    assert_eq!(player.current_song(), 0);
    assert_eq!(player.cpu().pc, 0x0000);
    assert_eq!(player.title(), "Ode To 64");
    assert_eq!(player.author(), "A. Tester");
    assert_eq!(player.copyright(), "1987");
}

#[test]
fn test_failed_load_leaves_memory_untouched() {
    let good = build_sid(0x1000, 0x1000, 0x1003, 1, 1, &[0x60, 0x00, 0x00, 0x60]);
    let mut player = bounded_player();
    player.load(&good, 0).unwrap();
    let before = player.memory().ram.to_vec();

    let mut bad = good.clone();
    bad[0] = b'X';
    assert!(player.load(&bad, 0).is_err());
    assert!(player.load(&good[..0x40], 0).is_err());
    assert_eq!(player.memory().ram.to_vec(), before);
}

#[test]
fn test_subsong_out_of_range_clamps_to_zero() {
    let data = build_sid(0x1000, 0x1000, 0x1003, 3, 1, &[0x60, 0x00, 0x00, 0x60]);
    let mut player = bounded_player();
    player.load(&data, 5).unwrap();
    assert_eq!(player.current_song(), 0);
}

#[test]
fn test_init_receives_subsong_in_accumulator() {
    // Init: STA $4000; RTS — records the accumulator argument.
    let data = build_sid(0x1000, 0x1000, 0x1004, 3, 1, &[0x8D, 0x00, 0x40, 0x60, 0x60]);
    let mut player = bounded_player();
    player.load(&data, 2).unwrap();
    assert_eq!(player.memory().ram[0x4000], 2);
}

#[test]
fn test_play_gated_on_load() {
    let mut player = bounded_player();
    player.play(true);
    assert!(!player.is_playing());

    let data = build_sid(0x1000, 0x1000, 0x1003, 1, 1, &[0x60, 0x00, 0x00, 0x60]);
    player.load(&data, 0).unwrap();
    player.play(true);
    assert!(player.is_playing());
    player.play(false);
    assert!(!player.is_playing());
}

#[test]
fn test_sid_window_store_forwards_and_reads_back() {
    // Play: LDA #$0F; STA $D404; LDA $D404; STA $4000; RTS
    let play = [
        0xA9, 0x0F, // LDA #$0F
        0x8D, 0x04, 0xD4, // STA $D404
        0xAD, 0x04, 0xD4, // LDA $D404
        0x8D, 0x00, 0x40, // STA $4000
        0x60, // RTS
    ];
    let mut program = vec![0x60, 0x00, 0x00]; // init RTS + padding
    program.extend_from_slice(&play);
    let data = build_sid(0x1000, 0x1000, 0x1003, 1, 1, &program);

    let mut player = bounded_player();
    player.load(&data, 0).unwrap();
    player.play(true);
    player.tick();
    player.update();

    assert_eq!(player.device().writes, 1);
    assert_eq!(player.device().regs[4], 0x0F);
    // The readback saw the committed value.
    assert_eq!(player.memory().ram[0x4000], 0x0F);
}

#[test]
fn test_update_without_tick_is_a_no_op() {
    // Play: INC $4000; RTS — counts invocations.
    let program = [0x60, 0x00, 0x00, 0xEE, 0x00, 0x40, 0x60];
    let data = build_sid(0x1000, 0x1000, 0x1003, 1, 1, &program);
    let mut player = bounded_player();
    player.load(&data, 0).unwrap();
    player.play(true);

    player.update();
    player.update();
    assert_eq!(player.memory().ram[0x4000], 0);
}

#[test]
fn test_ticks_coalesce_to_one_frame() {
    let program = [0x60, 0x00, 0x00, 0xEE, 0x00, 0x40, 0x60];
    let data = build_sid(0x1000, 0x1000, 0x1003, 1, 1, &program);
    let mut player = bounded_player();
    player.load(&data, 0).unwrap();
    player.play(true);

    // Two ticks before the consumer polls: one frame runs, not two.
    player.tick();
    player.tick();
    player.update();
    assert_eq!(player.memory().ram[0x4000], 1);

    // The flag was consumed; the next poll does nothing.
    player.update();
    assert_eq!(player.memory().ram[0x4000], 1);
}

#[test]
fn test_tick_while_stopped_is_not_consumed() {
    let program = [0x60, 0x00, 0x00, 0xEE, 0x00, 0x40, 0x60];
    let data = build_sid(0x1000, 0x1000, 0x1003, 1, 1, &program);
    let mut player = bounded_player();
    player.load(&data, 0).unwrap();

    player.tick();
    player.update();
    assert_eq!(player.memory().ram[0x4000], 0);

    // The pending tick survives until playback starts.
    player.play(true);
    player.update();
    assert_eq!(player.memory().ram[0x4000], 1);
}

#[test]
fn test_tick_handle_raises_from_another_thread() {
    let program = [0x60, 0x00, 0x00, 0xEE, 0x00, 0x40, 0x60];
    let data = build_sid(0x1000, 0x1000, 0x1003, 1, 1, &program);
    let mut player = bounded_player();
    player.load(&data, 0).unwrap();
    player.play(true);

    let handle = player.tick_handle();
    std::thread::spawn(move || handle.raise())
        .join()
        .unwrap();

    player.update();
    assert_eq!(player.memory().ram[0x4000], 1);
}

#[test]
fn test_next_and_prev_song_rerun_init_within_bounds() {
    // Init: STA $4000; RTS — records the subsong index each time.
    let data = build_sid(0x1000, 0x1000, 0x1004, 3, 1, &[0x8D, 0x00, 0x40, 0x60, 0x60]);
    let mut player = bounded_player();
    player.load(&data, 0).unwrap();

    player.next_song();
    assert_eq!(player.current_song(), 1);
    assert_eq!(player.memory().ram[0x4000], 1);

    player.next_song();
    player.next_song(); // already last, no-op
    assert_eq!(player.current_song(), 2);
    assert_eq!(player.memory().ram[0x4000], 2);

    player.prev_song();
    assert_eq!(player.current_song(), 1);
    player.prev_song();
    player.prev_song(); // already first, no-op
    assert_eq!(player.current_song(), 0);
    assert_eq!(player.memory().ram[0x4000], 0);
}

#[test]
fn test_zero_play_address_taken_from_irq_vector() {
    // Init installs $1020 into $0314/$0315, then RTS.
    let init = [
        0xA9, 0x20, // LDA #$20
        0x8D, 0x14, 0x03, // STA $0314
        0xA9, 0x10, // LDA #$10
        0x8D, 0x15, 0x03, // STA $0315
        0x60, // RTS
    ];
    let mut program = init.to_vec();
    program.resize(0x20, 0x00);
    program.extend_from_slice(&[0xEE, 0x00, 0x40, 0x60]); // play at $1020
    let data = build_sid(0x1000, 0x1000, 0x0000, 1, 1, &program);

    let mut player = bounded_player();
    player.load(&data, 0).unwrap();
    assert_eq!(player.play_address(), 0x1020);

    player.play(true);
    player.tick();
    player.update();
    assert_eq!(player.memory().ram[0x4000], 1);
}

#[test]
fn test_hung_play_routine_stops_playback_under_budget() {
    // Play: JMP self.
    let program = [0x60, 0x00, 0x00, 0x4C, 0x03, 0x10];
    let data = build_sid(0x1000, 0x1000, 0x1003, 1, 1, &program);
    let mut player = bounded_player();
    player.load(&data, 0).unwrap();
    player.play(true);
    player.tick();
    player.update();
    assert!(!player.is_playing());
}

#[test]
fn test_parse_exposes_start_song_for_front_ends() {
    let data = build_sid(0x1000, 0x1000, 0x1003, 4, 3, &[0x60, 0x00, 0x00, 0x60]);
    let sid = SidFile::parse(&data).unwrap();
    assert_eq!(sid.start_song, 2);
}
