// PSID container parser.
//
// Fixed 0x7C-byte header: [P|R]SID magic, a data-offset byte at 7,
// big-endian load/init/play addresses at 8-13, subsong count at $0F,
// 1-based default subsong at $11, and three 32-byte ASCII metadata
// fields at $16/$36/$56. The program image follows the header, prefixed
// by a little-endian copy of its own load address; those two bytes are
// authoritative when the header's load field is zero and are always
// excluded from the copied image.

/// Fixed header length; shorter buffers are rejected outright.
pub const HEADER_SIZE: usize = 0x7C;

/// Metadata field capacity: 32 bytes plus a forced null terminator.
pub const FIELD_SIZE: usize = 33;

/// A parsed SID file: resolved entry addresses, metadata, and the
/// program payload ready to copy into the address space.
#[derive(Debug, Clone)]
pub struct SidFile {
    pub load_address: u16,
    pub init_address: u16,
    pub play_address: u16,
    /// Subsong count, at least 1.
    pub songs: u8,
    /// Default subsong, zero-based and already range-checked.
    pub start_song: u8,
    pub title: [u8; FIELD_SIZE],
    pub author: [u8; FIELD_SIZE],
    pub copyright: [u8; FIELD_SIZE],
    pub payload: Vec<u8>,
}

fn read_be_u16(d: &[u8], o: usize) -> u16 {
    ((d[o] as u16) << 8) | d[o + 1] as u16
}

fn read_field(d: &[u8], o: usize) -> [u8; FIELD_SIZE] {
    let mut field = [0u8; FIELD_SIZE];
    field[..32].copy_from_slice(&d[o..o + 32]);
    field
}

/// Render a fixed metadata field up to its first null.
pub fn field_to_string(field: &[u8; FIELD_SIZE]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(FIELD_SIZE);
    String::from_utf8_lossy(&field[..end]).to_string()
}

impl SidFile {
    /// Parse a SID file from raw bytes. Fails on a short buffer or bad
    /// magic without reading anything else, so a failed load leaves the
    /// caller's state untouched.
    pub fn parse(data: &[u8]) -> Result<SidFile, String> {
        if data.len() < HEADER_SIZE {
            return Err(format!(
                "file too small for a SID header ({} < {HEADER_SIZE} bytes)",
                data.len()
            ));
        }

        if (data[0] != b'P' && data[0] != b'R') || &data[1..4] != b"SID" {
            return Err(format!(
                "not a SID file (magic {:02x?})",
                &data[0..4]
            ));
        }

        let data_offset = data[7] as usize;
        if data_offset + 2 > data.len() {
            return Err("data offset past end of file".into());
        }

        let header_load = read_be_u16(data, 0x08);
        let init_address = read_be_u16(data, 0x0A);
        let play_address = read_be_u16(data, 0x0C);

        let songs = data[0x0F].max(1);
        // 1-based in the file; an out-of-range default falls back to 0.
        let start_song = match data[0x11].wrapping_sub(1) {
            s if s < songs => s,
            _ => 0,
        };

        // A zero load field means the image is self-describing: its
        // first two bytes carry the load address, little-endian.
        let embedded = data[data_offset] as u16 | ((data[data_offset + 1] as u16) << 8);
        let load_address = if header_load == 0 { embedded } else { header_load };

        Ok(SidFile {
            load_address,
            init_address,
            play_address,
            songs,
            start_song,
            title: read_field(data, 0x16),
            author: read_field(data, 0x36),
            copyright: read_field(data, 0x56),
            payload: data[data_offset + 2..].to_vec(),
        })
    }

    pub fn title(&self) -> String {
        field_to_string(&self.title)
    }

    pub fn author(&self) -> String {
        field_to_string(&self.author)
    }

    pub fn copyright(&self) -> String {
        field_to_string(&self.copyright)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a minimal PSID image for tests.
    pub fn build_sid(
        load: u16,
        init: u16,
        play: u16,
        songs: u8,
        start_song: u8,
        program: &[u8],
    ) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_SIZE];
        data[0..4].copy_from_slice(b"PSID");
        data[5] = 0x02; // version 2
        data[7] = HEADER_SIZE as u8;
        data[8..10].copy_from_slice(&load.to_be_bytes());
        data[0x0A..0x0C].copy_from_slice(&init.to_be_bytes());
        data[0x0C..0x0E].copy_from_slice(&play.to_be_bytes());
        data[0x0F] = songs;
        data[0x11] = start_song;
        data[0x16..0x16 + 10].copy_from_slice(b"Test Tune\0");
        data[0x36..0x36 + 7].copy_from_slice(b"Nobody\0");
        data[0x56..0x56 + 5].copy_from_slice(b"2024\0");
        // Embedded load address always precedes the image.
        data.extend_from_slice(&load.to_le_bytes());
        data.extend_from_slice(program);
        data
    }

    #[test]
    fn test_parse_valid_header() {
        let data = build_sid(0x1000, 0x1000, 0x1003, 3, 1, &[0x60]);
        let sid = SidFile::parse(&data).unwrap();
        assert_eq!(sid.load_address, 0x1000);
        assert_eq!(sid.init_address, 0x1000);
        assert_eq!(sid.play_address, 0x1003);
        assert_eq!(sid.songs, 3);
        assert_eq!(sid.start_song, 0);
        assert_eq!(sid.payload, vec![0x60]);
        assert_eq!(sid.title(), "Test Tune");
        assert_eq!(sid.author(), "Nobody");
        assert_eq!(sid.copyright(), "2024");
    }

    #[test]
    fn test_rsid_magic_accepted() {
        let mut data = build_sid(0x1000, 0x1000, 0x1003, 1, 1, &[0x60]);
        data[0] = b'R';
        assert!(SidFile::parse(&data).is_ok());
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut data = build_sid(0x1000, 0x1000, 0x1003, 1, 1, &[0x60]);
        data[0] = b'X';
        assert!(SidFile::parse(&data).is_err());

        let mut data = build_sid(0x1000, 0x1000, 0x1003, 1, 1, &[0x60]);
        data[2] = b'X';
        assert!(SidFile::parse(&data).is_err());
    }

    #[test]
    fn test_short_buffer_rejected() {
        let data = build_sid(0x1000, 0x1000, 0x1003, 1, 1, &[0x60]);
        assert!(SidFile::parse(&data[..HEADER_SIZE - 1]).is_err());
        assert!(SidFile::parse(&[]).is_err());
    }

    #[test]
    fn test_zero_load_field_uses_embedded_address() {
        let mut data = build_sid(0x0000, 0x2000, 0x2003, 1, 1, &[0x60]);
        // build_sid embedded 0x0000; patch in the real address.
        data[HEADER_SIZE] = 0x00;
        data[HEADER_SIZE + 1] = 0x20;
        let sid = SidFile::parse(&data).unwrap();
        assert_eq!(sid.load_address, 0x2000);
    }

    #[test]
    fn test_default_song_out_of_range_falls_back_to_zero() {
        // 1-based default of 9 on a 3-song file.
        let data = build_sid(0x1000, 0x1000, 0x1003, 3, 9, &[0x60]);
        let sid = SidFile::parse(&data).unwrap();
        assert_eq!(sid.start_song, 0);

        // A zero byte (invalid: field is 1-based) also falls back.
        let data = build_sid(0x1000, 0x1000, 0x1003, 3, 0, &[0x60]);
        let sid = SidFile::parse(&data).unwrap();
        assert_eq!(sid.start_song, 0);
    }

    #[test]
    fn test_zero_song_count_treated_as_one() {
        let data = build_sid(0x1000, 0x1000, 0x1003, 0, 1, &[0x60]);
        let sid = SidFile::parse(&data).unwrap();
        assert_eq!(sid.songs, 1);
    }

    #[test]
    fn test_metadata_fields_use_full_width_without_null() {
        let mut data = build_sid(0x1000, 0x1000, 0x1003, 1, 1, &[0x60]);
        data[0x16..0x36].copy_from_slice(&[b'A'; 32]);
        let sid = SidFile::parse(&data).unwrap();
        assert_eq!(sid.title(), "A".repeat(32));
    }
}
