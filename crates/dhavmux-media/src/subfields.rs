//! DHAV extended header sub-field table.

/// Widest sub-field strip, in bytes.
pub const SUBFIELD_MAX_LEN: usize = 8;

/// The only sub-field id carrying an 8-byte strip.
const WIDE_SUBFIELD_ID: u8 = 0x88;

/// Standard sub-field strip length.
const SUBFIELD_LEN: usize = 4;

/// Extended header data indexed by sub-field id and byte position.
///
/// Byte 0 of each strip is the id itself. Ids absent from the header read
/// as zero. A repeated id overwrites the earlier strip.
#[derive(Clone)]
pub struct SubfieldTable {
    strips: [[u8; SUBFIELD_MAX_LEN]; 256],
}

impl SubfieldTable {
    /// Parse an extended header blob.
    pub fn parse(ext_header: &[u8]) -> Self {
        let mut strips = [[0u8; SUBFIELD_MAX_LEN]; 256];

        let mut pos = 0;
        while pos < ext_header.len() {
            let id = ext_header[pos];
            let strip_len = if id == WIDE_SUBFIELD_ID {
                SUBFIELD_MAX_LEN
            } else {
                SUBFIELD_LEN
            };
            let end = (pos + strip_len).min(ext_header.len());
            strips[usize::from(id)][..end - pos].copy_from_slice(&ext_header[pos..end]);
            pos = end;
        }

        Self { strips }
    }

    /// Byte `index` of sub-field `id`, zero when absent or out of range.
    pub fn get(&self, id: u8, index: usize) -> u8 {
        self.strips[usize::from(id)].get(index).copied().unwrap_or(0)
    }
}

impl std::fmt::Debug for SubfieldTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (id, strip) in self.strips.iter().enumerate() {
            if strip[0] != 0 {
                map.entry(&id, strip);
            }
        }
        map.finish()
    }
}
