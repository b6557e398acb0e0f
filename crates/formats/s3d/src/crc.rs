/// Generator polynomial of the archive's filename CRC (MSB-first CRC-32).
const POLYNOMIAL: u32 = 0x04C1_1DB7;

const TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// CRC stored in the directory for a file name.
///
/// Computed over the name bytes followed by the terminating NUL, with a zero
/// initial value and no final inversion.
pub fn pfs_crc(name: &str) -> u32 {
    name.as_bytes()
        .iter()
        .chain(std::iter::once(&0u8))
        .fold(0u32, |crc, &b| {
            (crc << 8) ^ TABLE[(((crc >> 24) ^ u32::from(b)) & 0xFF) as usize]
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_polynomial() {
        assert_eq!(TABLE[0], 0);
        assert_eq!(TABLE[1], POLYNOMIAL);
    }

    #[test]
    fn empty_name_hashes_terminator_only() {
        assert_eq!(pfs_crc(""), 0);
    }

    #[test]
    fn single_byte_is_table_lookup_then_shift() {
        // "a" followed by NUL: first step yields TABLE[0x61], second shifts it.
        let first = TABLE[0x61];
        let expected = (first << 8) ^ TABLE[(first >> 24) as usize];
        assert_eq!(pfs_crc("a"), expected);
    }

    #[test]
    fn distinct_names_differ() {
        assert_ne!(pfs_crc("gfaydark.wld"), pfs_crc("objects.wld"));
    }
}
