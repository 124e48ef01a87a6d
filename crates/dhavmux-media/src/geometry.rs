//! Display aspect and video standard guesses from frame geometry.

/// Frame heights implying an NTSC source.
const NTSC_HEIGHTS: [u32; 5] = [60, 120, 160, 240, 480];

/// Frame heights implying a PAL source.
const PAL_HEIGHTS: [u32; 5] = [72, 144, 192, 288, 576];

/// Frame rates suggesting NTSC when the height is inconclusive.
const NTSC_RATES: [u8; 3] = [15, 30, 60];

/// Guess the display aspect ratio. Anything but 16:9 is taken as 4:3.
///
/// `height` must be non-zero.
pub fn display_aspect(width: u32, height: u32) -> (u32, u32) {
    if u64::from(width) * 1000 / u64::from(height) == 1777 {
        (16, 9)
    } else {
        (4, 3)
    }
}

/// Guess whether the source uses NTSC timings.
pub fn guess_ntsc_timings(height: u32, fps: u8) -> bool {
    if NTSC_HEIGHTS.contains(&height) {
        true
    } else if PAL_HEIGHTS.contains(&height) {
        false
    } else {
        NTSC_RATES.contains(&fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_aspect() {
        assert_eq!(display_aspect(1920, 1080), (16, 9));
        assert_eq!(display_aspect(1280, 720), (16, 9));
        assert_eq!(display_aspect(704, 576), (4, 3));
        assert_eq!(display_aspect(80, 64), (4, 3));
    }

    #[test]
    fn test_ntsc_guess() {
        assert!(guess_ntsc_timings(480, 25));
        assert!(!guess_ntsc_timings(576, 30));
        assert!(guess_ntsc_timings(1080, 30));
        assert!(!guess_ntsc_timings(1080, 25));
        assert!(!guess_ntsc_timings(64, 25));
    }
}
