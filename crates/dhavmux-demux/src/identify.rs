//! Source container identification from early stream bytes.

use dhavmux_types::ContainerFormat;
use tracing::{info, warn};

use crate::dhav::{DHAV_MAGIC, DHAV_TRAILER_MAGIC};

/// Marker carried by raw streams from this device family.
const RAW_STREAM_MARKER: &[u8] = b"Dahua_ZH";

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Identify the source container from buffered bytes.
///
/// Returns `None` when the data is not (yet) recognisable.
pub fn identify_format(data: &[u8]) -> Option<ContainerFormat> {
    if contains(data, DHAV_MAGIC) && contains(data, DHAV_TRAILER_MAGIC) {
        info!("Media container: DHAV");
        return Some(ContainerFormat::Dhav);
    }

    if contains(data, RAW_STREAM_MARKER) {
        info!("Media container: raw H.264");
        warn!(
            "Support for this device's media container is experimental. \
             Try changing the device settings from/to \"H.264\" or \"MPEG\""
        );
        return Some(ContainerFormat::RawH264);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_dhav_needs_both_magics() {
        assert_eq!(identify_format(b"..DHAV....dhav.."), Some(ContainerFormat::Dhav));
        assert_eq!(identify_format(b"..DHAV........"), None);
    }

    #[test]
    fn test_identify_raw_marker() {
        let mut data = vec![0x00, 0x00, 0x01, 0xb2];
        data.extend_from_slice(b"Dahua_ZH");
        assert_eq!(identify_format(&data), Some(ContainerFormat::RawH264));
    }

    #[test]
    fn test_identify_unknown() {
        assert_eq!(identify_format(&[]), None);
        assert_eq!(identify_format(&[0u8; 64]), None);
    }
}
