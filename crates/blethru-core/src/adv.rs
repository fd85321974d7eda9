//! Advertisement-data helpers
//!
//! The initiator identifies its peer by walking the AD structures of a scan
//! result and comparing the complete local name against the expected identity
//! string. Malformed records end the walk; a non-matching advertisement is
//! simply not selected.

/// AD type for the complete local name
const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;

/// Whether the advertisement data carries `name` as its complete local name
pub fn local_name_matches(data: &[u8], name: &str) -> bool {
    let mut i = 0;
    while i < data.len() {
        let ad_len = data[i] as usize;
        if ad_len == 0 || i + 1 + ad_len > data.len() {
            // Malformed record, stop walking
            return false;
        }
        let ad_type = data[i + 1];
        let payload = &data[i + 2..i + 1 + ad_len];
        if ad_type == AD_TYPE_COMPLETE_LOCAL_NAME && payload == name.as_bytes() {
            return true;
        }
        i += 1 + ad_len;
    }
    false
}

/// Encode `name` as a single complete-local-name AD structure
pub fn complete_local_name(name: &str) -> Vec<u8> {
    let bytes = name.as_bytes();
    let mut data = Vec::with_capacity(bytes.len() + 2);
    data.push(bytes.len() as u8 + 1);
    data.push(AD_TYPE_COMPLETE_LOCAL_NAME);
    data.extend_from_slice(bytes);
    data
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_name_matches_itself() {
        let data = complete_local_name("Throughput Tester");
        assert!(local_name_matches(&data, "Throughput Tester"));
        assert!(!local_name_matches(&data, "Throughput Teste"));
        assert!(!local_name_matches(&data, "Other Device"));
    }

    #[test]
    fn name_is_found_among_other_records() {
        // Flags record, then the name
        let mut data = vec![0x02, 0x01, 0x06];
        data.extend_from_slice(&complete_local_name("Throughput Tester"));
        assert!(local_name_matches(&data, "Throughput Tester"));
    }

    #[test]
    fn shortened_name_record_does_not_match() {
        // AD type 0x08 is the shortened name; only 0x09 counts
        let mut data = vec![0x06, 0x08];
        data.extend_from_slice(b"Throu");
        assert!(!local_name_matches(&data, "Throu"));
    }

    #[test]
    fn malformed_records_are_rejected() {
        assert!(!local_name_matches(&[], "x"));
        assert!(!local_name_matches(&[0x00, 0x09], "x"));
        // Declared length runs past the end of the data
        assert!(!local_name_matches(&[0x10, 0x09, b'x'], "x"));
    }
}
