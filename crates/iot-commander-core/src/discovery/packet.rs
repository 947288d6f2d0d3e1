//! Discovery wire format.
//!
//! Probe (controller to broadcast): `{"action":"discover"}`.
//! Response (device to controller, unicast): `{"deviceName":"<name>"}`.

use serde::Deserialize;

/// Probe payload sent to the subnet broadcast address
pub const PROBE_MESSAGE: &str = r#"{"action":"discover"}"#;

/// A device's answer to a probe
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverResponse {
    pub device_name: String,
}

/// Parse a discovery response datagram.
///
/// Broadcast traffic on a shared subnet is noisy, so callers are expected
/// to drop anything that fails here.
pub fn parse_discover_response(data: &[u8]) -> Result<DiscoverResponse, serde_json::Error> {
    serde_json::from_slice(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let response = parse_discover_response(br#"{"deviceName": "Kitchen lamp"}"#).unwrap();
        assert_eq!(response.device_name, "Kitchen lamp");
    }

    #[test]
    fn test_parse_response_ignores_extra_fields() {
        let response = parse_discover_response(br#"{"deviceName":"A","fw":"1.2"}"#).unwrap();
        assert_eq!(response.device_name, "A");
    }

    #[test]
    fn test_parse_foreign_payloads() {
        let foreign: [&[u8]; 5] = [
            PROBE_MESSAGE.as_bytes(),
            br#"{"deviceName": 7}"#,
            br#"["deviceName"]"#,
            b"M-SEARCH * HTTP/1.1\r\n",
            &[0xff, 0x00, 0x13],
        ];

        for payload in foreign {
            assert!(parse_discover_response(payload).is_err());
        }
    }
}
