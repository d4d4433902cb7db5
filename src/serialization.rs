use crate::{L402Error, Macaroon, Result};
use base64::{
    Engine,
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE_NO_PAD},
};

impl Macaroon {
    /// Serializes this macaroon to JSON
    ///
    /// # Example
    /// ```
    /// use ganamos_l402::{Caveat, Macaroon};
    ///
    /// let caveats = vec![Caveat::action("create_post")];
    /// let m = Macaroon::new("post-123", "https://ganamos.earth", b"secret", caveats);
    /// let json = m.to_json().unwrap();
    /// assert!(json.contains("\"condition\":\"action\""));
    /// ```
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| L402Error::SerializationError(e.to_string()))
    }

    /// Serializes this macaroon to pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| L402Error::SerializationError(e.to_string()))
    }

    /// Deserializes a macaroon from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| L402Error::DeserializationError(e.to_string()))
    }

    /// Serializes this macaroon to MessagePack
    pub fn to_msgpack(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec(self).map_err(|e| L402Error::SerializationError(e.to_string()))
    }

    /// Deserializes a macaroon from MessagePack
    pub fn from_msgpack(data: &[u8]) -> Result<Self> {
        rmp_serde::from_slice(data).map_err(|e| L402Error::DeserializationError(e.to_string()))
    }

    /// Transport form used in L402 headers: standard base64 of the JSON encoding
    ///
    /// # Example
    /// ```
    /// use ganamos_l402::Macaroon;
    ///
    /// let original = Macaroon::new("post-123", "https://ganamos.earth", b"secret", vec![]);
    /// let b64 = original.to_base64().unwrap();
    /// assert_eq!(Macaroon::from_base64(&b64).unwrap(), original);
    /// ```
    pub fn to_base64(&self) -> Result<String> {
        let json = self.to_json()?;
        Ok(STANDARD.encode(json.as_bytes()))
    }

    /// Decodes the transport form produced by [`Macaroon::to_base64`]
    ///
    /// Unpadded standard and URL-safe unpadded base64 are accepted too, since
    /// some clients strip padding or re-encode header values that way.
    pub fn from_base64(b64: &str) -> Result<Self> {
        let b64 = b64.trim();
        let bytes = STANDARD
            .decode(b64)
            .or_else(|_| STANDARD_NO_PAD.decode(b64))
            .or_else(|_| URL_SAFE_NO_PAD.decode(b64))
            .map_err(|e| L402Error::DeserializationError(e.to_string()))?;
        let json = std::str::from_utf8(&bytes)
            .map_err(|e| L402Error::DeserializationError(e.to_string()))?;

        Self::from_json(json)
    }

    /// Serializes this macaroon to a hex string (MessagePack encoding)
    pub fn to_hex(&self) -> Result<String> {
        let msgpack = self.to_msgpack()?;
        Ok(hex::encode(msgpack))
    }

    /// Deserializes a macaroon from a hex string (MessagePack encoding)
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let msgpack =
            hex::decode(hex_str).map_err(|e| L402Error::DeserializationError(e.to_string()))?;
        Self::from_msgpack(&msgpack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Caveat;

    const ROOT_KEY: &[u8] = b"secret";

    fn sample() -> Macaroon {
        Macaroon::new(
            "post-123",
            "https://ganamos.earth/api/posts?x=1&y=é",
            ROOT_KEY,
            vec![
                Caveat::action("create_post"),
                Caveat::amount(1010),
                Caveat::expires(1_704_067_200_000),
            ],
        )
    }

    #[test]
    fn test_json_field_names() {
        let value: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(value["identifier"], "post-123");
        assert_eq!(value["caveats"][1]["condition"], "amount");
        assert_eq!(value["caveats"][1]["value"], "1010");
        assert_eq!(value["signature"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn test_json_roundtrip_still_verifies() {
        let decoded = Macaroon::from_json(&sample().to_json().unwrap()).unwrap();
        assert_eq!(decoded, sample());
        assert!(decoded.verify_signature(ROOT_KEY));
    }

    #[test]
    fn test_json_pretty() {
        let json = sample().to_json_pretty().unwrap();
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_base64_roundtrip() {
        let b64 = sample().to_base64().unwrap();
        assert_eq!(Macaroon::from_base64(&b64).unwrap(), sample());
    }

    #[test]
    fn test_base64_accepts_url_safe() {
        let json = sample().to_json().unwrap();
        let url_safe = URL_SAFE_NO_PAD.encode(json.as_bytes());
        assert_eq!(Macaroon::from_base64(&url_safe).unwrap(), sample());
    }

    #[test]
    fn test_base64_accepts_stripped_padding() {
        // Pick a location that makes the JSON length leave a padding remainder
        for extra in 0..3 {
            let location = format!("https://ganamos.earth/api/posts?q={}", "+/".repeat(extra));
            let m = Macaroon::new("post-123", location, ROOT_KEY, vec![Caveat::amount(1010)]);
            let padded = m.to_base64().unwrap();
            let stripped = padded.trim_end_matches('=');
            assert_eq!(Macaroon::from_base64(stripped).unwrap(), m);
        }
    }

    #[test]
    fn test_msgpack_is_compact() {
        let m = sample();
        assert!(m.to_msgpack().unwrap().len() < m.to_json().unwrap().len());
    }

    #[test]
    fn test_hex_roundtrip() {
        let hex_str = sample().to_hex().unwrap();
        assert_eq!(Macaroon::from_hex(&hex_str).unwrap(), sample());
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(Macaroon::from_json("not valid json").is_err());
        assert!(Macaroon::from_json("{\"identifier\":\"x\"}").is_err());
        assert!(Macaroon::from_base64("!!!invalid base64!!!").is_err());
        assert!(Macaroon::from_base64(&STANDARD.encode([0xff, 0xfe])).is_err());
        assert!(Macaroon::from_hex("zzz").is_err());
        assert!(Macaroon::from_msgpack(&[0xff, 0xff, 0xff]).is_err());
    }

    #[test]
    fn test_decode_errors_map_to_bad_request() {
        let err = Macaroon::from_base64("%%%").unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
