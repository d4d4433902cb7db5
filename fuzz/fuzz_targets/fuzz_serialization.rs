#![no_main]

use ganamos_l402::Macaroon;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // MessagePack decoding must never panic
    if let Ok(token) = Macaroon::from_msgpack(data) {
        let _ = token.to_msgpack();
        let _ = token.to_base64();
        let _ = token.to_json();
        let _ = token.verify_signature(b"fuzz_root_key");
    }

    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(token) = Macaroon::from_base64(s) {
            // Whatever decodes must re-encode to something that decodes to the same value
            let again = Macaroon::from_base64(&token.to_base64().unwrap()).unwrap();
            assert_eq!(token, again);
        }

        if let Ok(token) = Macaroon::from_hex(s) {
            let _ = token.to_msgpack();
        }

        if let Ok(token) = Macaroon::from_json(s) {
            let _ = token.caveat_count();
        }
    }
});
