#![no_main]

use ganamos_l402::l402::{L402Credential, parse_www_authenticate};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(header) = std::str::from_utf8(data) else {
        return;
    };

    // Header parsing must reject garbage with an error, never a panic
    if let Ok(credential) = L402Credential::parse(header) {
        let reencoded = credential.authorization_header().unwrap();
        assert_eq!(L402Credential::parse(&reencoded).unwrap(), credential);
    }

    let _ = parse_www_authenticate(header);
});
