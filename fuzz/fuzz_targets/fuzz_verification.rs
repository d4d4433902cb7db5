#![no_main]

use ganamos_l402::{Caveat, create_macaroon, verify_macaroon};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 10 {
        return;
    }

    // Split the data into root key, identifier and caveat material
    let split_point = data.len() / 3;
    let root_key = &data[..split_point];
    let identifier = String::from_utf8_lossy(&data[split_point..split_point * 2]);
    let rest = &data[split_point * 2..];

    let caveats: Vec<Caveat> = rest
        .chunks(8)
        .map(|chunk| {
            let (condition, value) = chunk.split_at(chunk.len() / 2);
            Caveat::new(
                String::from_utf8_lossy(condition),
                String::from_utf8_lossy(value),
            )
        })
        .collect();

    let token = create_macaroon(&identifier, "https://ganamos.earth", root_key, &caveats);
    assert!(verify_macaroon(&token, root_key));

    let mut wrong_key = root_key.to_vec();
    wrong_key.push(0xFF);
    assert!(!verify_macaroon(&token, &wrong_key));

    if !token.caveats.is_empty() {
        let mut tampered = token.clone();
        tampered.caveats.pop();
        assert!(!verify_macaroon(&tampered, root_key));
    }
});
