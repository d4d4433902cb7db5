use ganamos_l402::verifier::RequestVerifier;
use ganamos_l402::{Caveat, Macaroon, create_macaroon, verify_macaroon};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    println!("=== Macaroon Basic Usage ===\n");

    // Step 1: Mint a macaroon
    let root_key = b"root-secret-abc";
    let caveats = [
        Caveat::action("create_post"),
        Caveat::amount(1010),
        Caveat::expires(1_704_067_200_000),
    ];
    let location = "https://ganamos.earth/api/posts";
    let macaroon = create_macaroon("post-123", location, root_key, &caveats);

    println!("1. Minted macaroon '{}'", macaroon.identifier);
    println!("   signature: {}", macaroon.signature);
    for (i, caveat) in macaroon.caveats.iter().enumerate() {
        println!("   {}. {}", i + 1, caveat);
    }

    // Step 2: Transport form
    let base64 = macaroon.to_base64()?;
    println!("\n2. Base64: {base64}");

    // Step 3: Decode and check the signature
    let received = Macaroon::from_base64(&base64)?;
    println!("\n3. Signature valid with root key:  {}", verify_macaroon(&received, root_key));
    println!("   Signature valid with wrong key: {}", verify_macaroon(&received, b"wrong-secret"));

    // Step 4: Tampering is detected
    let mut tampered = received.clone();
    tampered.caveats[1] = Caveat::amount(1);
    println!("\n4. Tampered amount verifies: {}", verify_macaroon(&tampered, root_key));

    // Step 5: Enforce the caveats against a request
    let verifier = RequestVerifier::new(1_704_067_100_000)
        .with_action("create_post")
        .with_amount_paid(1010);
    match received.verify(root_key, &verifier) {
        Ok(()) => println!("\n5. ✓ Request authorized"),
        Err(e) => println!("\n5. ✗ Request rejected: {e}"),
    }

    let late = RequestVerifier::new(1_704_067_300_000).with_action("create_post");
    match received.verify(root_key, &late) {
        Ok(()) => println!("   ✗ Unexpectedly accepted an expired token"),
        Err(e) => println!("   ✓ Correctly rejected: {e}"),
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
