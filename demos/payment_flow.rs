use ganamos_l402::crypto::sha256;
use ganamos_l402::l402::{
    AuthorizationRequest, L402Challenge, L402Config, L402Credential, L402Issuer,
    current_time_ms, parse_www_authenticate,
};
use tracing_subscriber::EnvFilter;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let config = L402Config::from_env().unwrap_or_else(|_| L402Config::new("demo-root-key"));
    let issuer = L402Issuer::new(config)?;

    // Server: an unpaid request gets a 402 with a macaroon and an invoice.
    // The preimage/hash pair stands in for what the Lightning node returns.
    let preimage = [0x5au8; 32];
    let payment_hash = sha256(&preimage);
    let invoice = "lnbc10100n1pdemo";

    let macaroon = issuer.issue(
        "post-123",
        "https://ganamos.earth/api/posts",
        "create_post",
        1010,
        current_time_ms(),
    );
    let challenge = L402Challenge::new(macaroon, invoice, 1010);
    let www_authenticate = challenge.www_authenticate()?;
    println!("HTTP/1.1 402 Payment Required");
    println!("WWW-Authenticate: {www_authenticate}");
    println!("{}\n", challenge.body_json()?);

    // Client: pay the invoice, then retry with the preimage.
    let (macaroon, invoice) = parse_www_authenticate(&www_authenticate)?;
    println!("client pays {invoice}");
    let authorization = L402Credential::new(macaroon, preimage).authorization_header()?;
    println!("Authorization: {authorization}\n");

    // Server: verify the credential against the request.
    let request = AuthorizationRequest {
        action: "create_post".to_string(),
        amount_paid: Some(1010),
        payment_hash,
        now_ms: current_time_ms(),
    };
    match issuer.authorize(&authorization, &request) {
        Ok(authorized) => println!("200 OK: authorized '{}'", authorized.identifier),
        Err(e) => println!("{}: {e}", e.status_code()),
    }

    // A different action with the same credential is refused.
    let wrong = AuthorizationRequest {
        action: "delete_post".to_string(),
        ..request
    };
    if let Err(e) = issuer.authorize(&authorization, &wrong) {
        println!("{}: {e}", e.status_code());
    }

    Ok(())
}
