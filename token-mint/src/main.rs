use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

/// Mint a signed bearer token for exercising a token-gate deployment.
///
/// Signs with a PEM private key (RS*, PS*, ES*, EdDSA) or a raw shared secret (HS*).
/// The output is a compact JWS on stdout.
#[derive(Parser, Debug)]
#[command(name = "token-mint", version, about)]
struct Args {
    /// Signing algorithm (RS256, ES256, EdDSA, HS256, ...)
    #[arg(long, default_value = "RS256")]
    alg: String,

    /// PEM private key (PKCS#8 or PKCS#1) for asymmetric algorithms
    #[arg(long, value_name = "FILE", conflicts_with = "secret")]
    private_pem: Option<PathBuf>,

    /// Shared secret for HS* algorithms
    #[arg(long)]
    secret: Option<String>,

    /// Key id placed in the token header. Required when the gate reads a JWK set.
    #[arg(long)]
    kid: Option<String>,

    #[arg(long)]
    aud: String,

    #[arg(long)]
    iss: String,

    #[arg(long, default_value = "token-mint")]
    sub: String,

    /// Comma-separated scopes, e.g. "treasure:read,treasure:write"
    #[arg(long, default_value = "")]
    scopes: String,

    /// Lifetime in seconds. Negative values produce an already expired token.
    #[arg(long, default_value_t = 1200, allow_negative_numbers = true)]
    ttl_seconds: i64,
}

fn encoding_key(alg: Algorithm, args: &Args) -> Result<EncodingKey> {
    if let Some(secret) = &args.secret {
        if !matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            bail!("--secret only signs HS256/HS384/HS512");
        }
        return Ok(EncodingKey::from_secret(secret.as_bytes()));
    }

    let Some(path) = &args.private_pem else {
        bail!("either --private-pem or --secret is required");
    };
    let pem = fs::read(path).with_context(|| format!("read {}", path.display()))?;

    let key = match alg {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => EncodingKey::from_rsa_pem(&pem)?,
        Algorithm::ES256 | Algorithm::ES384 => EncodingKey::from_ec_pem(&pem)?,
        Algorithm::EdDSA => EncodingKey::from_ed_pem(&pem)?,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            bail!("{alg:?} needs --secret, not a PEM file")
        }
    };
    Ok(key)
}

fn claims(args: &Args) -> Value {
    let now = chrono::Utc::now().timestamp();
    let scopes: Vec<&str> = args
        .scopes
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    json!({
        "aud": args.aud,
        "iss": args.iss,
        "sub": args.sub,
        "iat": now,
        "exp": now + args.ttl_seconds,
        "scopes": scopes,
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    let alg: Algorithm = args
        .alg
        .parse()
        .with_context(|| format!("unknown algorithm {}", args.alg))?;

    let mut header = Header::new(alg);
    header.kid = args.kid.clone();

    let key = encoding_key(alg, &args)?;
    let token = jsonwebtoken::encode(&header, &claims(&args), &key)?;

    println!("{token}");
    Ok(())
}
