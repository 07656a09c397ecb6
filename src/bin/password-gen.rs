use clap::Parser;
use rand::distributions::Alphanumeric;
use rand::Rng;

use file_rbac::auth::{encode_password, HashingError};

const GENERATED_SALT_LEN: usize = 32;

#[derive(Parser)]
#[command(name = "password-gen")]
#[command(
    about = "Generate a salt:iterations:hash password string for the credentials file",
    long_about = None
)]
struct Cli {
    /// Password to hash
    #[arg(short, long, value_parser = non_empty)]
    password: String,

    /// Salt, a random one is generated when omitted
    #[arg(short, long)]
    salt: Option<String>,

    /// PBKDF2 iteration count
    #[arg(short, long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..))]
    iterations: u32,

    /// Print only the password string
    #[arg(short, long)]
    quiet: bool,
}

fn non_empty(value: &str) -> Result<String, String> {
    if value.is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(value.to_string())
    }
}

fn generate_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SALT_LEN)
        .map(char::from)
        .collect()
}

/// Salt actually used and the encoded password string.
fn generate(cli: &Cli) -> Result<(String, String), HashingError> {
    let salt = cli.salt.clone().unwrap_or_else(generate_salt);
    let encoded = encode_password(cli.password.as_bytes(), salt.as_bytes(), cli.iterations)?;
    Ok((salt, encoded))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let (salt, encoded) = generate(&cli)?;

    if cli.quiet {
        println!("{}", encoded);
    } else {
        println!("Iterations: {}", cli.iterations);
        println!("Salt:       {}", salt);
        println!();
        println!("Use this string as the password of a user in credentials.toml:");
        println!("{}", encoded);
    }
    Ok(())
}
