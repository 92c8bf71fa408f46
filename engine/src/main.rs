//! Panther 命令行入口
//!
//! 用法示例：
//!   panther init
//!   panther encrypt <input> <output> [--key NAME]
//!   panther decrypt <input> <output> [--key NAME]
//!   panther fingerprint <input>
//!   panther keys list | new | remove | import | export | fingerprint
//!   panther passwd
//!
//! 未指定 `--key` 时走快速加密：口令只用一次，不接触密钥库。

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;

use panther::config::{self, Preferences};
use panther::crypto::digest;
use panther::engine::{self, Mode};
use panther::fs::bytes::{ByteStore, FsByteStore};
use panther::password::{self, TerminalPrompt};
use panther::{DefaultPlatform, PantherError, PasswordPrompt, Session, logging};

/// Panther - symmetric encryption with a password-protected key store
#[derive(Parser)]
#[command(name = "panther")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration directory (defaults to $PANTHER_HOME or ~/.panthersleek)
    #[arg(long)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the key store and preferences (happens automatically on first use)
    Init,

    /// Encrypt a file
    Encrypt {
        input: PathBuf,
        output: PathBuf,

        /// Use a named key from the key store instead of a one-off password
        #[arg(short, long)]
        key: Option<String>,

        /// Transformation for quick encryption (overrides preferences)
        #[arg(short, long)]
        algorithm: Option<String>,
    },

    /// Decrypt a file
    Decrypt {
        input: PathBuf,
        output: PathBuf,

        /// Use a named key from the key store instead of a one-off password
        #[arg(short, long)]
        key: Option<String>,

        /// Transformation for quick decryption (overrides preferences)
        #[arg(short, long)]
        algorithm: Option<String>,
    },

    /// Print the digest fingerprint of a file
    Fingerprint {
        input: PathBuf,

        /// Digest algorithm (overrides preferences)
        #[arg(short, long)]
        digest: Option<String>,
    },

    /// Manage named keys
    #[command(subcommand)]
    Keys(KeyCommands),

    /// Change the master password
    Passwd,
}

#[derive(Subcommand)]
enum KeyCommands {
    /// List stored keys
    List,

    /// Generate a new key
    New {
        /// Display name (a free "key-N" name is chosen when omitted)
        name: Option<String>,

        /// Extra entropy mixed into the generated key
        #[arg(long)]
        seed: Option<String>,
    },

    /// Delete a key
    Remove { name: String },

    /// Import a raw key file
    Import { file: PathBuf, name: String },

    /// Export a key's raw bytes (unprotected!)
    Export { name: String, file: PathBuf },

    /// Print a key's fingerprint
    Fingerprint { name: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            match err.downcast_ref::<PantherError>() {
                Some(panther_err) => eprintln!("{}", panther_err.user_message()),
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => config::default_config_dir()?,
    };

    match cli.command {
        Commands::Init => {
            let session = open_session(&config_dir)?;
            println!(
                "Key store ready at {} ({} key(s))",
                session.keystore_path().display(),
                session.keystore().len()
            );
            session.close()?;
        }
        Commands::Encrypt {
            input,
            output,
            key,
            algorithm,
        } => transform(&config_dir, Mode::Encrypt, &input, &output, key, algorithm)?,
        Commands::Decrypt {
            input,
            output,
            key,
            algorithm,
        } => transform(&config_dir, Mode::Decrypt, &input, &output, key, algorithm)?,
        Commands::Fingerprint { input, digest } => {
            let algorithm = match digest {
                Some(name) => name,
                None => load_preferences(&config_dir)?.digest_algorithm,
            };
            let data = FsByteStore.read_all(&input)?;
            println!("{algorithm}: {}", digest::fingerprint(&data, &algorithm)?);
        }
        Commands::Keys(command) => keys(&config_dir, command)?,
        Commands::Passwd => {
            let mut session = open_session(&config_dir)?;
            let prompt = TerminalPrompt;
            let new = prompt
                .prompt("New master password")?
                .ok_or(PantherError::Cancelled)?;
            let confirm = prompt
                .prompt("Confirm password")?
                .ok_or(PantherError::Cancelled)?;
            session.change_password(new, confirm)?;
            println!("Master password changed.");
            session.close()?;
        }
    }

    Ok(())
}

fn keys(config_dir: &Path, command: KeyCommands) -> Result<()> {
    let mut session = open_session(config_dir)?;

    match command {
        KeyCommands::List => {
            for key in session.keystore().keys() {
                println!(
                    "{:>4}  {:<24} {} ({} bits)",
                    key.id(),
                    key.name(),
                    key.algorithm(),
                    key.bits()
                );
            }
        }
        KeyCommands::New { name, seed } => {
            let name = name.unwrap_or_else(|| session.keystore().suggest_name());
            session.create_key(&name, seed.as_deref().map(str::as_bytes))?;
            println!("Created key {name:?}");
        }
        KeyCommands::Remove { name } => {
            if !session.delete_key(&name)? {
                return Err(PantherError::UnknownKey(name).into());
            }
            println!("Removed key {name:?}");
        }
        KeyCommands::Import { file, name } => {
            session.import_key(&file, &name)?;
            println!("Imported key {name:?}");
        }
        KeyCommands::Export { name, file } => {
            session.export_key(&name, &file)?;
            println!("Exported key {name:?} to {}", file.display());
        }
        KeyCommands::Fingerprint { name } => {
            println!(
                "{}: {}",
                session.preferences().digest_algorithm,
                session.key_fingerprint(&name)?
            );
        }
    }

    session.close()?;
    Ok(())
}

fn transform(
    config_dir: &Path,
    mode: Mode,
    input: &Path,
    output: &Path,
    key: Option<String>,
    algorithm: Option<String>,
) -> Result<()> {
    if let Some(name) = key {
        let session = open_session(config_dir)?;
        session.transform_file(mode, &name, input, output)?;
        println!("{mode}ed {} -> {}", input.display(), output.display());
        return Ok(session.close()?);
    }

    let algorithm = match algorithm {
        Some(name) => name,
        None => load_preferences(config_dir)?.encryption_algorithm,
    };
    let data = FsByteStore.read_all(input)?;

    let mut password = match mode {
        Mode::Encrypt => password::prompt_new_password(&TerminalPrompt, "Password")?,
        Mode::Decrypt => TerminalPrompt
            .prompt("Password")?
            .ok_or(PantherError::Cancelled)?,
    };
    let result = engine::transform_with_password(&algorithm, mode, data, &mut password)?;

    FsByteStore.write_all(output, &result)?;
    println!("{mode}ed {} -> {}", input.display(), output.display());
    Ok(())
}

fn open_session(config_dir: &Path) -> Result<Session> {
    Session::open(config_dir, &TerminalPrompt, Box::new(DefaultPlatform))
        .with_context(|| format!("opening key store in {}", config_dir.display()))
}

fn load_preferences(config_dir: &Path) -> Result<Preferences> {
    Ok(Preferences::load_or_create(&config::properties_path(
        config_dir,
    ))?)
}
