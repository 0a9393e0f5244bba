//! dircrypt CLI - Password-based in-place encryption
//!
//! Encrypts or decrypts a single file, or every file of a directory tree,
//! in place. Directory roots carry a `.encrypted` flag so a tree is never
//! encrypted twice or "decrypted" while still in plaintext.

use bytesize::ByteSize;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;

use dircrypt::config::{Options, Scheme};
use dircrypt::error::{DircryptError, ErrorCategory, ErrorKind, Result};
use dircrypt::file_ops::{self, FileOutcome, Outcome};
use dircrypt::kdf::DEFAULT_ITERATIONS;
use dircrypt::passphrase::{
    PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader, VerifyingPassphraseReader,
};
use dircrypt::password_store::SaltedPasswordHash;
use dircrypt::walk;

#[derive(Parser)]
#[command(name = "dircrypt")]
#[command(version)]
#[command(about = "Password-based in-place encryption of files and directory trees.", long_about = None)]
struct Cli {
    /// Read password from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Saved password hash; when given, only the saved password is accepted
    #[arg(long, global = true, value_name = "FILE")]
    password_file: Option<PathBuf>,

    /// More logging (-v: info, -vv: debug). RUST_LOG overrides this.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file, or every file under a directory, in place
    #[command(alias = "e")]
    Encrypt {
        /// File or directory to encrypt
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Container format to write
        #[arg(long, value_enum, default_value_t = Format::Binary)]
        format: Format,

        /// PBKDF2 iterations; decryption must use the same value
        #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
        iterations: u32,

        /// Path to leave alone (relative to the tree root); may be repeated
        #[arg(long, value_name = "PATH")]
        ignore: Vec<PathBuf>,
    },

    /// Decrypt a file, or every file under a directory, in place
    #[command(alias = "d")]
    Decrypt {
        /// File or directory to decrypt
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// PBKDF2 iterations used when encrypting
        #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
        iterations: u32,

        /// Path to leave alone (relative to the tree root); may be repeated
        #[arg(long, value_name = "PATH")]
        ignore: Vec<PathBuf>,
    },

    /// Save a salted hash of a new password to --password-file
    SetPassword,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// Framed AES-256-CBC, raw bytes
    Binary,
    /// Framed AES-256-CBC, base64 text
    Armored,
    /// Authenticated token
    Token,
}

impl From<Format> for Scheme {
    fn from(format: Format) -> Self {
        match format {
            Format::Binary => Scheme::Binary,
            Format::Armored => Scheme::Armored,
            Format::Token => Scheme::Token,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Encrypt {
            path,
            format,
            iterations,
            ignore,
        } => {
            let opts = options(iterations, ignore, cli.password_file.as_deref())
                .with_scheme(format.into());
            get_passphrase_reader(cli.passphrase_stdin, cli.password_file.as_deref())
                .and_then(|mut reader| file_ops::encrypt(&path, &opts, &mut *reader))
                .map(|outcome| report(&path, &outcome))
        }
        Commands::Decrypt {
            path,
            iterations,
            ignore,
        } => {
            let opts = options(iterations, ignore, cli.password_file.as_deref());
            get_passphrase_reader(cli.passphrase_stdin, cli.password_file.as_deref())
                .and_then(|mut reader| file_ops::decrypt(&path, &opts, &mut *reader))
                .map(|outcome| report(&path, &outcome))
        }
        Commands::SetPassword => set_password(cli.passphrase_stdin, cli.password_file.as_deref()),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Options for a run. Besides `--ignore`, a walk never touches the
/// password store or the running executable.
fn options(iterations: u32, ignore: Vec<PathBuf>, password_file: Option<&Path>) -> Options {
    let own_files = password_file
        .map(walk::canonical)
        .into_iter()
        .chain(std::env::current_exe().ok().map(|exe| walk::canonical(&exe)));
    ignore
        .into_iter()
        .chain(own_files)
        .fold(Options::default().with_iterations(iterations), |opts, path| {
            opts.with_ignored(path)
        })
}

fn get_passphrase_reader(
    use_stdin: bool,
    password_file: Option<&Path>,
) -> Result<Box<dyn PassphraseReader>> {
    let source: Box<dyn PassphraseReader> = if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalPassphraseReader::new())
    };
    match password_file {
        Some(path) => {
            let store = SaltedPasswordHash::load(path)?;
            debug!(store = %path.display(), "checking password against saved hash");
            Ok(Box::new(VerifyingPassphraseReader::new(source, Box::new(store))))
        }
        None => Ok(source),
    }
}

/// Print what happened; false when any file failed.
fn report(path: &Path, outcome: &Outcome) -> bool {
    match outcome {
        Outcome::File(FileOutcome::Encrypted { bytes }) => {
            println!("Encrypted {} ({})", path.display(), ByteSize(*bytes));
        }
        Outcome::File(FileOutcome::Decrypted { bytes }) => {
            println!("Decrypted {} ({})", path.display(), ByteSize(*bytes));
        }
        Outcome::File(FileOutcome::Skipped(reason)) => {
            println!("Skipped {}: {}", path.display(), reason);
        }
        Outcome::Tree(tree) => {
            println!("{}: {}", path.display(), tree);
            for (skipped, reason) in &tree.skipped {
                println!("  skipped {}: {}", skipped.display(), reason);
            }
            for (failed, err) in &tree.failed {
                eprintln!("  failed {}: {:#}", failed.display(), err);
            }
        }
    }
    outcome.is_clean()
}

fn set_password(use_stdin: bool, password_file: Option<&Path>) -> Result<bool> {
    let path = password_file.ok_or_else(|| {
        DircryptError::new(ErrorCategory::User, "set-password requires --password-file")
    })?;

    let password = if use_stdin {
        ReaderPassphraseReader::new(Box::new(std::io::stdin())).read_passphrase()?
    } else {
        let password = TerminalPassphraseReader::with_prompt("New password (dircrypt): ")
            .read_passphrase()?;
        let confirmation = TerminalPassphraseReader::with_prompt("Confirm password (dircrypt): ")
            .read_passphrase()?;
        if *confirmation != *password {
            return Err(DircryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::PasswordRejected,
                "passwords do not match",
            ));
        }
        password
    };
    if password.is_empty() {
        return Err(DircryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::PasswordRejected,
            "password must not be empty",
        ));
    }

    SaltedPasswordHash::new(&password).save(path)?;
    println!("Saved password to {}", path.display());
    Ok(true)
}
