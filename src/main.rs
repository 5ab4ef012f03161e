//! Shroud - secure file lifecycle CLI.
//!
//! Packs files into password-protectable archives, splits large files
//! into verified chunks, and securely erases sensitive data.

use clap::{Parser, Subcommand};
use shroud::audit::TracingAudit;
use shroud::hashing::{format_size, HashAlgorithm};
use shroud::{config, Result, Vault, VaultConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "shroud")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Secure file lifecycle toolkit",
    long_about = "Packs files into password-protectable archives, splits large files into verified chunks, and securely erases sensitive data."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack files into a compressed, optionally encrypted archive
    Pack {
        /// Files (or directories with --recursive) to pack
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output archive path
        #[arg(short, long)]
        output: PathBuf,

        /// Encrypt the archive with a prompted password
        #[arg(short, long)]
        encrypt: bool,

        /// Recurse into directory arguments
        #[arg(short, long)]
        recursive: bool,

        /// Compression level (0-9)
        #[arg(long, default_value_t = config::DEFAULT_COMPRESSION_LEVEL)]
        level: u32,
    },

    /// Extract an archive
    Unpack {
        /// Archive to extract
        archive: PathBuf,

        /// Output directory (default: current directory)
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Archive is encrypted; prompt for the password
        #[arg(short, long)]
        encrypted: bool,
    },

    /// Encrypt a single file (writes <file>.shrouded next to it)
    Encrypt {
        /// File to encrypt
        file: PathBuf,
    },

    /// Decrypt a .shrouded file
    Decrypt {
        /// File to decrypt
        file: PathBuf,
    },

    /// Split a file into chunks with a reconstruction manifest
    Split {
        /// File to split
        file: PathBuf,

        /// Chunk size in MiB
        #[arg(long, default_value_t = config::DEFAULT_CHUNK_SIZE_MB)]
        chunk_size: u64,
    },

    /// Reassemble a split file from its manifest
    Join {
        /// Manifest sidecar file
        manifest: PathBuf,
    },

    /// Securely erase a file (multi-pass overwrite, then delete)
    Shred {
        /// File to erase
        file: PathBuf,

        /// Number of overwrite passes
        #[arg(long, default_value_t = config::DEFAULT_SECURE_DELETE_PASSES)]
        passes: u32,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Print a file's content hash
    Hash {
        /// File to hash
        file: PathBuf,

        /// Hash algorithm (sha256, sha512)
        #[arg(long, default_value = "sha256")]
        algorithm: String,
    },

    /// Show file information
    Info {
        /// File to inspect
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Pack {
            files,
            output,
            encrypt,
            recursive,
            level,
        } => cmd_pack(files, &output, encrypt, recursive, level),

        Commands::Unpack {
            archive,
            output,
            encrypted,
        } => cmd_unpack(&archive, &output, encrypted),

        Commands::Encrypt { file } => cmd_encrypt(&file),

        Commands::Decrypt { file } => cmd_decrypt(&file),

        Commands::Split { file, chunk_size } => cmd_split(&file, chunk_size),

        Commands::Join { manifest } => cmd_join(&manifest),

        Commands::Shred {
            file,
            passes,
            force,
        } => cmd_shred(&file, passes, force),

        Commands::Hash { file, algorithm } => cmd_hash(&file, &algorithm),

        Commands::Info { file } => cmd_info(&file),
    }
}

fn prompt_password(prompt: &str) -> String {
    rpassword::prompt_password(prompt).unwrap_or_else(|_| {
        eprint!("{}", prompt);
        io::stderr().flush().unwrap();
        let mut password = String::new();
        io::stdin().read_line(&mut password).unwrap();
        password.trim().to_string()
    })
}

fn cmd_pack(
    files: Vec<PathBuf>,
    output: &PathBuf,
    encrypt: bool,
    recursive: bool,
    level: u32,
) -> Result<()> {
    let config = VaultConfig {
        compression_level: level,
        ..VaultConfig::default()
    };
    let vault = Vault::new(config, Box::new(TracingAudit))?;

    let inputs = if recursive {
        expand_dirs(&files)
    } else {
        files
    };

    let password = if encrypt {
        let password = prompt_password("Enter password: ");
        let confirm = prompt_password("Confirm password: ");
        if password != confirm {
            eprintln!("Passwords do not match");
            std::process::exit(1);
        }
        Some(password)
    } else {
        None
    };

    let summary = vault.build_archive(&inputs, output, password.as_deref())?;

    println!("Archive created: {}", summary.archive_path.display());
    println!("  Files:       {}", summary.file_count);
    println!("  Input size:  {}", format_size(summary.total_size));
    println!("  Output size: {}", format_size(summary.compressed_size));
    println!("  Space saved: {:.1}%", summary.compression_ratio);
    println!(
        "  Encrypted:   {}",
        if summary.encrypted { "yes" } else { "no" }
    );
    if summary.size_warning {
        println!("  Warning: input exceeds the configured size limit");
    }
    if !summary.skipped.is_empty() {
        println!("  Skipped {} invalid input(s):", summary.skipped.len());
        for path in &summary.skipped {
            println!("    {}", path.display());
        }
    }

    Ok(())
}

fn expand_dirs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() {
                    inputs.push(entry.path().to_path_buf());
                }
            }
        } else {
            inputs.push(path.clone());
        }
    }
    inputs
}

fn cmd_unpack(archive: &PathBuf, output: &PathBuf, encrypted: bool) -> Result<()> {
    let vault = Vault::with_defaults();

    let password = if encrypted {
        Some(prompt_password("Password: "))
    } else {
        None
    };

    let extraction = vault.extract_archive(archive, output, password.as_deref())?;

    println!("Extracted {} file(s) to {}", extraction.files.len(), output.display());
    for file in &extraction.files {
        println!("  {}", file.display());
    }
    if let Some(metadata) = &extraction.metadata {
        println!("Archive created {}", metadata.creation_time);
        println!(
            "  {} file(s), {} uncompressed",
            metadata.file_count,
            format_size(metadata.total_size_bytes)
        );
    }

    Ok(())
}

fn cmd_encrypt(file: &PathBuf) -> Result<()> {
    let password = prompt_password("Enter password: ");
    let confirm = prompt_password("Confirm password: ");
    if password != confirm {
        eprintln!("Passwords do not match");
        std::process::exit(1);
    }

    let vault = Vault::with_defaults();
    let output = vault.encrypt_file(file, &password)?;

    println!("Encrypted to {}", output.display());
    Ok(())
}

fn cmd_decrypt(file: &PathBuf) -> Result<()> {
    let password = prompt_password("Password: ");

    let vault = Vault::with_defaults();
    let output = vault.decrypt_file(file, &password)?;

    println!("Decrypted to {}", output.display());
    Ok(())
}

fn cmd_split(file: &PathBuf, chunk_size_mb: u64) -> Result<()> {
    let vault = Vault::with_defaults();
    let result = vault.split_file(file, chunk_size_mb)?;

    match &result.manifest {
        Some(manifest) => {
            println!("Split into {} chunk(s):", result.pieces.len());
            for piece in &result.pieces {
                println!("  {}", piece.display());
            }
            println!("Manifest: {}", manifest.display());
        }
        None => {
            println!(
                "No split needed: {} fits in a single chunk",
                file.display()
            );
        }
    }

    Ok(())
}

fn cmd_join(manifest: &PathBuf) -> Result<()> {
    let vault = Vault::with_defaults();
    let output = vault.join_chunks(manifest)?;

    println!("Reassembled {}", output.display());
    Ok(())
}

fn cmd_shred(file: &PathBuf, passes: u32, force: bool) -> Result<()> {
    if !force {
        eprint!(
            "This will permanently destroy {}. Continue? [y/N] ",
            file.display()
        );
        io::stderr().flush().unwrap();
        let mut input = String::new();
        io::stdin().read_line(&mut input).unwrap();
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted");
            return Ok(());
        }
    }

    let vault = Vault::with_defaults();
    vault.secure_delete_with_passes(file, passes)?;

    println!("Securely erased {} ({} passes)", file.display(), passes);
    Ok(())
}

fn cmd_hash(file: &PathBuf, algorithm: &str) -> Result<()> {
    let algorithm: HashAlgorithm = algorithm.parse()?;

    let vault = Vault::with_defaults();
    let digest = vault.hash_file(file, algorithm)?;

    println!("{}  {}", digest, file.display());
    Ok(())
}

fn cmd_info(file: &PathBuf) -> Result<()> {
    let vault = Vault::with_defaults();
    let descriptor = vault.describe_file(file)?;

    println!("File Information");
    println!("================");
    println!("Path:     {}", descriptor.path.display());
    println!(
        "Size:     {} ({} bytes)",
        format_size(descriptor.size_bytes),
        descriptor.size_bytes
    );
    println!("SHA-256:  {}", descriptor.content_hash);

    Ok(())
}
