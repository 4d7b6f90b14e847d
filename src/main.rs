use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use kbuild_ci::clean::{self, CleanOptions};
use kbuild_ci::features::{kernelsu, lxc, nethunter, rekernel};
use kbuild_ci::logging::{default_log_dir, BuildLog};
use kbuild_ci::models::CheckMode;
use kbuild_ci::settings::Settings;
use kbuild_ci::{analyzer, VERSION};

#[derive(Parser)]
#[command(name = "kbuild_ci", version = VERSION, about = "Android kernel CI helper toolkit")]
struct Cli {
    /// Mirror debug-level logs to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a build log and classify its errors
    Analyze {
        /// Log file to analyze (defaults to the configured log file name)
        log_file: Option<PathBuf>,
    },

    /// Clean up build artifacts and temporary files
    Clean {
        /// Kernel source directory
        #[arg(long)]
        kernel_dir: Option<PathBuf>,

        /// Build output directory
        #[arg(long)]
        build_dir: Option<PathBuf>,

        /// Clean downloaded toolchains
        #[arg(long)]
        toolchains: bool,

        /// Clean ccache
        #[arg(long)]
        ccache: bool,

        /// Clean everything including toolchains and ccache
        #[arg(long)]
        all: bool,

        /// Print unset commands for build environment variables
        #[arg(long)]
        env: bool,
    },

    /// LXC/Docker kernel support
    Lxc {
        #[command(subcommand)]
        command: LxcCommands,
    },

    /// Check/fix a kernel config for Kali NetHunter support
    Nethunter {
        /// Path to the kernel config file
        config_file: PathBuf,

        /// Write fixes to the config file
        #[arg(short = 'w')]
        write: bool,
    },

    /// Apply KernelSU Coccinelle patches to a kernel tree
    Kernelsu {
        /// Kernel source directory
        #[arg(long, default_value = ".")]
        kernel_dir: PathBuf,

        /// Semantic patch to apply
        #[arg(long, default_value = kernelsu::DEFAULT_PATCH)]
        patch: String,
    },

    /// Install the Re:Kernel driver into a kernel tree
    Rekernel {
        /// Kernel source directory
        #[arg(long, default_value = ".")]
        kernel_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum LxcCommands {
    /// Check/fix a kernel config for LXC/Docker support
    CheckConfig {
        /// Path to the kernel config file
        config_file: PathBuf,

        /// Write fixes to the config file
        #[arg(short = 'w')]
        write: bool,
    },

    /// Apply the LXC source patches directly
    Patch {
        /// Kernel source directory
        #[arg(long, default_value = ".")]
        kernel_dir: PathBuf,
    },

    /// Download the LXC Coccinelle patches and apply them with spatch
    PatchCocci {
        /// Kernel source directory
        #[arg(long, default_value = ".")]
        kernel_dir: PathBuf,
    },
}

fn check_mode(write: bool) -> CheckMode {
    if write {
        CheckMode::Write
    } else {
        CheckMode::Check
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging comes up first so every subcommand's diagnostics land in the
    // log file. `clean --env` stays unlogged: its stdout is eval'd by the
    // CI shell and must carry nothing but unset lines.
    let collector = match &cli.command {
        Commands::Clean { env: true, .. } => None,
        _ => match default_log_dir().and_then(|dir| BuildLog::init(&dir, cli.verbose)) {
            Ok(collector) => Some(collector),
            Err(e) => {
                eprintln!("Warning: logging unavailable: {}", e);
                None
            }
        },
    };

    let settings = match Settings::load_or_default() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = run_command(cli.command, &settings).await;

    if let Some(collector) = collector {
        if let Err(e) = collector.flush() {
            eprintln!("Warning: failed to flush logs: {}", e);
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_command(command: Commands, settings: &Settings) -> kbuild_ci::Result<()> {
    match command {
        Commands::Analyze { log_file } => {
            let path = log_file.unwrap_or_else(|| PathBuf::from(&settings.log_file));
            analyzer::run(&path)?;
            Ok(())
        }

        Commands::Clean {
            kernel_dir,
            build_dir,
            toolchains,
            ccache,
            all,
            env,
        } => {
            let options = CleanOptions {
                kernel_dir: kernel_dir.unwrap_or_else(|| PathBuf::from(&settings.kernel_dir)),
                build_dir: build_dir.unwrap_or_else(|| PathBuf::from(&settings.build_dir)),
                toolchains,
                ccache,
                all,
                env,
            };
            clean::run(&options)?;
            Ok(())
        }

        Commands::Lxc { command } => match command {
            LxcCommands::CheckConfig { config_file, write } => {
                lxc::check_config(&config_file, check_mode(write))?;
                Ok(())
            }
            LxcCommands::Patch { kernel_dir } => {
                lxc::patch(&kernel_dir)?;
                Ok(())
            }
            LxcCommands::PatchCocci { kernel_dir } => lxc::patch_cocci(&kernel_dir, settings).await,
        },

        Commands::Nethunter { config_file, write } => {
            nethunter::check_config(&config_file, check_mode(write))?;
            Ok(())
        }

        Commands::Kernelsu { kernel_dir, patch } => {
            kernelsu::apply(&kernel_dir, settings, &patch).await
        }

        Commands::Rekernel { kernel_dir } => rekernel::install(&kernel_dir, settings).await,
    }
}
