use clap::{Parser, Subcommand};
use bg_remover::share::ShareOutcome;
use bg_remover::workflow::{TransferOutcome, WorkflowSnapshot};
use bg_remover::{workflow_from_config, Config, SelectedFile};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "bgremovectl",
    about = "Remove image backgrounds with the remove.bg API",
    long_about = "Remove image backgrounds with the remove.bg API.\n\n\
        Create an account at https://www.remove.bg/api, get an API key \
        (the free tier includes 50 images per month) and put it in \
        REMOVE_BG_API_KEY or a .env file.",
    version
)]
struct Cli {
    /// Override REMOVE_BG_API_KEY
    #[arg(global = true, long)]
    api_key: Option<String>,

    /// Override REMOVE_BG_URL
    #[arg(global = true, long)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Remove the background of an image and save it as background-removed.png
    Remove {
        /// Image to process (PNG, JPEG, WebP, GIF, BMP or TIFF, 5MB max)
        input: PathBuf,
        /// Output directory (defaults to OUTPUT_DIR)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// Also hand the result to SHARE_COMMAND
        #[arg(long)]
        share: bool,
    },
    /// Only check that an image would be accepted
    Check {
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Load env and parse CLI
    Config::dotenv_load();
    let cli = Cli::parse();

    if let Some(key) = cli.api_key {
        std::env::set_var("REMOVE_BG_API_KEY", key);
    }
    let mut conf = match Config::new() {
        Ok(conf) => conf,
        Err(e) => {
            eprintln!("{}: set REMOVE_BG_API_KEY or pass --api-key", e);
            std::process::exit(2);
        }
    };
    if let Some(url) = cli.endpoint {
        conf.remove_bg_url = url;
    }

    let workflow = workflow_from_config(&conf);

    match cli.command {
        Commands::Check { input } => {
            let file = SelectedFile::from_path(&input).await?;
            if let Err(e) = workflow.accept_file(file).await {
                eprintln!("Error: {}", e.user_message());
                std::process::exit(1);
            }
            print_source(&workflow.snapshot().await);
            Ok(())
        }
        Commands::Remove { input, out, share } => {
            let file = SelectedFile::from_path(&input).await?;
            if let Err(e) = workflow.accept_file(file).await {
                eprintln!("Error: {}", e.user_message());
                std::process::exit(1);
            }
            print_source(&workflow.snapshot().await);

            eprintln!("Removing background...");
            match workflow.request_background_removal().await {
                Ok(TransferOutcome::Completed) => {}
                Ok(other) => {
                    eprintln!("Nothing to save ({:?})", other);
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error: {}", e.user_message());
                    std::process::exit(1);
                }
            }

            let dir = out.unwrap_or_else(|| PathBuf::from(&conf.output_dir));
            if let Some(path) = workflow.download_result(&dir).await? {
                println!("Saved {}", path.display());
            }

            if share {
                match workflow.share_result().await {
                    ShareOutcome::Shared => println!("Shared"),
                    ShareOutcome::Unsupported(notice) => eprintln!("{}", notice),
                    ShareOutcome::Failed => eprintln!("Sharing failed; the image is still saved locally"),
                    ShareOutcome::Skipped => {}
                }
            }
            Ok(())
        }
    }
}

fn print_source(snapshot: &WorkflowSnapshot) {
    if let Some(source) = &snapshot.source {
        let (width, height) = source.dimensions();
        println!(
            "{}: {} {}x{} ({} bytes)",
            source.name(), source.mime(), width, height, source.bytes().len()
        );
    }
}
