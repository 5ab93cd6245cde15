use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use session_store::SessionStore;

use flashcart::checkout::TASK_TITLES;
use flashcart::{
    install_panic_cleanup, AccountView, AppConfig, Ctx, PipelineConfig, ProcessTerminal, Program,
    ValidatedPolicy,
};
use storefront_api::{format_price, Client, ClientConfig};

#[derive(Parser)]
#[command(author, version, about = "Flash-sale checkout assistant")]
struct Cli {
    /// Saved-session state file
    #[arg(long, default_value = "flashcart.json")]
    state: PathBuf,
    /// Delay between launching consecutive checkout stages, in milliseconds
    #[arg(long = "delay-ms", default_value_t = 100)]
    delay_ms: u64,
    /// How long before the sale opens the pipeline starts firing, in
    /// milliseconds
    #[arg(long = "lead-ms", default_value_t = 0)]
    lead_ms: u64,
    #[arg(long, default_value = storefront_api::DEFAULT_BASE_URL)]
    base_url: String,
    #[arg(long, default_value = "flashcart.log")]
    log_file: PathBuf,
    /// Treat an "already validated" answer from the storefront as a failure
    #[arg(long)]
    strict_validate: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print item details for a product link and exit
    Info { url: String },
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig {
        state_path: cli.state,
        base_url: cli.base_url,
        log_file: cli.log_file,
        pipeline: PipelineConfig {
            lead_time: Duration::from_millis(cli.lead_ms),
            stagger: Duration::from_millis(cli.delay_ms),
            validated_policy: if cli.strict_validate {
                ValidatedPolicy::TreatAsFailure
            } else {
                ValidatedPolicy::TreatAsSuccess
            },
        },
        currency: "Rp".to_string(),
    };

    if let Some(Command::Info { url }) = cli.command {
        return print_item_info(&config, &url);
    }

    flashcart::logging::init_file_logging(&config.log_file)?;
    tracing::info!(stages = TASK_TITLES.len(), "starting up");

    let store = SessionStore::load_or_default(&config.state_path).map_err(io::Error::other)?;
    let ctx = Ctx::new(config, store);

    install_panic_cleanup(|| {
        // Raw mode restoration is owned by Program::run; getting the cursor
        // back is the part worth doing even on a crash path.
        let _ = io::Write::write_all(&mut io::stdout(), b"\x1b[?25h\r\n");
    });

    let terminal = ProcessTerminal::new();
    let mut program = Program::new(terminal, Box::new(AccountView::new(ctx)));
    program.run()
}

/// Anonymous one-shot item lookup for the `info` subcommand; no session or
/// terminal UI involved.
fn print_item_info(config: &AppConfig, url: &str) -> io::Result<()> {
    let client = Client::new(ClientConfig::default().with_base_url(&config.base_url))
        .map_err(io::Error::other)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let item = runtime
        .block_on(client.fetch_item_from_url(url))
        .map_err(io::Error::other)?;

    println!("{}", item.name);
    println!(
        "  price {}  stock {}",
        format_price(&config.currency, item.price),
        item.stock
    );
    if let Some(start) = item.upcoming_sale_start() {
        println!("  flash sale opens at epoch {start}");
        if let Some(hidden) = item.hidden_price() {
            println!("  sale price {hidden}");
        }
    } else if item.is_flash_sale() {
        println!("  flash sale live");
    }
    for model in &item.models {
        println!(
            "  - {} {} stock {}",
            model.name,
            format_price(&config.currency, model.price),
            model.stock
        );
    }
    Ok(())
}
