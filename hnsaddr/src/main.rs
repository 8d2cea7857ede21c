use anyhow::Context;
use clap::{Parser, Subcommand};
use hnsaddr_core::{Chain, Network, WatchOnlyProvider};
use serde::Serialize;
use std::io::{BufWriter, Read};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    version,
    about = "Derive Handshake watch addresses from hardware wallet account keys"
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the BIP44 account path for a network
    Path(PathArgs),
    /// Derive a watch address from an exported account key
    Address(AddressArgs),
    /// Decode an address into its witness program
    DecodeAddress(DecodeAddressArgs),
}

#[derive(clap::Args, Debug)]
struct PathArgs {
    /// Network: main, testnet, regtest or simnet
    #[clap(short, long, env = "HNSADDR_NETWORK", default_value = "main")]
    network: String,
    /// Account index (below 2^31)
    #[clap(short, long, env = "HNSADDR_ACCOUNT", default_value = "0")]
    account: u32,
    /// Output file path
    #[clap(short, long)]
    output: Option<String>,
}

#[derive(clap::Args, Debug)]
struct AddressArgs {
    /// Network: main, testnet, regtest or simnet
    #[clap(short, long, env = "HNSADDR_NETWORK", default_value = "main")]
    network: String,
    /// Account index (below 2^31)
    #[clap(short, long, env = "HNSADDR_ACCOUNT", default_value = "0")]
    account: u32,
    /// Account extended public key exported from the device (xpub/tpub/rpub/spub)
    #[clap(long, env = "HNSADDR_XPUB")]
    xpub: String,
    /// Address index within the chain
    #[clap(long, default_value = "0")]
    index: u32,
    /// Derive from the change chain instead of the receive chain
    #[clap(long)]
    change: bool,
    /// Output file path
    #[clap(short, long)]
    output: Option<String>,
}

#[derive(clap::Args, Debug)]
struct DecodeAddressArgs {
    /// Address to decode (read from stdin when omitted)
    input: Option<String>,
    /// Network the address must belong to
    #[clap(short, long, env = "HNSADDR_NETWORK", default_value = "main")]
    network: String,
    /// Output file path
    #[clap(short, long)]
    output: Option<String>,
}

#[derive(Debug, Serialize)]
struct PathOutput {
    network: Network,
    account: u32,
    coin_type: u32,
    path: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Cli = Cli::parse();
    debug!("Running {command:?}", command = args.command);
    match args.command {
        Commands::Path(args) => path(args)?,
        Commands::Address(args) => address(args).await?,
        Commands::DecodeAddress(args) => decode_address(args)?,
    }
    Ok(())
}

fn path(args: PathArgs) -> anyhow::Result<()> {
    let writer: Box<dyn std::io::Write> = match args.output {
        Some(path) => Box::new(BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout())),
    };

    let (path, spec) = hnsaddr_core::build_path(&args.network, args.account)?;

    let output = PathOutput {
        network: spec.network,
        account: args.account,
        coin_type: spec.coin_type,
        path: hnsaddr_core::format_path(&path),
    };
    serde_json::to_writer_pretty(writer, &output)?;
    Ok(())
}

async fn address(args: AddressArgs) -> anyhow::Result<()> {
    let writer: Box<dyn std::io::Write> = match args.output {
        Some(path) => Box::new(BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout())),
    };

    let provider = WatchOnlyProvider::parse(args.xpub.trim())
        .context("Failed to parse account extended public key")?;
    let chain = if args.change {
        Chain::Change
    } else {
        Chain::Receive
    };

    let output = hnsaddr_core::generate_watch_address(
        provider,
        &args.network,
        args.account,
        chain,
        args.index,
    )
    .await
    .with_context(|| {
        format!(
            "Failed to derive address for account {account} on {network}",
            account = args.account,
            network = args.network
        )
    })?;

    serde_json::to_writer_pretty(writer, &output)?;
    Ok(())
}

fn decode_address(args: DecodeAddressArgs) -> anyhow::Result<()> {
    let input = match args.input {
        Some(input) => input,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer.trim().to_string()
        }
    };

    let writer: Box<dyn std::io::Write> = match args.output {
        Some(path) => Box::new(BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout())),
    };

    let network: Network = args.network.parse()?;
    let output = hnsaddr_core::decode_address(&input, network.spec())?;
    serde_json::to_writer_pretty(writer, &output)?;
    Ok(())
}
