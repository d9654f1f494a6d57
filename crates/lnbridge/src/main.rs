mod cli;

use std::time::Duration;

use clap::Parser;
use eyre::{eyre, WrapErr};
use serde::Serialize;

use lnbridge_core::rpc::HttpTransportConfig;
use lnbridge_core::{CoreError, InvoiceRequest, NodeClient, WalletConnection};

use cli::Command;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    let config = HttpTransportConfig {
        request_timeout: Duration::from_secs(args.rpc_timeout_secs),
        requests_per_second: args.rpc_requests_per_second,
        ..HttpTransportConfig::default()
    };
    let client = NodeClient::over_http(config).context("build RPC transport")?;

    let mut wallet = WalletConnection::new(&args.host, &args.username, &args.password);
    wallet.pubkey = args.pubkey.clone();

    run(&client, &wallet, args.command).await
}

async fn run(client: &NodeClient, wallet: &WalletConnection, command: Command) -> eyre::Result<()> {
    let host = wallet.host_and_port.as_str();
    match command {
        Command::Info => {
            let info = client
                .get_info(wallet)
                .await
                .map_err(|e| rpc_failure(host, e))?;
            tracing::info!(pubkey = %info.pubkey, "connected to node");
            print_json(&info)
        }
        Command::Channels { no_enrich } => {
            let channels = if no_enrich {
                client.list_channels_unenriched(wallet).await
            } else {
                client.list_channels(wallet).await
            }
            .map_err(|e| rpc_failure(host, e))?;
            print_json(&channels)
        }
        Command::Balance => {
            let (onchain, channels) = tokio::try_join!(
                client.wallet_balance(wallet),
                client.channel_balance(wallet)
            )
            .map_err(|e| rpc_failure(host, e))?;
            print_json(&serde_json::json!({
                "onchain_sat": onchain.to_sat(),
                "channels_sat": channels.to_sat(),
            }))
        }
        Command::Decode { bolt11 } => {
            let request = client
                .decode_pay_req(wallet, &bolt11)
                .await
                .map_err(|e| rpc_failure(host, e))?;
            print_json(&request)
        }
        Command::Pay { bolt11 } => {
            let outcome = client
                .pay(wallet, &bolt11)
                .await
                .map_err(|e| rpc_failure(host, e))?;
            print_json(&outcome)?;
            match outcome.failure_description() {
                None => Ok(()),
                Some(reason) => Err(eyre!("payment not completed: {reason}")),
            }
        }
        Command::Invoice {
            amount,
            label,
            description,
        } => {
            let request = InvoiceRequest {
                amount,
                label,
                description,
            };
            let bolt11 = client
                .create_invoice(wallet, &request)
                .await
                .map_err(|e| rpc_failure(host, e))?;
            print_json(&serde_json::json!({ "bolt11": bolt11 }))
        }
        Command::History => {
            let history = client
                .list_all_transactions(wallet)
                .await
                .map_err(|e| rpc_failure(host, e))?;
            print_json(&history)
        }
    }
}

fn print_json(value: &impl Serialize) -> eyre::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("render output as JSON")?;
    println!("{rendered}");
    Ok(())
}

fn rpc_failure(host: &str, err: CoreError) -> eyre::Report {
    let message = format_rpc_error(host, &err);
    eyre!(message).wrap_err("while talking to the Lightning node")
}

fn format_rpc_error(host: &str, err: &CoreError) -> String {
    let source_error = err.to_string();
    let mut lines = vec![
        format!("RPC call to `{host}` failed"),
        format!("error: {source_error}"),
    ];

    if let Some(code) = err.server_code() {
        lines.push(format!(
            "hint: the node rejected the command (code {code}); check its arguments and node logs"
        ));
    } else if source_error.contains("dns error") || source_error.contains("Could not resolve host")
    {
        lines.push(
            "hint: hostname resolution failed; verify --host and your DNS/network".into(),
        );
    } else if source_error.contains("tls")
        || source_error.contains("certificate")
        || source_error.contains("SSL")
    {
        lines.push(
            "hint: TLS handshake failed; use an http:// URL if the node does not serve HTTPS"
                .into(),
        );
    } else if source_error.contains("401") || source_error.contains("403") {
        lines.push("hint: access key rejected; verify --username/--password".into());
    } else if source_error.contains("404") {
        lines.push("hint: no /rpc endpoint at this address; verify the base URL".into());
    } else if err.is_transport() {
        lines.push(
            "hint: request could not be completed; verify the address and that the node is reachable"
                .into(),
        );
    }

    lines.join("\n")
}
