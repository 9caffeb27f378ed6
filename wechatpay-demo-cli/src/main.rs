//! WeChat Pay Demo CLI
//!
//! Command-line interface for exercising wechatpay-lib: signing requests,
//! decrypting gateway payloads, managing platform certificates and placing
//! a native order.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod ui;

use commands::MerchantArgs;

#[derive(Parser)]
#[command(name = "wechatpay-demo")]
#[command(about = "WeChat Pay Demo CLI - sign, verify and decrypt WeChat Pay API v3 traffic", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    merchant: MerchantArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the Authorization header for a request
    Sign {
        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request URI (path and query)
        #[arg(short, long)]
        uri: String,

        /// File holding the exact request body
        #[arg(long)]
        body_file: Option<PathBuf>,

        /// Fixed timestamp (defaults to now)
        #[arg(long)]
        timestamp: Option<i64>,

        /// Fixed nonce (defaults to a fresh one)
        #[arg(long)]
        nonce: Option<String>,
    },

    /// Decrypt an AEAD_AES_256_GCM payload with the API v3 key
    Decrypt {
        /// Base64 ciphertext
        #[arg(long)]
        ciphertext: String,

        /// Nonce supplied next to the ciphertext
        #[arg(long)]
        nonce: String,

        /// Associated data supplied next to the ciphertext
        #[arg(long, default_value = "")]
        associated_data: String,
    },

    /// Show serial number and validity of a certificate file
    InspectCert {
        /// PEM or DER certificate
        path: PathBuf,
    },

    /// Refresh platform certificates from the gateway
    Certs {
        /// Persist certificates in this directory
        #[arg(long)]
        store_dir: Option<PathBuf>,
    },

    /// Create a native (QR code) order
    NativeOrder {
        /// Order description
        #[arg(short, long)]
        description: String,

        /// Merchant order number
        #[arg(short, long)]
        out_trade_no: String,

        /// Amount in fen
        #[arg(short, long)]
        amount: i64,

        /// Notification URL
        #[arg(long)]
        notify_url: String,

        /// Merchant data echoed back in the payment notification
        #[arg(long)]
        attach: Option<String>,
    },

    /// Verify and decrypt a received notification
    Notify {
        /// File holding the raw notification body
        #[arg(long)]
        body_file: PathBuf,

        /// Wechatpay-Timestamp header
        #[arg(long)]
        timestamp: String,

        /// Wechatpay-Nonce header
        #[arg(long)]
        nonce: String,

        /// Wechatpay-Serial header
        #[arg(long)]
        serial: String,

        /// Wechatpay-Signature header
        #[arg(long)]
        signature: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("wechatpay_demo_cli=debug,wechatpay_lib=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("wechatpay_demo_cli=info,wechatpay_lib=warn")
            .init();
    }

    let result = match cli.command {
        Commands::Sign {
            method,
            uri,
            body_file,
            timestamp,
            nonce,
        } => {
            commands::sign::run(&cli.merchant, &method, &uri, body_file, timestamp, nonce).await
        }
        Commands::Decrypt {
            ciphertext,
            nonce,
            associated_data,
        } => commands::decrypt::run(&cli.merchant, &ciphertext, &nonce, &associated_data).await,
        Commands::InspectCert { path } => commands::inspect::run(&path).await,
        Commands::Certs { store_dir } => commands::certs::run(&cli.merchant, store_dir).await,
        Commands::NativeOrder {
            description,
            out_trade_no,
            amount,
            notify_url,
            attach,
        } => {
            let order = commands::native::OrderArgs {
                description,
                out_trade_no,
                amount,
                notify_url,
                attach,
            };
            commands::native::run(&cli.merchant, order).await
        }
        Commands::Notify {
            body_file,
            timestamp,
            nonce,
            serial,
            signature,
        } => {
            let headers = commands::notify::NotificationHeaders {
                timestamp,
                nonce,
                serial,
                signature,
            };
            commands::notify::run(&cli.merchant, &body_file, headers).await
        }
    };

    if let Err(e) = &result {
        ui::error(&format!("{:#}", e));
    }
    result
}
