use clap::{Args, Parser, Subcommand};
use expresspay_bridge::application;
use expresspay_bridge::config::GatewayConfig;
use expresspay_bridge::infrastructure::http::HttpPaymentGateway;
use expresspay_bridge::interfaces::channel::MethodCall;
use expresspay_bridge::interfaces::channel::payment::{PaymentChannel, START_EXPRESS_PAY};
use expresspay_bridge::telemetry;
use miette::{IntoDiagnostic, Result};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Gateway config file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Gateway submission endpoint; overrides the config file
    #[arg(long, env = "EXPRESSPAY_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// Enable debug logging and raw gateway response dumps
    #[arg(long, global = true)]
    debug: bool,

    /// Give up on a payment after this many seconds (0 waits forever)
    #[arg(long, global = true)]
    request_timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a payment and print the response as JSON
    Pay(PayArgs),
}

#[derive(Args)]
struct PayArgs {
    #[arg(long)]
    currency: Option<String>,
    #[arg(long)]
    amount: Option<String>,
    #[arg(long)]
    order_id: Option<String>,
    #[arg(long)]
    order_desc: Option<String>,
    #[arg(long)]
    account_number: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    redirect_url: Option<String>,
    #[arg(long)]
    order_img_url: Option<String>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    phone_number: Option<String>,
}

impl PayArgs {
    fn into_arguments(self) -> Value {
        let fields = [
            ("currency", self.currency),
            ("amount", self.amount),
            ("order_id", self.order_id),
            ("order_desc", self.order_desc),
            ("account_number", self.account_number),
            ("email", self.email),
            ("redirect_url", self.redirect_url),
            ("order_img_url", self.order_img_url),
            ("first_name", self.first_name),
            ("last_name", self.last_name),
            ("phone_number", self.phone_number),
        ];
        let map: Map<String, Value> = fields
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), Value::String(v))))
            .collect();
        Value::Object(map)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = GatewayConfig::load(cli.config.as_deref()).into_diagnostic()?;
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(secs) = cli.request_timeout_secs {
        config.request_timeout_secs = secs;
    }
    config.debug_mode |= cli.debug;
    telemetry::init(config.debug_mode);

    let gateway = Arc::new(HttpPaymentGateway::new(&config).into_diagnostic()?);
    let (correlator, _lifecycle) = application::assemble(gateway, config.request_timeout());
    let channel = PaymentChannel::new(correlator);

    match cli.command {
        Command::Pay(args) => {
            let call = MethodCall::new(START_EXPRESS_PAY, args.into_arguments());
            let response = channel.handle(call).await.into_diagnostic()?;
            println!("{}", serde_json::to_string(&response).into_diagnostic()?);
        }
    }

    Ok(())
}
