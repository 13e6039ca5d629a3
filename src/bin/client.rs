use clap::{Args, Parser, Subcommand};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "barpos")]
#[command(about = "client cli used by bar staff to interact with the server", version, long_about = None)]
struct Cli {
    #[arg(long, default_value = "changeme-bar-token", help = "Shared staff token.")]
    token: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// tonight's active menu
    Menu,
    /// bottle inventory levels
    Stock,
    /// charge a ticket of catalog items
    #[command(arg_required_else_help = true)]
    Checkout(CheckoutArgs),
    /// end-of-night reconciliation sheet
    #[command(arg_required_else_help = true)]
    Report {
        #[arg(help = "Date to reconcile, YYYY-MM-DD.")]
        date: String,
    },
}

#[derive(Debug, Args)]
struct CheckoutArgs {
    #[arg(long, help = "Menu items to charge.", value_name = "MENU_ITEM_IDs", num_args = 1..)]
    items: Vec<Uuid>,
    #[arg(long, default_value_t = 1, help = "Quantity applied to every item.")]
    qty: i32,
    #[arg(long, default_value = "EFECTIVO", help = "Payment method label.")]
    pay: String,
}

const HOST: &str = "http://localhost:8080";

#[derive(Debug, Deserialize)]
struct CheckoutResponse {
    ticket_id: Uuid,
    total: f64,
    receipt: Vec<ReceiptLine>,
}

#[derive(Debug, Deserialize)]
struct ReceiptLine {
    name: String,
    quantity: i32,
    subtotal: f64,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Cli::parse();
    let http = Client::new();

    match args.command {
        Commands::Menu => {
            let res = http
                .get(format!("{}/{}", HOST, "v1/menu"))
                .bearer_auth(&args.token)
                .send()
                .await?;
            println!("{}", res.text().await?);
        }
        Commands::Stock => {
            let res = http
                .get(format!("{}/{}", HOST, "v1/stock"))
                .bearer_auth(&args.token)
                .send()
                .await?;
            println!("{}", res.text().await?);
        }
        Commands::Checkout(checkout) => {
            let lines = checkout
                .items
                .iter()
                .map(|id| serde_json::json!({"menu_item_id": id, "quantity": checkout.qty}))
                .collect::<Vec<_>>();
            let res = http
                .post(format!("{}/{}", HOST, "v1/checkout"))
                .bearer_auth(&args.token)
                .json(&serde_json::json!({
                    "lines": lines,
                    "payment_method": checkout.pay,
                }))
                .send()
                .await?;
            match res.status() {
                StatusCode::OK => {
                    let receipt = res
                        .json::<CheckoutResponse>()
                        .await
                        .expect("failed to get response, aborting");
                    println!("ticket {} charged, total = {}", receipt.ticket_id, receipt.total);
                    for line in receipt.receipt {
                        println!("  {} x{} = {}", line.name, line.quantity, line.subtotal);
                    }
                }
                StatusCode::CONFLICT => {
                    println!("not enough stock to cover this ticket, nothing was charged");
                }
                StatusCode::NOT_FOUND => {
                    println!("a menu item on this ticket does not exist");
                }
                unexpected => {
                    println!("got unexpected status code, {}", unexpected);
                }
            }
        }
        Commands::Report { date } => {
            let res = http
                .get(format!("{}/v1/report/{}", HOST, date))
                .bearer_auth(&args.token)
                .send()
                .await?;
            match res.status() {
                StatusCode::OK => println!("{}", res.text().await?),
                StatusCode::BAD_REQUEST => println!("dates look like YYYY-MM-DD"),
                unexpected => println!("got unexpected status code, {}", unexpected),
            }
        }
    }

    Ok(())
}
