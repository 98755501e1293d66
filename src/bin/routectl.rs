use std::io::Read;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "routectl")]
#[command(about = "Management CLI for the command router route table", long_about = None)]
struct Cli {
    /// Control API base URL.
    #[arg(short, long, env = "CMDROUTER_CONTROL_URL", default_value = "http://localhost:8081")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct RouteArgs {
    /// HTTP method to match
    #[arg(short, long, default_value = "GET")]
    method: String,
    /// Entrypoint; the server default is used when omitted
    #[arg(short, long)]
    entrypoint: Option<String>,
    /// Command text; read from stdin when set to "-"
    #[arg(short, long, default_value = "")]
    command: String,
    /// Path template, e.g. /listDir/{dirname}
    url_pattern: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List routes in match order
    List,
    /// Append a route at the end of the table
    Add(RouteArgs),
    /// Insert a route at a position
    Insert {
        /// Target position (clamped to the table length)
        #[arg(short, long)]
        index: usize,
        #[command(flatten)]
        route: RouteArgs,
    },
    /// Show one route
    Get { id: String },
    /// Remove one route
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let routes_url = format!("{}/routes", cli.url.trim_end_matches('/'));

    match cli.command {
        Commands::List => {
            let res = client.get(&routes_url).send().await?;
            print_response(res).await?;
        }
        Commands::Add(route) => {
            let res = client.post(&routes_url).json(&route_body(route, None)?).send().await?;
            print_response(res).await?;
        }
        Commands::Insert { index, route } => {
            let res = client
                .put(&routes_url)
                .json(&route_body(route, Some(index))?)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Get { id } => {
            let res = client.get(format!("{}/{}", routes_url, id)).send().await?;
            print_response(res).await?;
        }
        Commands::Delete { id } => {
            let res = client.delete(format!("{}/{}", routes_url, id)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn route_body(args: RouteArgs, index: Option<usize>) -> Result<Value, std::io::Error> {
    let command = if args.command == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        args.command
    };

    let mut body = json!({
        "method": args.method,
        "url_pattern": args.url_pattern,
        "command": command,
    });
    if let Some(entrypoint) = args.entrypoint {
        body["entrypoint"] = json!(entrypoint);
    }
    if let Some(index) = index {
        body["index"] = json!(index);
    }
    Ok(body)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: control API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }
    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
