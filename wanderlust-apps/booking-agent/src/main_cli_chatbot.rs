//!  Wanderlust Booking Agent
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Booking Assistant CLI
//!
//! Talks to the booking assistant in the terminal. Offline against a catalog
//! file by default, or through a running server with `--server`.
//!
//! Options can be picked by number or typed out. Dates are entered as
//! `YYYY-MM-DD`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use wanderlust_booking_agent::{
    BookingConversation, Catalog, CheckoutGateway, FlowContext, HttpCatalog, HttpCheckoutGateway,
    InMemoryCatalog, InputKind, LocalCheckoutGateway, Prompt,
};

#[derive(Parser, Debug)]
#[command(name = "wanderlust-chatbot")]
#[command(author, version, about = "Chat with the booking assistant")]
struct Args {
    #[arg(long, default_value = "data/catalog.json")]
    catalog: PathBuf,
    #[arg(long, help = "Use a running server for search and checkout")]
    server: Option<String>,
    #[arg(long, default_value = "10")]
    timeout: u64,
    #[arg(long, help = "Log to stderr")]
    verbose: bool,
}

fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80).min(100)
}

fn print_prompt(prompt: &Prompt) {
    let width = get_terminal_width();
    println!("{}", "─".repeat(width));
    if let Some(notice) = &prompt.notice {
        println!("⚠️  {}", notice);
    }
    println!("🤖 {}", prompt.message);
    for line in &prompt.details {
        println!("   {}", line);
    }
    if let Some(range) = &prompt.date_range {
        println!(
            "   Selected: {} (allowed {} to {})",
            range.selected, range.min, range.max
        );
    }
    for (i, option) in prompt.options.iter().enumerate() {
        println!("  [{}] {}", i + 1, option);
    }
}

/// A bare number picks the matching option on option and date steps
fn resolve_input(prompt: &Prompt, line: &str) -> String {
    let line = line.trim();
    if matches!(prompt.input, InputKind::Options | InputKind::Date) {
        if let Some(option) = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| prompt.options.get(i))
        {
            return option.clone();
        }
    }
    line.to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if args.verbose {
        tracing_subscriber::fmt()
            .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
            .with_writer(std::io::stderr)
            .init();
    }

    let (catalog, checkout): (Arc<dyn Catalog>, Arc<dyn CheckoutGateway>) = match &args.server {
        Some(url) => {
            let catalog = HttpCatalog::new(url, args.timeout)?;
            let checkout_url = format!("{}/api/user/booking/checkout", catalog.base_url());
            (
                Arc::new(catalog),
                Arc::new(HttpCheckoutGateway::new(checkout_url, args.timeout)?),
            )
        }
        None => (
            Arc::new(
                InMemoryCatalog::load(&args.catalog)
                    .await
                    .with_context(|| format!("Failed to load {}", args.catalog.display()))?,
            ),
            Arc::new(LocalCheckoutGateway::new()),
        ),
    };

    let mut conversation = BookingConversation::new(catalog, checkout, FlowContext::today_local());
    let mut last = conversation.current();
    print_prompt(&last);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let input = resolve_input(&last, &line);
        let prompts = conversation.submit(&input).await?;
        if conversation.is_closed() {
            println!("👋 Bye!");
            break;
        }
        for prompt in &prompts {
            print_prompt(prompt);
        }
        if let Some(prompt) = prompts.into_iter().last() {
            last = prompt;
        }
    }
    Ok(())
}
