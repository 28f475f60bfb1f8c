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

//! # Listing Search CLI
//!
//! Runs a hotel or restaurant search against a catalog file, or against a
//! running server with `--server`.
//!
//! ```bash
//! # 4-5 star hotels in Goa with a pool, cheapest first
//! wanderlust-search -L Goa -s 4,5 -m Pool -S price-asc
//!
//! # Second page of restaurants from a running server
//! wanderlust-search --restaurants -L Kochi --page 2 --server http://localhost:5000
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use wanderlust_booking_agent::{
    Catalog, HttpCatalog, InMemoryCatalog, Listing, PageRequest, SearchFilter, SortOption,
    format_amount,
};

#[derive(Parser, Debug)]
#[command(name = "wanderlust-search")]
#[command(version = "0.1.0")]
#[command(about = "Search hotels and restaurants")]
struct Args {
    #[arg(short = 'L', long, help = "Name, city or country (partial match)")]
    destination: Option<String>,
    #[arg(long, help = "Minimum price")]
    min_price: Option<f64>,
    #[arg(short = 'p', long, help = "Maximum price")]
    max_price: Option<f64>,
    #[arg(short = 's', long, help = "Star ratings (comma-separated, e.g., 4,5)")]
    stars: Option<String>,
    #[arg(short = 't', long, help = "Types (comma-separated, e.g., Resort,Budget)")]
    types: Option<String>,
    #[arg(
        short = 'm',
        long,
        help = "Facilities (comma-separated, e.g., Pool,Free WiFi)"
    )]
    facilities: Option<String>,
    #[arg(short = 'S', long, value_enum, help = "Sort by")]
    sort: Option<SortArg>,
    #[arg(long, default_value = "1", allow_hyphen_values = true)]
    page: i64,
    #[arg(long, help = "Search restaurants instead of hotels")]
    restaurants: bool,
    #[arg(long, default_value = "data/catalog.json")]
    catalog: PathBuf,
    #[arg(long, help = "Query a running server instead of a catalog file")]
    server: Option<String>,
    #[arg(long, help = "Log to stderr")]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortArg {
    #[clap(name = "stars")]
    Stars,
    #[clap(name = "price-asc")]
    PriceAsc,
    #[clap(name = "price-desc")]
    PriceDesc,
}

impl From<SortArg> for SortOption {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Stars => SortOption::StarRating,
            SortArg::PriceAsc => SortOption::PriceAsc,
            SortArg::PriceDesc => SortOption::PriceDesc,
        }
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_stars(s: &str) -> Result<Vec<u8>> {
    split_list(s)
        .iter()
        .map(|v| {
            v.parse::<u8>()
                .map_err(|_| anyhow::anyhow!("Invalid star rating: {}", v))
        })
        .collect()
}

fn print_listing<L: Listing>(index: usize, listing: &L) {
    println!(
        "{}. {} {}",
        index,
        listing.name(),
        "★".repeat(usize::from(listing.star_rating()))
    );
    println!("   {}, {} | {}", listing.city(), listing.country(), listing.kind());
    match (listing.min_price(), listing.max_price()) {
        (Some(min), Some(max)) if min < max => {
            println!("   ₹{} - ₹{}", format_amount(min), format_amount(max))
        }
        (Some(min), _) => println!("   ₹{}", format_amount(min)),
        _ => println!("   No prices listed"),
    }
    if !listing.facilities().is_empty() {
        println!("   {}", listing.facilities().join(", "));
    }
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

    let filter = SearchFilter::builder()
        .destination(args.destination.as_deref().unwrap_or_default())
        .min_price(args.min_price)
        .max_price(args.max_price)
        .stars(
            args.stars
                .as_deref()
                .map(parse_stars)
                .transpose()?
                .unwrap_or_default(),
        )
        .hotel_types(args.types.as_deref().map(split_list).unwrap_or_default())
        .facilities(args.facilities.as_deref().map(split_list).unwrap_or_default())
        .sort_option(args.sort.map(SortOption::from).unwrap_or_default())
        .build();
    filter.validate().context("Invalid search filter")?;
    let page = PageRequest::new(args.page);

    let catalog: Box<dyn Catalog> = match &args.server {
        Some(url) => Box::new(HttpCatalog::new(url, 10)?),
        None => Box::new(
            InMemoryCatalog::load(&args.catalog)
                .await
                .with_context(|| format!("Failed to load {}", args.catalog.display()))?,
        ),
    };

    let kind = if args.restaurants { "Restaurant" } else { "Hotel" };
    println!("\n🔎 {} Search", kind);
    println!("=======================");
    if let Some(d) = &args.destination {
        println!("Destination: {}", d);
    }
    if let Some(s) = &args.stars {
        println!("Stars: {}", s);
    }
    if let Some(f) = &args.facilities {
        println!("Facilities: {}", f);
    }
    if filter.sort_option != SortOption::None {
        println!("Sort: {}", filter.sort_option.as_str_name());
    }
    println!("Page: {}", page.number());
    println!("=======================\n");

    let (pagination, shown) = if args.restaurants {
        let result = catalog.search_restaurants(&filter, page).await?;
        for (i, restaurant) in result.data.iter().enumerate() {
            print_listing(page.skip() + i + 1, restaurant);
        }
        (result.pagination, result.data.len())
    } else {
        let result = catalog.search_hotels(&filter, page).await?;
        for (i, hotel) in result.data.iter().enumerate() {
            print_listing(page.skip() + i + 1, hotel);
        }
        (result.pagination, result.data.len())
    };

    if shown == 0 {
        println!("No {}s found.", kind.to_lowercase());
    }
    println!(
        "\n{} result(s), page {} of {}",
        pagination.total,
        pagination.page,
        pagination.pages.max(1)
    );
    Ok(())
}
