use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use hotel_link_verifier::config::Config;
use hotel_link_verifier::dashboard::{load_summaries, render_dashboard, write_dashboard};
use hotel_link_verifier::models::{AvailabilityStatus, PropertyId, RunSummary};
use hotel_link_verifier::pipeline::{Verifier, EXIT_OK, EXIT_SETUP};
use hotel_link_verifier::prober::{DayPicker, ProbeSettings, Prober, RandomDayPicker};
use hotel_link_verifier::report::{save_csv, save_summary};
use hotel_link_verifier::scrapers::{BlogScraper, ScrapeOptions};
use hotel_link_verifier::search::{save_listings, HotelListing};
use hotel_link_verifier::vendor::{AgodaClient, CitySearch, HotelSearch, Occupancy, SortOrder};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Verify hotel affiliate links in blog posts")]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape a blog post and verify every vendor link on it
    Verify(VerifyArgs),
    /// Build the HTML dashboard from *_summary.json files
    Dashboard(DashboardArgs),
    /// Search specific properties by ID
    HotelSearch(HotelSearchArgs),
    /// Search the properties of a city
    CitySearch(CitySearchArgs),
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// Blog post URL to scrape for vendor links
    #[arg(long, alias = "blog-url")]
    page_url: String,

    /// Destination label for the summary (e.g. "Bali")
    #[arg(long)]
    destination: Option<String>,

    /// Output CSV path
    #[arg(long, default_value = "verification_report.csv")]
    output: PathBuf,

    /// Optional JSON summary path for the dashboard
    #[arg(long)]
    json_output: Option<PathBuf>,

    /// Currency code for price checks (defaults to VERIFIER_CURRENCY or INR)
    #[arg(long)]
    currency: Option<String>,

    /// Number of adults (defaults to VERIFIER_ADULTS or 2)
    #[arg(long)]
    adults: Option<u32>,

    /// Date ranges tried per property
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=12))]
    max_attempts: u32,

    /// Nights per probed stay
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=14))]
    stay_nights: u32,

    /// Months ahead of the current one for the first probe
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=12))]
    first_month_offset: u32,

    /// Host of the booking vendor (defaults to VERIFIER_VENDOR_DOMAIN or agoda.com)
    #[arg(long)]
    vendor_domain: Option<String>,

    /// Seed for check-in date selection, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Treat unavailable properties as a failing run
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct DashboardArgs {
    /// Directory containing *_summary.json files
    #[arg(long, default_value = ".")]
    input_dir: PathBuf,

    /// Output HTML file path
    #[arg(long, default_value = "index.html")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct StayArgs {
    /// Check-in date (YYYY-MM-DD)
    #[arg(long)]
    check_in: NaiveDate,

    /// Check-out date (YYYY-MM-DD)
    #[arg(long)]
    check_out: NaiveDate,

    #[arg(long, default_value = "USD")]
    currency: String,

    #[arg(long, default_value = "en-us")]
    language: String,

    #[arg(long, default_value_t = 2)]
    adults: u32,

    #[arg(long, default_value_t = 0)]
    children: u32,

    /// Comma-separated ages of the children (e.g. 10,12)
    #[arg(long, value_delimiter = ',')]
    children_ages: Vec<u32>,

    /// Show only discounted rates
    #[arg(long)]
    discount_only: bool,

    /// Output file path (.json or .csv)
    #[arg(long)]
    output: Option<PathBuf>,
}

impl StayArgs {
    fn occupancy(&self) -> Occupancy {
        Occupancy {
            adults: self.adults,
            children: self.children,
            children_ages: if self.children_ages.is_empty() {
                None
            } else {
                Some(self.children_ages.clone())
            },
        }
    }

    fn warn_if_past(&self) {
        if self.check_in < Local::now().date_naive() {
            warn!("Check-in date {} is in the past", self.check_in);
        }
    }
}

#[derive(Args, Debug)]
struct HotelSearchArgs {
    /// Comma-separated property IDs (e.g. 407854,463019)
    #[arg(long, value_delimiter = ',', required = true)]
    hotel_ids: Vec<u64>,

    #[command(flatten)]
    stay: StayArgs,
}

#[derive(Args, Debug)]
struct CitySearchArgs {
    #[arg(long)]
    city_id: u64,

    #[command(flatten)]
    stay: StayArgs,

    #[arg(long)]
    min_price: Option<f64>,

    #[arg(long)]
    max_price: Option<f64>,

    /// Minimum star rating 0-5
    #[arg(long)]
    min_star_rating: Option<f64>,

    /// Minimum review score 0-10
    #[arg(long)]
    min_review_score: Option<f64>,

    /// Sort order (Recommended, PriceAsc, PriceDesc, StarRatingDesc, ...)
    #[arg(long, default_value = "Recommended")]
    sort_by: SortOrder,

    /// Maximum number of results (1-30)
    #[arg(long, default_value_t = 10)]
    max_results: u32,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "hotel_link_verifier=debug,info"
        } else {
            "info"
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let outcome = match cli.command {
        Command::Verify(args) => verify(args).await,
        Command::Dashboard(args) => dashboard(args),
        Command::HotelSearch(args) => hotel_search(args).await,
        Command::CitySearch(args) => city_search(args).await,
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_SETUP)
        }
    }
}

async fn verify(args: VerifyArgs) -> Result<ExitCode> {
    let config = Config::from_env()?;
    let credentials = config.require_credentials()?.clone();

    let vendor_domain = args
        .vendor_domain
        .map(|d| d.to_lowercase())
        .unwrap_or_else(|| config.vendor_domain.clone());
    let settings = ProbeSettings {
        max_attempts: args.max_attempts,
        stay_nights: args.stay_nights,
        first_month_offset: args.first_month_offset,
        month_span: None,
        currency: args
            .currency
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| config.currency.clone()),
        adults: args.adults.unwrap_or(config.adults),
    };

    info!("{}", "=".repeat(80));
    info!("Hotel Affiliate Link Verifier");
    info!("{}", "=".repeat(80));

    let client = AgodaClient::new(credentials)?;
    let scraper = BlogScraper::with_options(ScrapeOptions::default())?;
    let picker: Box<dyn DayPicker> = match args.seed {
        Some(seed) => Box::new(RandomDayPicker::seeded(seed)),
        None => Box::new(RandomDayPicker::new()),
    };
    let prober = Prober::new(&client, settings, picker, Local::now().date_naive());
    let mut verifier = Verifier::new(&scraper, prober, vendor_domain);

    let report = match verifier.run(&args.page_url).await {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            return Ok(ExitCode::from(e.exit_code()));
        }
    };

    let available = report.count(AvailabilityStatus::Available);
    let unavailable = report.count(AvailabilityStatus::Unavailable);
    let errors = report.count(AvailabilityStatus::Error);

    info!("{}", "=".repeat(80));
    info!("Verification Summary");
    info!("{}", "=".repeat(80));
    info!("Total links processed: {}", report.results.len());
    info!("Available: {}", available);
    info!("Unavailable: {}", unavailable);
    info!("Errors: {}", errors);

    save_csv(&args.output, &report.results)?;
    if let Some(path) = &args.json_output {
        let summary = RunSummary::from_results(
            &report.page_url,
            args.destination.as_deref(),
            &report.results,
            Utc::now(),
        );
        save_summary(path, &summary)?;
    }

    info!("✓ Verification completed. Report saved to: {}", args.output.display());

    let code = report.exit_code(args.strict);
    if code != EXIT_OK {
        warn!("⚠ Found {} issue(s) - exit code {}", report.failing(args.strict), code);
    }
    Ok(ExitCode::from(code))
}

fn dashboard(args: DashboardArgs) -> Result<ExitCode> {
    info!("Loading verification results from: {}", args.input_dir.display());
    let summaries = load_summaries(&args.input_dir)?;
    if summaries.is_empty() {
        warn!("No verification results found! Creating dashboard with no data...");
    }

    let html = render_dashboard(&summaries, Utc::now());
    write_dashboard(&args.output, &html)?;
    Ok(ExitCode::SUCCESS)
}

async fn hotel_search(args: HotelSearchArgs) -> Result<ExitCode> {
    args.stay.warn_if_past();
    let ids: Vec<PropertyId> = args.hotel_ids.iter().copied().map(PropertyId).collect();
    if ids.iter().any(|id| id.0 == 0) {
        bail!("Hotel IDs must be positive integers");
    }

    let stay = &args.stay;
    let search = HotelSearch {
        hotel_ids: ids,
        check_in: stay.check_in,
        check_out: stay.check_out,
        currency: stay.currency.to_uppercase(),
        language: stay.language.clone(),
        occupancy: stay.occupancy(),
        discount_only: stay.discount_only,
    };

    let config = Config::from_env()?;
    let client = AgodaClient::new(config.require_credentials()?.clone())?;

    info!("Searching for {} hotel(s)...", search.hotel_ids.len());
    info!("Dates: {} to {}", search.check_in, search.check_out);
    let response = client.hotel_search(&search).await.context("Hotel search failed")?;
    let listings: Vec<HotelListing> = response.results.into_iter().map(HotelListing::from).collect();

    let params = json!({
        "hotel_ids": args.hotel_ids,
        "check_in": search.check_in,
        "check_out": search.check_out,
        "currency": search.currency,
        "language": search.language,
        "adults": search.occupancy.adults,
        "children": search.occupancy.children,
        "discount_only": search.discount_only,
    });
    finish_search(&listings, stay.output.as_ref(), &params)
}

async fn city_search(args: CitySearchArgs) -> Result<ExitCode> {
    args.stay.warn_if_past();
    let stay = &args.stay;
    let search = CitySearch {
        city_id: args.city_id,
        check_in: stay.check_in,
        check_out: stay.check_out,
        currency: stay.currency.to_uppercase(),
        language: stay.language.clone(),
        occupancy: stay.occupancy(),
        min_price: args.min_price,
        max_price: args.max_price,
        min_star_rating: args.min_star_rating,
        min_review_score: args.min_review_score,
        discount_only: stay.discount_only,
        sort_by: args.sort_by,
        max_results: args.max_results,
    };

    let config = Config::from_env()?;
    let client = AgodaClient::new(config.require_credentials()?.clone())?;

    info!("Searching for hotels in city {}...", search.city_id);
    info!("Dates: {} to {}", search.check_in, search.check_out);
    let response = client.city_search(&search).await.context("City search failed")?;
    let listings: Vec<HotelListing> = response.results.into_iter().map(HotelListing::from).collect();

    let params = json!({
        "city_id": search.city_id,
        "check_in": search.check_in,
        "check_out": search.check_out,
        "currency": search.currency,
        "language": search.language,
        "adults": search.occupancy.adults,
        "children": search.occupancy.children,
        "min_price": search.min_price,
        "max_price": search.max_price,
        "min_star_rating": search.min_star_rating,
        "min_review_score": search.min_review_score,
        "discount_only": search.discount_only,
        "sort_by": search.sort_by,
        "max_results": search.max_results,
    });
    finish_search(&listings, stay.output.as_ref(), &params)
}

fn finish_search(listings: &[HotelListing], output: Option<&PathBuf>, params: &serde_json::Value) -> Result<ExitCode> {
    if listings.is_empty() {
        info!("No hotels found matching the criteria");
    } else {
        info!("Found {} hotel(s)", listings.len());
        for (i, listing) in listings.iter().enumerate() {
            println!("\n{}", listing.describe(i + 1));
        }
    }

    if let Some(path) = output {
        save_listings(path, params, listings)?;
    }

    info!("Search completed successfully!");
    Ok(ExitCode::SUCCESS)
}
