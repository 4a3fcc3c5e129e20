use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use lectionary::check::{self, HttpLinkChecker, LinkChecker};
use lectionary::cloudinary::{CloudinaryHost, Credentials, ImageHost};
use lectionary::daily::{self, DailyOptions, Services};
use lectionary::imaging::PlaceholderGenerator;
use lectionary::scripture::PlaceholderSource;
use lectionary::{config, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Date selection shared by commands that build a post.
#[derive(clap::Args, Clone)]
struct DateArgs {
    /// Date to build for (YYYY-MM-DD). Defaults to today in the configured timezone
    #[arg(long)]
    date: Option<NaiveDate>,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "lectionary")]
#[command(about = "Daily lectionary post generator for a Hugo site")]
#[command(long_about = "\
Daily lectionary post generator for a Hugo site

Looks up today's readings, writes a Markdown post with YAML front matter,
uploads a cover image to Cloudinary, and rebuilds the site.

Project structure:

  site/
  ├── lectionary.toml              # Optional config (see gen-config)
  ├── scripts/readings.tsv         # One row per day: date, dow, title, first,
  │                                #   psalm, second, alleluia, gospel
  ├── content/post/                # Generated posts (<slug>.md)
  └── .lectionary-cache.json       # Upload cache (safe to delete)

Metadata resolution (first non-empty wins):
  Title: gospel → first reading → calendar title → title_fallback
  Slug:  gospel → first reading → calendar title → date

Cloudinary credentials come from CLOUDINARY_URL, or from
CLOUDINARY_API_KEY, CLOUDINARY_API_SECRET and CLOUDINARY_CLOUD_NAME.

Run 'lectionary gen-config' to generate a documented lectionary.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Project root (where lectionary.toml and the Hugo site live)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write today's post, upload its cover, and rebuild the site
    Daily {
        #[command(flatten)]
        date: DateArgs,
        /// Do not generate or upload a cover; keep the existing one
        #[arg(long)]
        no_upload: bool,
        /// Upload even if the cover is unchanged since the last run
        #[arg(long)]
        no_cache: bool,
        /// Do not run the site build afterwards
        #[arg(long)]
        skip_build: bool,
    },
    /// Print the post `daily` would write, without writing anything
    Show(DateArgs),
    /// Validate front matter and image links of every post
    Check {
        /// Also request every image URL over the network
        #[arg(long)]
        online: bool,
    },
    /// Print a stock lectionary.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Daily {
            date,
            no_upload,
            no_cache,
            skip_build,
        } => {
            let config = config::load_config(&cli.root)?;
            let host = if no_upload {
                None
            } else {
                let credentials = Credentials::from_env()?;
                Some(CloudinaryHost::new(credentials, config.cloudinary.clone()))
            };
            let generator = PlaceholderGenerator::new(config.image.width, config.image.height);
            let services = Services {
                scripture: &PlaceholderSource,
                images: &generator,
                host: host.as_ref().map(|h| h as &dyn ImageHost),
            };
            let options = DailyOptions {
                date: date.date,
                upload: !no_upload,
                use_cache: !no_cache,
                build_site: !skip_build,
            };
            let report = daily::run_daily(&cli.root, &config, options, &services)?;
            output::print_daily_report(&report, &cli.root);
        }
        Command::Show(date) => {
            let config = config::load_config(&cli.root)?;
            let preview = daily::preview(&cli.root, &config, date.date, &PlaceholderSource)?;
            output::print_preview(&preview, &cli.root)?;
        }
        Command::Check { online } => {
            let config = config::load_config(&cli.root)?;
            let content_dir = cli.root.join(&config.content_dir);
            println!("==> Checking {}", content_dir.display());
            let links = online.then(|| HttpLinkChecker::new(config.check.timeout_secs));
            let report = check::check_content(
                &content_dir,
                links.as_ref().map(|l| l as &dyn LinkChecker),
                config::effective_workers(&config.check),
            )?;
            output::print_check_report(&report);
            if !report.is_clean() {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
