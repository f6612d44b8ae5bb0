use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use std::path::PathBuf;

use blockwise::category::{self, CategoryId};
use blockwise::config::Config;
use blockwise::context::AppContext;
use blockwise::news::{FailurePolicy, NewsClient, NewsError, Story};
use blockwise::storage::{AuthError, Database, SignupForm, StorageError};
use blockwise::summarize::Summarizer;
use blockwise::util::tidy_html;

/// Fixed user-facing string for provider failures; the provider's own
/// message is logged, never shown.
const STORY_LOAD_ERROR: &str = "Couldn't load stories right now. Please try again.";

/// Get the config directory path (~/.config/blockwise/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("blockwise");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(
    name = "blockwise",
    about = "Local-first news digest: trending stories, AI summaries, saved articles"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show trending stories for your preferred (or given) categories
    Trending {
        /// Category ids (1-9); defaults to your stored preferences
        #[arg(long = "category", value_name = "ID")]
        categories: Vec<CategoryId>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Keep going when a category fails instead of aborting the batch
        #[arg(long)]
        partial: bool,
    },
    /// Search stories by free text
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Fetch a story page and print an AI summary of it
    Read { url: String },
    /// List the categories and their ids
    Categories,
    /// Save a story to the saved list
    Save {
        url: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        summary: String,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        category: Option<CategoryId>,
    },
    /// Remove a story from the saved list
    Unsave { url: String },
    /// List saved stories
    Saved,
    /// Show (no args) or replace (with ids) topic preferences
    Prefs {
        #[arg(value_name = "ID")]
        ids: Vec<CategoryId>,
    },
    /// Create the local account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        confirm_email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Log in to the local account
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log out; clears the session and your saved list
    Logout,
    /// Reset the account password (the email must match the account)
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        new_password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Delete the account and all of its data
    DeleteAccount,
    /// Show or change display settings
    Theme {
        #[arg(long)]
        dark: Option<bool>,
        #[arg(long)]
        font_scale: Option<f32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Set up config directory
    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    // User-only access: the store under this directory holds a credential hash.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config = Config::load(&config_dir.join("config.toml"))?;

    let db_path = config_dir.join("news.db");
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(StorageError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of blockwise appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open store: {}", e));
        }
    };

    run_command(args.command, &config, &db).await
}

async fn run_command(command: Command, config: &Config, db: &Database) -> Result<()> {
    match command {
        Command::Trending {
            categories,
            page,
            partial,
        } => {
            let ids = if categories.is_empty() {
                db.load_preferences(&db.user_key().await?).await?
            } else {
                categories
            };
            if ids.is_empty() {
                println!("No categories selected. Run `blockwise prefs 1 2 3` or pass --category.");
                return Ok(());
            }

            let policy = if partial {
                FailurePolicy::Partial
            } else {
                FailurePolicy::Strict
            };
            match news_client(config)?.fetch_trending(&ids, page, policy).await {
                Ok(stories) => print_stories(&stories),
                Err(e) => report_news_error(e),
            }
        }

        Command::Search { query, page } => {
            match news_client(config)?.search_stories(&query, page).await {
                Ok(stories) => print_stories(&stories),
                Err(e) => report_news_error(e),
            }
        }

        Command::Read { url } => {
            let news = news_client(config)?;
            let summarizer = summarizer(config)?;

            // Whatever we already know about the story becomes the fallback
            // when the model can't produce a summary.
            let user_key = db.user_key().await?;
            let known = db
                .load_saved(&user_key)
                .await?
                .into_iter()
                .find(|s| s.id == url)
                .unwrap_or_else(|| Story {
                    id: url.clone(),
                    title: String::new(),
                    summary: String::new(),
                    url: url.clone(),
                    image: None,
                    category: None,
                });

            match news.get_full_story(&url).await {
                Ok(full) => {
                    let plain = tidy_html(&full.html);
                    let summary = summarizer.summarise_article(&known, &plain).await;
                    if !known.title.is_empty() {
                        println!("{}\n", known.title);
                    }
                    println!("{summary}");
                    if let Some(cat) = known.category.and_then(category::by_id) {
                        println!("\nLearn more:");
                        for link in cat.partners {
                            println!("  {}: {}", link.label, link.url);
                        }
                    }
                }
                Err(e) => report_news_error(e),
            }
        }

        Command::Categories => {
            for cat in category::all() {
                println!("{}. {} ({})", cat.id, cat.label, cat.color);
            }
        }

        Command::Save {
            url,
            title,
            summary,
            image,
            category,
        } => {
            let story = Story {
                id: url.clone(),
                title,
                summary,
                url,
                image,
                category,
            };
            let user_key = db.user_key().await?;
            db.save_story(&user_key, &story).await?;
            println!("Saved.");
        }

        Command::Unsave { url } => {
            let user_key = db.user_key().await?;
            db.unsave_story(&user_key, &url).await?;
            println!("Removed.");
        }

        Command::Saved => {
            let user_key = db.user_key().await?;
            let saved = db.load_saved(&user_key).await?;
            if saved.is_empty() {
                println!("No saved stories.");
            } else {
                print_stories(&saved);
            }
        }

        Command::Prefs { ids } => {
            let user_key = db.user_key().await?;
            if ids.is_empty() {
                let prefs = db.load_preferences(&user_key).await?;
                if prefs.is_empty() {
                    println!("No preferences set.");
                } else {
                    for id in prefs {
                        match category::by_id(id) {
                            Some(cat) => println!("{}. {}", cat.id, cat.label),
                            None => println!("{}. (unknown)", id),
                        }
                    }
                }
            } else {
                if let Some(bad) = ids.iter().find(|id| category::by_id(**id).is_none()) {
                    eprintln!("Unknown category id {bad}. Run `blockwise categories`.");
                    std::process::exit(1);
                }
                db.save_preferences(&user_key, &ids).await?;
                println!("Preferences updated.");
            }
        }

        Command::Signup {
            email,
            confirm_email,
            password,
            confirm_password,
        } => {
            let form = SignupForm {
                email,
                confirm_email,
                password,
                confirm_password,
            };
            match db.sign_up(&form).await {
                Ok(()) => println!("Account created! You can now log in."),
                Err(e) => report_auth_error(e)?,
            }
        }

        Command::Login { email, password } => match db.log_in(&email, &password).await {
            Ok(user) => println!("Logged in as {user}."),
            Err(e) => report_auth_error(e)?,
        },

        Command::Logout => {
            db.log_out().await?;
            println!("Logged out.");
        }

        Command::ResetPassword {
            email,
            new_password,
            confirm_password,
        } => {
            // complete_password_reset re-verifies the email, so the
            // two-step flow collapses to one call here.
            match db
                .complete_password_reset(&email, &new_password, &confirm_password)
                .await
            {
                Ok(()) => println!("Password updated! You can now log in."),
                Err(e) => report_auth_error(e)?,
            }
        }

        Command::DeleteAccount => {
            db.delete_account().await?;
            println!("Account and local data removed.");
        }

        Command::Theme { dark, font_scale } => {
            let mut ctx = AppContext::load(db.clone()).await?;
            if let Some(dark) = dark {
                ctx.set_dark(dark).await?;
            }
            if let Some(scale) = font_scale {
                ctx.set_font_scale(scale).await?;
            }
            println!(
                "dark: {}, font scale: {}",
                ctx.dark(),
                ctx.font_scale()
            );
        }
    }

    Ok(())
}

fn news_client(config: &Config) -> Result<NewsClient> {
    let key = config.news_key().ok_or_else(|| {
        anyhow::anyhow!("No news API key. Set NEWS_API_KEY or news_api_key in config.toml.")
    })?;
    Ok(NewsClient::new(
        reqwest::Client::new(),
        config.news_base_url.clone(),
        key,
    ))
}

fn summarizer(config: &Config) -> Result<Summarizer> {
    let key: SecretString = config.llm_key().ok_or_else(|| {
        anyhow::anyhow!("No LLM API key. Set OPENAI_API_KEY or llm_api_key in config.toml.")
    })?;
    Ok(Summarizer::new(
        reqwest::Client::new(),
        config.llm_base_url.clone(),
        key,
        config.llm_model.clone(),
    ))
}

fn print_stories(stories: &[Story]) {
    for (i, story) in stories.iter().enumerate() {
        let label = story
            .category
            .and_then(category::by_id)
            .map(|c| format!(" [{}]", c.label))
            .unwrap_or_default();
        println!("{}. {}{}", i + 1, story.title, label);
        if !story.summary.is_empty() {
            println!("   {}", story.summary);
        }
        println!("   {}", story.url);
    }
}

/// Provider failures surface as one fixed retry-suggesting line; the real
/// error goes to the log.
fn report_news_error(e: NewsError) {
    tracing::warn!(error = %e, "News request failed");
    eprintln!("{STORY_LOAD_ERROR}");
    std::process::exit(1);
}

/// Auth errors have user-ready Display text; storage errors propagate.
fn report_auth_error(e: AuthError) -> Result<()> {
    match e {
        AuthError::Storage(inner) => Err(inner),
        other => {
            eprintln!("{other}");
            std::process::exit(1);
        }
    }
}
