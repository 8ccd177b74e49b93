use std::sync::Arc;

use anyhow::{anyhow, Context};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Select, Text};

use crate::clients::on_this_day::{OnThisDayClient, WikimediaClient};
use crate::clients::planner_client::{HttpPlannerBackend, LocalPlannerBackend, PlannerBackend};
use crate::config::Settings;
use crate::models::date_key::DateKey;
use crate::models::day::NoteId;
use crate::runtime;
use crate::view::calendar;
use crate::view::controller::CalendarController;

#[derive(Parser)]
#[command(about = "Day planner calendar client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a month grid with open-note badges
    Month {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
    /// Show the notes and on-this-day fact for a date (YYYY-M-D)
    Day { date: String },
    /// Add a note to a date
    Add { date: String, content: String },
    /// Mark a note complete
    Complete { date: String, id: NoteId },
    /// Fetch the on-this-day fact for a date and store it
    Fact { date: String },
    /// Browse the calendar interactively
    Interactive {},
}

const MENU_OPEN_DAY: &str = "Open day";
const MENU_ADD_NOTE: &str = "Add note";
const MENU_COMPLETE_NOTE: &str = "Complete note";
const MENU_REQUEST_FACT: &str = "Request on-this-day data";
const MENU_CLOSE_DAY: &str = "Close day";
const MENU_PREVIOUS: &str = "Previous month";
const MENU_NEXT: &str = "Next month";
const MENU_QUIT: &str = "Quit";

pub async fn cli(settings: Settings) -> anyhow::Result<()> {
    let cli = Cli::parse();
    let backend = backend_for(&settings)?;
    let facts: Arc<dyn OnThisDayClient> = Arc::new(WikimediaClient::new(&settings.on_this_day_url));
    let today = today_in(&settings);

    match cli.command {
        Commands::Month { year, month } => {
            let mut controller = CalendarController::new(backend, facts, today);
            let year = year.unwrap_or(controller.state().year);
            let month = month.unwrap_or(controller.state().month);
            if !controller.show_month(year, month).await {
                return Err(anyhow!("Invalid month {}-{}", year, month));
            }
            print!("{}", controller.render());
        }
        Commands::Day { date } => {
            let date = parse_date(&date)?;
            let record = backend.get_day_data(&date).await?.unwrap_or_default();
            print!("{}", calendar::render_detail(date, &record));
        }
        Commands::Add { date, content } => {
            let date = parse_date(&date)?;
            let note = backend.add_note(&date, &content).await?;
            println!("Added note #{} to {}", note.id, date);
        }
        Commands::Complete { date, id } => {
            let date = parse_date(&date)?;
            backend.complete_note(&date, id).await?;
            println!("Completed note #{} on {}", id, date);
        }
        Commands::Fact { date } => {
            let date = parse_date(&date)?;
            match facts.fetch_fact(date.month(), date.day()).await? {
                Some(fact) => {
                    backend.store_on_this_day(&date, &fact).await?;
                    println!("{} ({})\n{}", fact.title, fact.year, fact.wiki_link);
                }
                None => println!("No on-this-day data for {}", date),
            }
        }
        Commands::Interactive {} => {
            let controller = CalendarController::new(backend, facts, today);
            interactive(controller).await?;
        }
    }
    Ok(())
}

fn backend_for(settings: &Settings) -> anyhow::Result<Arc<dyn PlannerBackend>> {
    Ok(match &settings.backend_url {
        Some(url) => Arc::new(HttpPlannerBackend::new(url)),
        None => Arc::new(LocalPlannerBackend::new(runtime::open_service(settings)?)),
    })
}

fn parse_date(raw: &str) -> anyhow::Result<DateKey> {
    raw.parse()
        .with_context(|| format!("Expected a date like 2024-3-15, got {}", raw))
}

async fn interactive(mut controller: CalendarController) -> anyhow::Result<()> {
    controller.load_month().await;
    loop {
        println!("\n{}", controller.render());
        let options = menu_options(controller.state().selected.is_some());
        let choice = Select::new("What next?", options).prompt()?;
        match choice {
            MENU_OPEN_DAY => {
                let day = CustomType::<u32>::new("Day of month?").prompt()?;
                controller.select_day(day).await;
            }
            MENU_ADD_NOTE => {
                let content = Text::new("New note").prompt()?;
                controller.add_note(&content).await;
            }
            MENU_COMPLETE_NOTE => {
                let id = CustomType::<NoteId>::new("Note id?").prompt()?;
                controller.complete_note(id).await;
            }
            MENU_REQUEST_FACT => controller.request_fact().await,
            MENU_CLOSE_DAY => controller.close_day(),
            MENU_PREVIOUS => controller.previous_month().await,
            MENU_NEXT => controller.next_month().await,
            _ => return Ok(()),
        }
    }
}

fn menu_options(day_open: bool) -> Vec<&'static str> {
    let mut options = Vec::new();
    if day_open {
        options.extend([MENU_ADD_NOTE, MENU_COMPLETE_NOTE, MENU_REQUEST_FACT, MENU_CLOSE_DAY]);
    } else {
        options.push(MENU_OPEN_DAY);
    }
    options.extend([MENU_PREVIOUS, MENU_NEXT, MENU_QUIT]);
    options
}

fn today_in(settings: &Settings) -> NaiveDate {
    Utc::now().with_timezone(&settings.timezone).date_naive()
}
