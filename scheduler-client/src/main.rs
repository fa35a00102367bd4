use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use meeting_scheduler_lib::{
    ApiClient, Availability, Config, LogNotifier, Meeting, MeetingStore, NewMeeting,
    Notifications, Participant, StoreError, TimeOfDay,
};

#[derive(Parser)]
#[command(name = "meeting-scheduler")]
#[command(about = "Propose meeting dates and collect everyone's availability")]
struct Cli {
    /// Scheduling service URL (overrides SCHEDULER_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Propose a new meeting
    Create {
        /// Meeting title
        #[arg(long)]
        name: String,

        /// Who is organizing it
        #[arg(long)]
        organizer: String,

        /// Candidate date (YYYY-MM-DD), repeat for several
        #[arg(long = "date", required = true)]
        dates: Vec<NaiveDate>,

        /// Start of the daily window (HH:MM)
        #[arg(long)]
        start: TimeOfDay,

        /// End of the daily window (HH:MM)
        #[arg(long)]
        end: TimeOfDay,
    },
    /// Show a meeting, its slots and everyone's answers
    Show {
        /// Meeting id
        id: String,
    },
    /// Answer a meeting's availability
    Join {
        /// Meeting id
        id: String,

        /// Your name
        #[arg(long)]
        name: String,

        /// Optional comment for the organizer
        #[arg(long)]
        comment: Option<String>,

        /// Slot key you can attend (e.g. 2024-01-01-09:30), repeatable
        #[arg(long = "available")]
        available: Vec<String>,

        /// Slot key you cannot attend, repeatable
        #[arg(long = "unavailable")]
        unavailable: Vec<String>,
    },
    /// List who has answered so far
    Participants {
        /// Meeting id
        id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    meeting_scheduler_lib::logging::init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }

    let api = match ApiClient::new(&config.api_base_url) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let store = MeetingStore::with_config(api, &config)
        .with_notifications(Notifications::new(Arc::new(LogNotifier)));

    match run(&store, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(store: &MeetingStore<ApiClient>, command: Commands) -> Result<(), StoreError> {
    match command {
        Commands::Create {
            name,
            organizer,
            dates,
            start,
            end,
        } => {
            let meeting = store
                .create_meeting(NewMeeting {
                    name,
                    organizer,
                    dates,
                    start_time: start,
                    end_time: end,
                })
                .await?;
            println!("Created {} ({})", meeting.name, meeting.id);
            println!("Share: {}", meeting.share_path());
        }
        Commands::Show { id } => {
            let meeting = store.get_meeting(&id).await?;
            print_meeting(&meeting, store);
        }
        Commands::Join {
            id,
            name,
            comment,
            available,
            unavailable,
        } => {
            store.get_meeting(&id).await?;

            let mut participant = Participant::new(name);
            participant.comment = comment;
            for key in available {
                participant = participant.answer(key, Availability::Available);
            }
            for key in unavailable {
                participant = participant.answer(key, Availability::Unavailable);
            }

            store.add_participant(&id, participant).await?;
            println!("Thanks! {} participant(s) so far.", store.participants().len());
        }
        Commands::Participants { id } => {
            let participants = store.refresh_participants(&id).await?;
            if participants.is_empty() {
                println!("Nobody has answered yet.");
            }
            for p in participants {
                match p.comment.as_deref() {
                    Some(comment) if !comment.is_empty() => println!("{} ({})", p.name, comment),
                    _ => println!("{}", p.name),
                }
            }
        }
    }
    Ok(())
}

fn print_meeting(meeting: &Meeting, store: &MeetingStore<ApiClient>) {
    println!("{} organized by {}", meeting.name, meeting.organizer);
    println!("Share: {}", meeting.share_path());
    println!(
        "Window: {} - {}, {} date(s)",
        meeting.start_time,
        meeting.end_time,
        meeting.dates.len()
    );

    for slot in store.slots() {
        let yes = meeting
            .participants
            .iter()
            .filter(|p| p.availability.get(&slot.key) == Some(&Availability::Available))
            .count();
        println!("  {}  {}/{}", slot.key, yes, meeting.participants.len());
    }
}
