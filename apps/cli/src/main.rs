use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use captutor_core::{
    ApiError, CollectionKind, Config, FileStore, ItemKind, ItemStore, LearnError,
    MAX_COLLECTION_LINKS, QuizFormat,
};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

mod library;
mod remote;

#[derive(Parser)]
#[command(name = "captutor")]
#[command(about = "Fetch YouTube captions, keep a transcript library, ask questions and take quizzes")]
struct Cli {
    /// Base URL of the captioning service (overrides CAPTUTOR_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Where the library and chat logs are stored (overrides CAPTUTOR_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List a folder of the library ("Physics/Optics"; root when omitted)
    Ls { path: Option<String> },

    /// Create a folder
    Mkdir {
        #[arg(long = "in")]
        parent: Option<String>,
        name: String,
    },

    /// Save a caption file (captions separated by blank lines) into the library
    Save {
        #[arg(long = "in")]
        parent: Option<String>,
        #[arg(long)]
        title: String,
        #[arg(long)]
        video_id: Option<String>,
        caption_file: PathBuf,
    },

    /// Rename the entry at INDEX (as shown by `ls`)
    Rename {
        #[arg(long = "in")]
        parent: Option<String>,
        index: usize,
        new_name: String,
        #[arg(long, value_enum)]
        kind: CliKind,
    },

    /// Delete the entry at INDEX, including everything below it
    Rm {
        #[arg(long = "in")]
        parent: Option<String>,
        index: usize,
    },

    /// Every non-empty file below a folder
    Files { path: String },

    /// Manage learned video chats
    Chats {
        #[command(subcommand)]
        action: ChatsCommand,
    },

    /// Look up a video and print a page of its captions
    Fetch {
        url: String,
        /// Caption language code. Defaults to the first track offered.
        #[arg(long)]
        lang: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Fetch a video's captions and keep them as a chat
    Learn {
        url: String,
        #[arg(long)]
        lang: Option<String>,
    },

    /// Ask the service a question about the last learned video or folder
    Ask {
        /// Record the exchange in this folder's chat history
        #[arg(long)]
        folder: Option<String>,
        question: String,
    },

    /// Send every saved transcript in a folder to the service
    LearnFolder { name: String },

    /// Generate a quiz for a video
    Quiz {
        video_id: String,
        #[arg(short = 'n', long, default_value_t = 5)]
        num_questions: u32,
        #[arg(long, value_enum, default_value = "mixed")]
        format: CliQuizFormat,
        /// Answer the questions here and submit them for scoring
        #[arg(short, long)]
        interactive: bool,
    },

    /// Fetch channel or video metadata for up to 10 links
    Collections {
        #[arg(value_enum)]
        kind: CliCollection,
        #[arg(required = true, num_args = 1..=MAX_COLLECTION_LINKS)]
        urls: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ChatsCommand {
    List,
    Show { name: String },
    Rename { name: String, new_name: String },
    Rm { name: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum CliKind {
    Folder,
    File,
}

impl From<CliKind> for ItemKind {
    fn from(cli: CliKind) -> Self {
        match cli {
            CliKind::Folder => ItemKind::Folder,
            CliKind::File => ItemKind::File,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliCollection {
    Channels,
    Videos,
}

impl From<CliCollection> for CollectionKind {
    fn from(cli: CliCollection) -> Self {
        match cli {
            CliCollection::Channels => CollectionKind::Channels,
            CliCollection::Videos => CollectionKind::Videos,
        }
    }
}

/// CLI wrapper for QuizFormat (needed for clap ValueEnum)
#[derive(Clone, Copy, Default, ValueEnum)]
enum CliQuizFormat {
    Mcq,
    TrueFalse,
    #[default]
    Mixed,
}

impl From<CliQuizFormat> for QuizFormat {
    fn from(cli: CliQuizFormat) -> Self {
        match cli {
            CliQuizFormat::Mcq => QuizFormat::Mcq,
            CliQuizFormat::TrueFalse => QuizFormat::TrueFalse,
            CliQuizFormat::Mixed => QuizFormat::Mixed,
        }
    }
}

pub(crate) fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("captutor=debug,captutor_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// What the user sees for a failed command.
fn user_message(err: &anyhow::Error) -> String {
    if let Some(api) = err.downcast_ref::<ApiError>() {
        return api.user_message();
    }
    if let Some(learn) = err.downcast_ref::<LearnError>() {
        return learn.to_string();
    }
    format!("{:#}", err)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::from_env();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url.trim_end_matches('/').to_string();
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    tracing::debug!(?config, "configuration loaded");

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("{} {}", style("Error:").red().bold(), user_message(&e));
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Command, config: &Config) -> Result<()> {
    let mut store = ItemStore::open(FileStore::open(&config.data_dir)?);

    match command {
        Command::Ls { path } => library::list(&store, path.as_deref()),
        Command::Mkdir { parent, name } => library::mkdir(&mut store, parent.as_deref(), &name),
        Command::Save {
            parent,
            title,
            video_id,
            caption_file,
        } => library::save(&mut store, parent.as_deref(), &title, video_id, &caption_file),
        Command::Rename {
            parent,
            index,
            new_name,
            kind,
        } => library::rename(&mut store, parent.as_deref(), index, &new_name, kind.into()),
        Command::Rm { parent, index } => library::remove(&mut store, parent.as_deref(), index),
        Command::Files { path } => library::files(&store, &path),
        Command::Chats { action } => match action {
            ChatsCommand::List => library::list_chats(&store),
            ChatsCommand::Show { name } => library::show_chat(&store, &name),
            ChatsCommand::Rename { name, new_name } => {
                library::rename_chat(&mut store, &name, &new_name)
            }
            ChatsCommand::Rm { name } => library::remove_chat(&mut store, &name),
        },
        Command::Fetch { url, lang, page } => {
            remote::fetch(config, &url, lang.as_deref(), page).await
        }
        Command::Learn { url, lang } => {
            remote::learn(config, &mut store, &url, lang.as_deref()).await
        }
        Command::Ask { folder, question } => {
            remote::ask(config, &store, folder.as_deref(), &question).await
        }
        Command::LearnFolder { name } => remote::learn_folder(config, &store, &name).await,
        Command::Quiz {
            video_id,
            num_questions,
            format,
            interactive,
        } => remote::quiz(config, &video_id, num_questions, format.into(), interactive).await,
        Command::Collections { kind, urls } => remote::collections(config, kind.into(), &urls).await,
    }
}
