use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use env_logger::Env;

use listmailer::api::MailApi;
use listmailer::error::{Error, Operation, Result};
use listmailer::lists::{Deletion, Fetch, ListStore};
use listmailer::session::Authenticator;
use listmailer::ui::{self, views};
use listmailer::{ApiClient, Composer, ContactBook, HtmlBuffer, Insert, RichTextEditor, SendHistory, Settings, extract_emails};

#[derive(Parser, Debug)]
#[command(name = "listmailer", about = "Manage recipient lists and send email campaigns")]
struct Cli {
    /// Base URL of the mail API (overrides settings and LISTMAILER_API_URL).
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a session (prompts for missing credentials). Saves --api-url.
    Login {
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Close the session.
    Logout,
    /// Show session state and API endpoint.
    Status,
    /// Print the addresses found in a text without contacting the server.
    Extract {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    #[command(flatten)]
    Remote(Remote),
}

/// Commands that need a session and the API.
#[derive(Subcommand, Debug)]
enum Remote {
    /// Show all recipient lists.
    Lists,
    /// Create a recipient list.
    CreateList { name: String },
    /// Delete a recipient list and its associations.
    DeleteList {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Show the addresses in a list.
    Contacts { list_id: i64 },
    /// Add one address to a list.
    Add { list_id: i64, email: String },
    /// Import every address found in a text (stdin unless --file).
    Import {
        list_id: i64,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Send a campaign to one list.
    Send {
        #[arg(long)]
        list: i64,
        #[arg(long)]
        subject: String,
        /// HTML body read from a file.
        #[arg(long, conflicts_with = "html", required_unless_present = "html")]
        body_file: Option<PathBuf>,
        /// HTML body given inline.
        #[arg(long)]
        html: Option<String>,
        /// Image to upload and append to the body; repeatable.
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },
    /// Show past sends.
    History,
    /// Upload an image and print its hosted URL.
    Upload { path: PathBuf },
    /// Address book not tied to any list.
    Book {
        #[command(subcommand)]
        action: BookAction,
    },
}

#[derive(Subcommand, Debug)]
enum BookAction {
    List,
    Add { email: String },
    Edit { id: i64, email: String },
    Remove {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::debug!("{e:?}");
        eprintln!("error: {}", e.user_message());
        std::process::exit(1);
    }
}

fn read_text(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".into())
}

fn assume_yes(_: &str) -> bool {
    true
}

fn confirmer(yes: bool) -> fn(&str) -> bool {
    if yes { assume_yes } else { ui::confirm_on_terminal }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load()?;
    let url_given = cli.api_url.is_some();
    if url_given {
        settings.apply_overrides(cli.api_url, None)?;
    }

    match cli.command {
        Command::Login { user, password } => {
            let mut session = settings.session()?;
            ui::login::login(&mut session, user, password)?;
            if url_given {
                settings.save()?;
            }
            println!("Logged in.");
            Ok(())
        }
        Command::Logout => {
            settings.session()?.logout()?;
            println!("Logged out.");
            Ok(())
        }
        Command::Status => {
            let session = settings.session()?;
            let state = if session.is_authenticated() { "logged in" } else { "logged out" };
            println!("{state}, API at {}", settings.base_url);
            Ok(())
        }
        Command::Extract { file } => {
            let found = extract_emails(&read_text(file.as_deref())?);
            if found.is_empty() {
                return Err(Error::NoAddressesFound);
            }
            for email in found {
                println!("{email}");
            }
            Ok(())
        }
        Command::Remote(remote) => {
            ui::login::require(&settings.session()?)?;
            let api = settings.api_client()?;
            listmailer::utils::block_on(run_remote(api, remote))
        }
    }
}

async fn open(store: &ListStore<ApiClient>, list_id: i64) -> Result<()> {
    store.refresh_lists().await?;
    let list = store
        .lists()
        .into_iter()
        .find(|l| l.id == list_id)
        .ok_or(Error::UnknownList(list_id))?;
    store.open_list(list).await?;
    Ok(())
}

fn print_open_list(store: &ListStore<ApiClient>) {
    if let Some(list) = store.active_list() {
        print!("{}", views::contacts(&list, &store.contacts()));
    }
}

async fn run_remote(api: ApiClient, command: Remote) -> Result<()> {
    match command {
        Remote::Lists => {
            let store = ListStore::new(api);
            if let Fetch::Completed(lists) = store.refresh_lists().await? {
                print!("{}", views::lists(&lists));
            }
        }
        Remote::CreateList { name } => {
            let store = ListStore::new(api);
            let list = store.create_list(&name).await?;
            println!("List created: {} ({})", list.name, list.id);
        }
        Remote::DeleteList { id, yes } => {
            let store = ListStore::new(api);
            match store.delete_list(id, &confirmer(yes)).await? {
                Deletion::Deleted => println!("List deleted."),
                Deletion::Declined => println!("Nothing deleted."),
            }
        }
        Remote::Contacts { list_id } => {
            let store = ListStore::new(api);
            open(&store, list_id).await?;
            print_open_list(&store);
        }
        Remote::Add { list_id, email } => {
            let store = ListStore::new(api);
            open(&store, list_id).await?;
            match store.add_contact(&email).await? {
                Insert::AlreadyPresent => println!("Address already in the list."),
                _ => println!("Address added to the list."),
            }
            print_open_list(&store);
        }
        Remote::Import { list_id, file } => {
            let text = read_text(file.as_deref())?;
            let store = ListStore::new(api);
            open(&store, list_id).await?;
            let report = store.import_text(&text).await?;
            print!("{}", views::import_report(&report));
            print_open_list(&store);
        }
        Remote::Send {
            list,
            subject,
            body_file,
            html,
            images,
        } => {
            let body = match (body_file, html) {
                (Some(path), _) => std::fs::read_to_string(path)?,
                (None, Some(html)) => html,
                (None, None) => String::new(),
            };
            let mut composer = Composer::new(HtmlBuffer::default());
            composer.editor_mut().set_content(&body);
            composer.set_subject(subject);
            composer.select_list(Some(list));
            // Fail before uploading anything.
            composer.request()?;
            for path in &images {
                let bytes = std::fs::read(path)?;
                let location = composer.attach_image(&api, &file_name(path), bytes).await?;
                log::info!("uploaded {} to {location}", path.display());
            }
            let mut history = SendHistory::default();
            let result = composer.submit(&api, &mut history).await?;
            print!("{}", views::send_result(&result));
        }
        Remote::History => {
            let mut history = SendHistory::default();
            print!("{}", views::history(history.refresh(&api).await?));
        }
        Remote::Upload { path } => {
            let bytes = std::fs::read(&path)?;
            let location = api
                .upload_image(&file_name(&path), bytes)
                .await
                .map_err(|e| Error::api(Operation::UploadImage, e))?;
            println!("{location}");
        }
        Remote::Book { action } => {
            let mut book = ContactBook::new(api);
            match action {
                BookAction::List => print!("{}", views::book(book.refresh().await?)),
                BookAction::Add { email } => print!("{}", views::book(book.add(&email).await?)),
                BookAction::Edit { id, email } => {
                    print!("{}", views::book(book.edit(id, &email).await?))
                }
                BookAction::Remove { id, yes } => {
                    if book.remove(id, &confirmer(yes)).await? == Deletion::Deleted {
                        print!("{}", views::book(book.contacts()));
                    }
                }
            }
        }
    }
    Ok(())
}
