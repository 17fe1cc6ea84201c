use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use eyre::{Result, WrapErr, bail};
use slotbook::config::Config;
use slotbook::credentials::PlaintextCredentials;
use slotbook::display::{self, ConsoleView};
use slotbook::model::CompanyId;
use slotbook::poller::Poller;
use slotbook::session::Session;
use slotbook::view::AdminTab;
use slotbook::{checks, store};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{Level, info};

#[derive(Parser)]
#[command(name = "slotbook", author, version, about = "Book interview slots at companies")]
struct Cli {
    /// Use FILE instead of slotbook.toml
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Set verbosity level
    #[arg(short, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct StudentLogin {
    #[arg(long)]
    index: String,
    #[arg(long)]
    password: String,
}

#[derive(Args)]
struct AdminLogin {
    #[arg(long = "admin-user")]
    username: String,
    #[arg(long = "admin-password")]
    password: String,
}

#[derive(Subcommand)]
enum Command {
    /// Register a new student
    Register {
        #[arg(long)]
        index: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Manage companies
    Company {
        #[command(subcommand)]
        action: CompanyAction,
    },
    /// List companies as a student sees them
    Companies(StudentLogin),
    /// Request an interview with a company
    Request {
        #[command(flatten)]
        login: StudentLogin,
        #[arg(long)]
        company: String,
    },
    /// List registered students
    Students(AdminLogin),
    /// List interview requests grouped by company
    Requests(AdminLogin),
    /// Export data as CSV on standard output
    Export {
        #[arg(value_enum)]
        what: ExportKind,
        #[command(flatten)]
        admin: AdminLogin,
    },
    /// Verify that stored data is consistent
    Check,
    /// Log in and keep the view refreshed until interrupted
    Watch {
        #[arg(long, conflicts_with = "admin_user", required_unless_present = "admin_user")]
        index: Option<String>,
        #[arg(long)]
        admin_user: Option<String>,
        #[arg(long)]
        password: String,
        #[arg(long, value_enum, default_value = "companies")]
        tab: Tab,
    },
}

#[derive(Subcommand)]
enum CompanyAction {
    Add {
        #[command(flatten)]
        admin: AdminLogin,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        slots: u32,
    },
    Update {
        #[command(flatten)]
        admin: AdminLogin,
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        slots: u32,
    },
    Delete {
        #[command(flatten)]
        admin: AdminLogin,
        #[arg(long)]
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    List(AdminLogin),
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportKind {
    Students,
    Requests,
}

#[derive(Clone, Copy, ValueEnum)]
enum Tab {
    Companies,
    Students,
    Requests,
}

impl From<Tab> for AdminTab {
    fn from(tab: Tab) -> Self {
        match tab {
            Tab::Companies => AdminTab::Companies,
            Tab::Students => AdminTab::Students,
            Tab::Requests => AdminTab::Requests,
        }
    }
}

async fn admin_session(config: &Config, admin: &AdminLogin) -> Result<Session> {
    let mut session = open_session(config).await?;
    session.login_admin(&admin.username, &admin.password).await?;
    Ok(session)
}

async fn student_session(config: &Config, login: &StudentLogin) -> Result<Session> {
    let mut session = open_session(config).await?;
    session.login_student(&login.index, &login.password).await?;
    Ok(session)
}

async fn open_session(config: &Config) -> Result<Session> {
    let store = store::open(&config.store)
        .await
        .wrap_err("cannot open store")?;
    let credentials = Arc::new(PlaintextCredentials::new(config.admin.clone()));
    Ok(Session::open(store, credentials).await)
}

/// Log out, then report the outcome of the operation done while logged in.
async fn finish<T, E>(session: &mut Session, result: Result<T, E>) -> Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    session.logout().await?;
    Ok(result?)
}

async fn run_company(config: &Config, action: CompanyAction) -> Result<()> {
    match action {
        CompanyAction::Add {
            admin,
            name,
            description,
            slots,
        } => {
            let mut session = admin_session(config, &admin).await?;
            let result = session.add_company(&name, &description, slots).await;
            let company = finish(&mut session, result).await?;
            println!("Company \"{}\" added with id {}", company.name, company.id);
        }
        CompanyAction::Update {
            admin,
            id,
            name,
            description,
            slots,
        } => {
            let mut session = admin_session(config, &admin).await?;
            let result = session
                .update_company(&CompanyId(id), &name, &description, slots)
                .await;
            let company = finish(&mut session, result).await?;
            println!(
                "Company \"{}\" updated: {}",
                company.name,
                company.slots_text()
            );
        }
        CompanyAction::Delete { admin, id, yes } => {
            if !yes {
                bail!("refusing to delete company {id} without --yes");
            }
            let mut session = admin_session(config, &admin).await?;
            let result = session.delete_company(&CompanyId(id)).await;
            let company = finish(&mut session, result).await?;
            println!("Company \"{}\" deleted", company.name);
        }
        CompanyAction::List(admin) => {
            let mut session = admin_session(config, &admin).await?;
            let result = display::display_admin_companies(&mut io::stdout().lock(), session.snapshot());
            finish(&mut session, result).await?;
        }
    }
    Ok(())
}

async fn watch(
    config: &Config,
    index: Option<String>,
    admin_user: Option<String>,
    password: String,
    tab: Tab,
) -> Result<()> {
    let mut session = open_session(config).await?;
    match (index, admin_user) {
        (Some(index), _) => {
            session.login_student(&index, &password).await?;
        }
        (None, Some(username)) => {
            session.login_admin(&username, &password).await?;
            session.switch_admin_tab(tab.into());
        }
        (None, None) => bail!("either --index or --admin-user is required"),
    }
    let session = Arc::new(Mutex::new(session));
    let view = Arc::new(Mutex::new(ConsoleView::new(io::stdout())));
    let mut poller = Poller::new(Arc::clone(&session), view, config.poll.interval());
    poller.refresh_now().await;
    poller.start();
    info!(period = ?poller.period(), "watching for changes, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .wrap_err("cannot wait for interruption")?;
    poller.stop();
    session.lock().await.logout().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
    let config = Config::locate(cli.config.as_deref())?;
    match cli.command {
        Command::Register {
            index,
            name,
            email,
            password,
        } => {
            let mut session = open_session(&config).await?;
            let student = session.register(&index, &name, &email, &password).await?;
            println!(
                "Registration successful for {student}, {} interview requests available",
                student.remaining_requests
            );
        }
        Command::Company { action } => run_company(&config, action).await?,
        Command::Companies(login) => {
            let mut session = student_session(&config, &login).await?;
            let result = match session.user() {
                Some(user) => {
                    let mut out = io::stdout().lock();
                    display::display_header(&mut out, user).and_then(|()| {
                        display::display_student_companies(&mut out, session.snapshot(), user)
                    })
                }
                None => Ok(()),
            };
            finish(&mut session, result).await?;
        }
        Command::Request { login, company } => {
            let mut session = student_session(&config, &login).await?;
            let result = session.request_interview(&CompanyId(company)).await;
            let request = finish(&mut session, result).await?;
            println!(
                "Interview request with {} submitted successfully!",
                request.company_name
            );
        }
        Command::Students(admin) => {
            let mut session = admin_session(&config, &admin).await?;
            let result = display::display_students(&mut io::stdout().lock(), session.snapshot());
            finish(&mut session, result).await?;
        }
        Command::Requests(admin) => {
            let mut session = admin_session(&config, &admin).await?;
            let result = display::display_requests(&mut io::stdout().lock(), session.snapshot());
            finish(&mut session, result).await?;
        }
        Command::Export { what, admin } => {
            let mut session = admin_session(&config, &admin).await?;
            let result = match what {
                ExportKind::Students => display::export_students(io::stdout().lock(), session.snapshot()),
                ExportKind::Requests => display::export_requests(io::stdout().lock(), session.snapshot()),
            };
            finish(&mut session, result).await?;
        }
        Command::Check => {
            let store = store::open(&config.store)
                .await
                .wrap_err("cannot open store")?;
            let snapshot = store::load_snapshot(store.as_ref()).await;
            for violation in checks::verify(&snapshot) {
                println!("  - {violation}");
            }
            checks::ensure_consistent(&snapshot)?;
            println!("Stored data is consistent");
        }
        Command::Watch {
            index,
            admin_user,
            password,
            tab,
        } => watch(&config, index, admin_user, password, tab).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotbook::store::{MemoryStore, Store};

    #[tokio::test]
    async fn test_failed_display_still_logs_out() {
        let store = MemoryStore::default();
        let mut session = Session::open(
            Arc::new(store.clone()),
            Arc::new(PlaintextCredentials::default()),
        )
        .await;
        session.login_admin("admin", "admin123").await.unwrap();
        let key = store::current_user_key(session.id());
        assert!(store.get(&key).await.unwrap().is_some());

        let result: io::Result<()> = Err(io::Error::other("broken pipe"));
        assert!(finish(&mut session, result).await.is_err());
        assert!(session.user().is_none());
        assert!(store.get(&key).await.unwrap().is_none());
    }
}
