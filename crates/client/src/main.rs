use anyhow::{Context, bail};
use tokio::io::{AsyncBufReadExt, BufReader};

use navgate_auth::Credentials;
use navgate_client::{App, ClientConfig, LogQuery, UserQuery};
use navgate_guard::NavigationOutcome;

const HELP: &str = "commands:
  go <path>                 navigate (push)
  replace <path>            navigate (replace)
  login <user> <password>   log in and follow the pending redirect
  logout
  where                     current route
  menus | routes | tabs | history
  admin users|logs|stats
  help | quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    navgate_observability::init();

    let config = ClientConfig::from_env().context("invalid configuration")?;
    let app = App::build(config).context("failed to start")?;
    app.portal().resume();

    let outcome = app.portal().navigator().push("/").await?;
    report(&outcome);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };
        if command == "quit" || command == "exit" {
            break;
        }
        if let Err(err) = run(&app, command, args).await {
            eprintln!("error: {err:#}");
        }
    }
    Ok(())
}

async fn run(app: &App, command: &str, args: &[&str]) -> anyhow::Result<()> {
    let portal = app.portal();
    match (command, args) {
        ("go", [path]) => report(&portal.navigator().push(*path).await?),
        ("replace", [path]) => report(&portal.navigator().replace(*path).await?),
        ("login", [user, password]) => report(&portal.login(&Credentials::new(*user, *password)).await?),
        ("logout", []) => report(&portal.logout().await?),
        ("where", []) => match portal.navigator().current() {
            Some(current) => println!("{} ({})", current.location, current.name),
            None => println!("nowhere yet"),
        },
        ("menus", []) => println!("{}", serde_json::to_string_pretty(&portal.registry().current_menus())?),
        ("routes", []) => {
            for route in portal.registry().routes() {
                println!("{:<24} {}", route.name, route.path);
            }
        }
        ("tabs", []) => {
            let current = portal.tabs().current_tab();
            for tab in portal.tabs().tabs() {
                let marker = if current.as_deref() == Some(tab.path.as_str()) { "*" } else { " " };
                println!("{marker} {} {}", tab.path, tab.title.as_deref().unwrap_or(&tab.name));
            }
        }
        ("history", []) => {
            for entry in portal.navigator().history() {
                println!("{entry}");
            }
        }
        ("admin", ["users"]) => {
            let page = app.admin().list_users(&UserQuery::default()).await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        ("admin", ["logs"]) => {
            let page = app.admin().list_logs(&LogQuery::default()).await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        ("admin", ["stats"]) => println!("{}", serde_json::to_string_pretty(&app.admin().log_stats().await?)?),
        ("help", _) => println!("{HELP}"),
        _ => bail!("unknown command '{command}'; try 'help'"),
    }
    Ok(())
}

fn report(outcome: &NavigationOutcome) {
    match outcome.route() {
        Some(route) => println!("-> {} ({})", route.location, route.name),
        None => println!("navigation blocked"),
    }
}
