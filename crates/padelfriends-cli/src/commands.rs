//! Command parsing and the handlers that drive the session.

use anyhow::{bail, Context, Result};

use padelfriends_core::session::{
    GuardState, Navigation, RestorationGuard, Route, SessionContext, SessionState,
};

pub const USAGE: &str = "\
Usage: padelfriends <command>

Commands:
  join <name>       Join a group, asking for its password if none is saved
  open <path>       Navigate to an app path such as /group/<name>
  groups            List saved groups, most recent first
  players           Show players of the current group
  matches [page]    Show a page of matches of the current group
  stats             Show player statistics of the current group
  leave             Leave the current group and forget its password
  help              Show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Join(String),
    Open(String),
    Groups,
    Players,
    Matches(u32),
    Stats,
    Leave,
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some(name) = args.first() else {
            return Ok(Command::Help);
        };
        let rest = &args[1..];

        let command = match name.as_str() {
            "join" => {
                let group = rest.join(" ");
                if group.trim().is_empty() {
                    bail!("join requires a group name");
                }
                Command::Join(group.trim().to_string())
            }
            "open" => match rest {
                [path] => Command::Open(path.clone()),
                _ => bail!("open requires exactly one path"),
            },
            "groups" => Command::Groups,
            "players" => Command::Players,
            "matches" => match rest {
                [] => Command::Matches(1),
                [page] => {
                    let page: u32 = page
                        .parse()
                        .with_context(|| format!("Invalid page number: {}", page))?;
                    if page == 0 {
                        bail!("Pages start at 1");
                    }
                    Command::Matches(page)
                }
                _ => bail!("matches takes at most one page number"),
            },
            "stats" => Command::Stats,
            "leave" => Command::Leave,
            "help" | "-h" | "--help" => Command::Help,
            other => bail!("Unknown command: {}", other),
        };
        Ok(command)
    }
}

pub async fn run(command: Command, session: &SessionContext) -> Result<()> {
    match command {
        Command::Join(name) => join(session, &name).await,
        Command::Open(path) => open(session, &path).await,
        Command::Groups => {
            list_groups(session);
            Ok(())
        }
        Command::Players => {
            restore(session).await?;
            session.load_players().await;
            let state = check_error(session.state())?;
            for player in state.players.iter() {
                println!("{}", player.name);
            }
            Ok(())
        }
        Command::Matches(page) => {
            restore(session).await?;
            session.load_matches_page(page).await;
            print_matches(&check_error(session.state())?);
            Ok(())
        }
        Command::Stats => {
            restore(session).await?;
            session.load_statistics().await;
            print_statistics(&check_error(session.state())?);
            Ok(())
        }
        Command::Leave => {
            restore(session).await?;
            let name = session.state().group_name().unwrap_or_default().to_string();
            session.clear_group();
            println!("Left {}", name);
            Ok(())
        }
        Command::Help => {
            println!("{}", USAGE);
            Ok(())
        }
    }
}

async fn join(session: &SessionContext, name: &str) -> Result<()> {
    if !session.load_group(name).await {
        let error = session
            .state()
            .error
            .unwrap_or_else(|| format!("Could not load group {}", name));
        bail!(error);
    }

    if !session.state().is_authenticated {
        let password = rpassword::prompt_password(format!("Password for {}: ", name))
            .context("Failed to read password")?;
        if !session.authenticate(&password).await {
            match session.state().error {
                Some(error) => bail!(error),
                None => bail!("Incorrect password for {}", name),
            }
        }
    }

    println!("Joined {}", name);
    Ok(())
}

async fn open(session: &SessionContext, path: &str) -> Result<()> {
    let guard = RestorationGuard::new(session.clone());
    let route = Route::parse(path);

    match guard.check(&route).await {
        Navigation::Proceed => {
            println!("{}", route.path());
            if guard.state() == GuardState::Resolved {
                let state = session.state();
                let access = if state.is_authenticated {
                    "authenticated"
                } else {
                    "password required"
                };
                println!("  group: {} ({})", state.group_name().unwrap_or_default(), access);
            }
        }
        Navigation::Redirect(to) => {
            println!("{} (redirected from {})", to.path(), route.path());
        }
    }
    Ok(())
}

fn list_groups(session: &SessionContext) {
    let saved = session.saved_groups();
    if saved.is_empty() {
        println!("No saved groups");
        return;
    }
    for entry in saved {
        println!(
            "{:<30} last used {}",
            entry.name,
            entry.last_accessed_at.format("%Y-%m-%d %H:%M")
        );
    }
}

/// Restore the most recent saved group or explain how to get one.
async fn restore(session: &SessionContext) -> Result<()> {
    if session.restore_from_storage().await {
        return Ok(());
    }
    bail!("No saved group could be restored. Join one first with `padelfriends join <name>`.")
}

fn check_error(state: SessionState) -> Result<SessionState> {
    match state.error {
        Some(error) => bail!(error),
        None => Ok(state),
    }
}

fn print_matches(state: &SessionState) {
    for m in state.matches.iter() {
        println!("{:<12} {:<9} {}", m.id, m.score_display(), m.players.join(", "));
    }
    if let Some(page) = state.match_page {
        println!("Page {} of {} ({} matches)", page.page, page.total_pages.max(1), page.total);
    }
}

fn print_statistics(state: &SessionState) {
    let Some(stats) = state.statistics.as_ref() else {
        println!("No statistics yet");
        return;
    };
    for s in stats.iter() {
        println!(
            "{:<24} played {:>3}  won {:>3}  lost {:>3}  {:>5}",
            s.player_name,
            s.total_games,
            s.games_won,
            s.games_lost,
            s.win_rate_display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_no_args_is_help() {
        assert_eq!(Command::parse(&[]).unwrap(), Command::Help);
    }

    #[test]
    fn test_parse_join_joins_words() {
        assert_eq!(
            Command::parse(&args(&["join", "Sunday", "Padel"])).unwrap(),
            Command::Join("Sunday Padel".to_string())
        );
        assert!(Command::parse(&args(&["join"])).is_err());
    }

    #[test]
    fn test_parse_matches_page() {
        assert_eq!(Command::parse(&args(&["matches"])).unwrap(), Command::Matches(1));
        assert_eq!(Command::parse(&args(&["matches", "3"])).unwrap(), Command::Matches(3));
        assert!(Command::parse(&args(&["matches", "0"])).is_err());
        assert!(Command::parse(&args(&["matches", "x"])).is_err());
    }

    #[test]
    fn test_parse_open_and_unknown() {
        assert_eq!(
            Command::parse(&args(&["open", "/group/Sunday Padel"])).unwrap(),
            Command::Open("/group/Sunday Padel".to_string())
        );
        assert!(Command::parse(&args(&["open"])).is_err());
        assert!(Command::parse(&args(&["dance"])).is_err());
    }
}
