use crate::{AppError, AppResult};

use std::panic::Location;

use error_location::ErrorLocation;
use sofya_overlay_core::{Gesture, PageId};

/// Console usage, printed by `help`.
pub(crate) const HELP: &str = "\
Pages:
  open <url>             open a page and focus it
  close <page>           close a page
  focus <page>           make a page active
  pages                  list pages and overlay states
Session:
  login <email>          log in and notify every page
  logout                 log out and notify every page
  whoami                 show the current user
Overlay:
  show                   show the overlay in the active page
  click <page>           tap the collapsed control
  outside <page>         click outside the overlay
  start <page>           start recording
  pause <page>           pause or resume recording
  end <page>             end recording
Recognition:
  hear <page> <text>     interim text
  say <page> <text>      final text
  fail <page> <reason>   engine error
Other:
  help                   show this help
  quit                   exit";

/// Commands entered on the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Open a page at the given address.
    Open {
        /// Page address.
        url: String,
    },
    /// Close a page.
    Close {
        /// Page to close.
        page: PageId,
    },
    /// Make a page the active one.
    Focus {
        /// Page to focus.
        page: PageId,
    },
    /// List open pages.
    Pages,
    /// Log in.
    Login {
        /// Identity to log in with.
        email: String,
    },
    /// Log out.
    Logout,
    /// Show the current user.
    WhoAmI,
    /// Show the overlay in the active page.
    Show,
    /// A user gesture on a page's overlay.
    Gesture {
        /// Target page.
        page: PageId,
        /// The gesture.
        gesture: Gesture,
    },
    /// Interim recognition output for a page.
    Hear {
        /// Target page.
        page: PageId,
        /// Provisional text.
        text: String,
    },
    /// Final recognition output for a page.
    Say {
        /// Target page.
        page: PageId,
        /// Final text.
        text: String,
    },
    /// Recognition engine failure for a page.
    Fail {
        /// Target page.
        page: PageId,
        /// Failure reason.
        reason: String,
    },
    /// Print usage.
    Help,
    /// Request application shutdown.
    Quit,
}

impl AppCommand {
    /// Parse one console line. Blank lines yield `None`.
    #[track_caller]
    pub fn parse(line: &str) -> AppResult<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map(|(verb, rest)| (verb, rest.trim()))
            .unwrap_or((line, ""));

        let command = match verb.to_ascii_lowercase().as_str() {
            "open" => AppCommand::Open {
                url: required(rest, "open <url>")?.to_string(),
            },
            "close" => AppCommand::Close {
                page: page_id(rest)?,
            },
            "focus" => AppCommand::Focus {
                page: page_id(rest)?,
            },
            "pages" => AppCommand::Pages,
            "login" => AppCommand::Login {
                email: required(rest, "login <email>")?.to_string(),
            },
            "logout" => AppCommand::Logout,
            "whoami" => AppCommand::WhoAmI,
            "show" => AppCommand::Show,
            "click" => gesture(rest, Gesture::Activate)?,
            "outside" => gesture(rest, Gesture::OutsideClick)?,
            "start" => gesture(rest, Gesture::Start)?,
            "pause" => gesture(rest, Gesture::TogglePause)?,
            "end" => gesture(rest, Gesture::End)?,
            "hear" => {
                let (page, text) = page_and_text(rest, "hear <page> <text>")?;
                AppCommand::Hear { page, text }
            }
            "say" => {
                let (page, text) = page_and_text(rest, "say <page> <text>")?;
                AppCommand::Say { page, text }
            }
            "fail" => {
                let (page, reason) = page_and_text(rest, "fail <page> <reason>")?;
                AppCommand::Fail { page, reason }
            }
            "help" | "?" => AppCommand::Help,
            "quit" | "exit" => AppCommand::Quit,
            other => {
                return Err(AppError::InvalidCommand {
                    reason: format!("unknown command {:?}, try `help`", other),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        Ok(Some(command))
    }
}

#[track_caller]
fn required<'a>(rest: &'a str, usage: &str) -> AppResult<&'a str> {
    if rest.is_empty() {
        return Err(AppError::InvalidCommand {
            reason: format!("usage: {}", usage),
            location: ErrorLocation::from(Location::caller()),
        });
    }
    Ok(rest)
}

#[track_caller]
fn page_id(arg: &str) -> AppResult<PageId> {
    arg.parse::<u64>()
        .map(PageId)
        .map_err(|_| AppError::InvalidCommand {
            reason: format!("expected a page number, got {:?}", arg),
            location: ErrorLocation::from(Location::caller()),
        })
}

#[track_caller]
fn gesture(rest: &str, gesture: Gesture) -> AppResult<AppCommand> {
    Ok(AppCommand::Gesture {
        page: page_id(rest)?,
        gesture,
    })
}

#[track_caller]
fn page_and_text(rest: &str, usage: &str) -> AppResult<(PageId, String)> {
    let Some((page, text)) = rest.split_once(char::is_whitespace) else {
        return Err(AppError::InvalidCommand {
            reason: format!("usage: {}", usage),
            location: ErrorLocation::from(Location::caller()),
        });
    };
    Ok((page_id(page)?, required(text.trim(), usage)?.to_string()))
}
