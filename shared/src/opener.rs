// Link navigation through the desktop's default handler

use crate::platform::LinkOpener;
use std::process::Command;

/// Opens link targets with the platform's URL handler
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl LinkOpener for SystemOpener {
    fn open(&self, target: &str) {
        if !is_navigable(target) {
            log::warn!("refusing to open link target {target:?}");
            return;
        }
        log::info!("opening {target}");
        if let Err(e) = spawn_handler(target) {
            log::warn!("failed to open {target}: {e}");
        }
    }
}

/// Only hand well-formed URLs to the shell
pub fn is_navigable(target: &str) -> bool {
    let Some((scheme, rest)) = target.split_once(':') else {
        return false;
    };
    !rest.is_empty()
        && scheme.len() > 1
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !target
            .chars()
            .any(|c| c.is_control() || c.is_whitespace() || c == '"')
}

fn spawn_handler(target: &str) -> std::io::Result<()> {
    handler_command(target).spawn().map(drop)
}

// The target is always a single argument and never reaches a shell, so
// `&` and friends in query strings stay part of the URL.
#[cfg(target_os = "windows")]
fn handler_command(target: &str) -> Command {
    let mut cmd = Command::new("rundll32");
    cmd.args(["url.dll,FileProtocolHandler", target]);
    cmd
}

#[cfg(target_os = "macos")]
fn handler_command(target: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(target);
    cmd
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn handler_command(target: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(target);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_navigable() {
        assert!(is_navigable("https://example.com/a?b=c"));
        assert!(is_navigable("mailto:someone@example.com"));
        assert!(is_navigable("file:///C:/maps/map.html"));
    }

    #[test]
    fn bare_words_and_drive_paths_are_not() {
        assert!(!is_navigable("x"));
        assert!(!is_navigable("C:\\Windows"));
        assert!(!is_navigable("https:"));
        assert!(!is_navigable("http://a\nb"));
        assert!(!is_navigable("https://a b"));
        assert!(!is_navigable("https://a\"b"));
    }

    #[test]
    fn query_separators_stay_inside_one_argument() {
        let target = "https://example.com/?a=1&calc|x^y";
        assert!(is_navigable(target));

        let cmd = handler_command(target);
        assert_ne!(cmd.get_program(), "cmd");
        let last = cmd.get_args().last().map(|a| a.to_os_string());
        assert_eq!(last, Some(target.into()));
    }
}
