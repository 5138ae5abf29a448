//! Terminal detection: colour support and the report wrap width.

use std::env;

use crossterm::tty::IsTty;

/// Narrowest and widest column counts report text is wrapped at.
const WRAP_BOUNDS: (usize, usize) = (40, 100);

/// Decides whether to colour output from the environment and TTY status.
///
/// `NO_COLOR`, `CLICOLOR=0` and `TERM=dumb` switch colour off, in that order
/// of precedence over `CLICOLOR_FORCE`, which switches it on for pipes.
fn color_enabled(var: impl Fn(&str) -> Option<String>, tty: bool) -> bool {
    // https://no-color.org/: presence is enough, the value is ignored.
    if var("NO_COLOR").is_some() {
        return false;
    }
    if var("CLICOLOR").as_deref() == Some("0") || var("TERM").as_deref() == Some("dumb") {
        return false;
    }
    var("CLICOLOR_FORCE").is_some() || tty
}

/// Returns `true` if ANSI colour codes should be written to stdout.
pub fn supports_color() -> bool {
    color_enabled(|name| env::var(name).ok(), std::io::stdout().is_tty())
}

fn clamp_wrap(columns: Option<u16>) -> usize {
    let (min, max) = WRAP_BOUNDS;
    columns.map_or(max, |c| usize::from(c).clamp(min, max))
}

/// Width to wrap report text at.
///
/// Follows the terminal, but never narrower than 40 columns nor wider than
/// 100; when stdout is not a terminal the maximum is used.
pub fn wrap_width() -> usize {
    clamp_wrap(crossterm::terminal::size().ok().map(|(cols, _)| cols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn tty_decides_without_overrides() {
        assert!(color_enabled(env_of(&[]), true));
        assert!(!color_enabled(env_of(&[]), false));
    }

    #[test]
    fn no_color_wins_over_force() {
        let vars = env_of(&[("NO_COLOR", ""), ("CLICOLOR_FORCE", "1")]);
        assert!(!color_enabled(vars, true));
    }

    #[test]
    fn clicolor_zero_and_dumb_terminal_disable() {
        assert!(!color_enabled(env_of(&[("CLICOLOR", "0")]), true));
        assert!(!color_enabled(env_of(&[("TERM", "dumb")]), true));
        assert!(color_enabled(env_of(&[("CLICOLOR", "1")]), true));
    }

    #[test]
    fn force_colours_pipes() {
        assert!(color_enabled(env_of(&[("CLICOLOR_FORCE", "1")]), false));
    }

    #[test]
    fn wrap_width_is_clamped() {
        assert_eq!(clamp_wrap(None), 100);
        assert_eq!(clamp_wrap(Some(20)), 40);
        assert_eq!(clamp_wrap(Some(72)), 72);
        assert_eq!(clamp_wrap(Some(300)), 100);
        assert!((40..=100).contains(&wrap_width()));
    }
}
