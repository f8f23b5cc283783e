use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    ColorChoice, Command,
};

pub mod auth;
pub mod logging;
pub mod server;

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("ensaluti")
        .about("Multi-method login, registration and contact verification")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles);

    let command = logging::with_args(command);
    let command = server::with_args(command);
    auth::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_env() -> Vec<(&'static str, Option<&'static str>)> {
        vec![
            ("ENSALUTI_PORT", None),
            ("ENSALUTI_AUTH_METHODS", None),
            ("ENSALUTI_VERIFICATION_TOKEN_TTL_DAYS", None),
            ("ENSALUTI_REGISTER_USERNAME_REQUIRED", None),
            ("ENSALUTI_REGISTER_EMAIL_REQUIRED", None),
        ]
    }

    #[test]
    fn defaults_parse_with_required_args() {
        temp_env::with_vars(clean_env(), || {
            let matches = new().get_matches_from(vec![
                "ensaluti",
                "--dsn",
                "postgres://user@localhost:5432/ensaluti",
                "--token-secret",
                "sekret",
            ]);

            assert_eq!(matches.get_one::<u16>("port"), Some(&8080));
            assert_eq!(
                matches.get_one::<String>("auth-methods").map(String::as_str),
                Some("phone,email,username")
            );
            assert_eq!(
                matches.get_one::<i64>("verification-token-ttl-days"),
                Some(&3)
            );
            assert_eq!(
                matches.get_one::<bool>("register-username-required"),
                Some(&true)
            );
        });
    }

    #[test]
    fn register_flags_accept_false() {
        temp_env::with_vars(clean_env(), || {
            let matches = new().get_matches_from(vec![
                "ensaluti",
                "--dsn",
                "postgres://user@localhost:5432/ensaluti",
                "--token-secret",
                "sekret",
                "--register-email-required",
                "false",
            ]);
            assert_eq!(
                matches.get_one::<bool>("register-email-required"),
                Some(&false)
            );
        });
    }
}
