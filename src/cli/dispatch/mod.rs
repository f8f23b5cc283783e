//! Command-line argument dispatch and server initialization.
//!
//! This module maps validated CLI arguments to the appropriate action. The
//! authentication settings are constructed here, so configuration errors —
//! an empty or unknown method list in particular — abort startup instead of
//! surfacing during a login attempt.

use crate::account::resolver::LoginMethod;
use crate::account::settings::AuthSettings;
use crate::api::delivery::DeliveryWorkerConfig;
use crate::cli::actions::{server::Args, Action};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or the authentication
/// settings are invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let settings = build_settings(matches)?;
    let worker = build_worker_config(matches);

    Ok(Action::Server(Args {
        port,
        dsn,
        settings,
        worker,
    }))
}

fn build_settings(matches: &clap::ArgMatches) -> Result<AuthSettings> {
    let methods_raw = matches
        .get_one::<String>("auth-methods")
        .cloned()
        .unwrap_or_else(|| "phone,email,username".to_string());
    let methods =
        LoginMethod::parse_list(&methods_raw).context("invalid --auth-methods configuration")?;

    let token_secret = matches
        .get_one::<String>("token-secret")
        .cloned()
        .context("missing required argument: --token-secret")?;

    let flag = |name: &str| matches.get_one::<bool>(name).copied().unwrap_or(true);
    let string = |name: &str, default: &str| {
        matches
            .get_one::<String>(name)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    };

    let settings = AuthSettings::new(methods, SecretString::from(token_secret))
        .context("invalid authentication settings")?
        .with_register_username_required(flag("register-username-required"))
        .with_register_email_required(flag("register-email-required"))
        .with_register_first_name_required(flag("register-first-name-required"))
        .with_register_last_name_required(flag("register-last-name-required"))
        .with_register_confirm_password_required(flag("register-confirm-password-required"))
        .with_login_redirect_url(string("login-redirect-url", "/accounts/profile/"))
        .with_logout_redirect_url(string("logout-redirect-url", "/"))
        .with_verification_token_ttl_days(
            matches
                .get_one::<i64>("verification-token-ttl-days")
                .copied()
                .unwrap_or(3),
        )
        .with_frontend_base_url(string("frontend-base-url", "http://localhost:3000"));

    Ok(settings)
}

fn build_worker_config(matches: &clap::ArgMatches) -> DeliveryWorkerConfig {
    let u64_arg = |name: &str, default: u64| {
        matches.get_one::<u64>(name).copied().unwrap_or(default)
    };

    DeliveryWorkerConfig::new()
        .with_poll_interval_seconds(u64_arg("outbox-poll-seconds", 5))
        .with_batch_size(
            matches
                .get_one::<usize>("outbox-batch-size")
                .copied()
                .unwrap_or(10),
        )
        .with_max_attempts(
            matches
                .get_one::<u32>("outbox-max-attempts")
                .copied()
                .unwrap_or(5),
        )
        .with_backoff_base_seconds(u64_arg("outbox-backoff-base-seconds", 5))
        .with_backoff_max_seconds(u64_arg("outbox-backoff-max-seconds", 300))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    fn base_env() -> Vec<(&'static str, Option<&'static str>)> {
        vec![
            ("ENSALUTI_DSN", Some("postgres://user@localhost:5432/ensaluti")),
            ("ENSALUTI_TOKEN_SECRET", Some("sekret")),
            ("ENSALUTI_AUTH_METHODS", None),
            ("ENSALUTI_PORT", None),
        ]
    }

    #[test]
    fn dispatches_server_action_with_defaults() {
        temp_env::with_vars(base_env(), || {
            let matches = commands::new().get_matches_from(vec!["ensaluti"]);
            let action = handler(&matches).expect("dispatch succeeds");
            let Action::Server(args) = action;
            assert_eq!(args.port, 8080);
            assert_eq!(
                args.settings.methods(),
                &[
                    LoginMethod::Phone,
                    LoginMethod::Email,
                    LoginMethod::Username
                ]
            );
        });
    }

    #[test]
    fn empty_auth_methods_fails_at_startup() {
        let mut env = base_env();
        env.retain(|(name, _)| *name != "ENSALUTI_AUTH_METHODS");
        env.push(("ENSALUTI_AUTH_METHODS", Some(" , ")));

        temp_env::with_vars(env, || {
            let matches = commands::new().get_matches_from(vec!["ensaluti"]);
            let result = handler(&matches);
            assert!(result.is_err());
            if let Err(err) = result {
                assert!(err
                    .to_string()
                    .contains("invalid --auth-methods configuration"));
            }
        });
    }

    #[test]
    fn unknown_auth_method_fails_at_startup() {
        temp_env::with_vars(base_env(), || {
            let matches = commands::new().get_matches_from(vec![
                "ensaluti",
                "--auth-methods",
                "phone,carrier-pigeon",
            ]);
            assert!(handler(&matches).is_err());
        });
    }

    #[test]
    fn method_priority_order_is_kept() {
        temp_env::with_vars(base_env(), || {
            let matches = commands::new().get_matches_from(vec![
                "ensaluti",
                "--auth-methods",
                "username,phone",
            ]);
            let Action::Server(args) = handler(&matches).expect("dispatch succeeds");
            assert_eq!(
                args.settings.methods(),
                &[LoginMethod::Username, LoginMethod::Phone]
            );
        });
    }
}
