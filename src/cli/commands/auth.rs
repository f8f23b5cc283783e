use clap::{Arg, ArgAction, Command};

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_method_args(command);
    let command = with_register_args(command);
    let command = with_redirect_args(command);
    with_outbox_args(command)
}

fn with_method_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("auth-methods")
                .long("auth-methods")
                .help("Login namespaces tried in priority order (comma-separated: phone,email,username)")
                .env("ENSALUTI_AUTH_METHODS")
                .default_value("phone,email,username"),
        )
        .arg(
            Arg::new("token-secret")
                .long("token-secret")
                .help("Secret key for verification and reset tokens")
                .env("ENSALUTI_TOKEN_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Frontend base URL used for verification and reset links")
                .env("ENSALUTI_FRONTEND_BASE_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new("verification-token-ttl-days")
                .long("verification-token-ttl-days")
                .help("Verification/reset token validity window in days")
                .env("ENSALUTI_VERIFICATION_TOKEN_TTL_DAYS")
                .default_value("3")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_register_args(command: Command) -> Command {
    let flags = [
        (
            "register-username-required",
            "ENSALUTI_REGISTER_USERNAME_REQUIRED",
            "Require a username at registration",
        ),
        (
            "register-email-required",
            "ENSALUTI_REGISTER_EMAIL_REQUIRED",
            "Require an email address at registration",
        ),
        (
            "register-first-name-required",
            "ENSALUTI_REGISTER_FIRST_NAME_REQUIRED",
            "Require a first name at registration",
        ),
        (
            "register-last-name-required",
            "ENSALUTI_REGISTER_LAST_NAME_REQUIRED",
            "Require a last name at registration",
        ),
        (
            "register-confirm-password-required",
            "ENSALUTI_REGISTER_CONFIRM_PASSWORD_REQUIRED",
            "Require a matching confirm_password at registration",
        ),
    ];

    flags.into_iter().fold(command, |command, (name, env, help)| {
        command.arg(
            Arg::new(name)
                .long(name)
                .help(help)
                .env(env)
                .default_value("true")
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(bool)),
        )
    })
}

fn with_redirect_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("login-redirect-url")
                .long("login-redirect-url")
                .help("Where clients are sent after a successful login")
                .env("ENSALUTI_LOGIN_REDIRECT_URL")
                .default_value("/accounts/profile/"),
        )
        .arg(
            Arg::new("logout-redirect-url")
                .long("logout-redirect-url")
                .help("Where clients are sent after logout")
                .env("ENSALUTI_LOGOUT_REDIRECT_URL")
                .default_value("/"),
        )
}

fn with_outbox_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("outbox-poll-seconds")
                .long("outbox-poll-seconds")
                .help("Delivery outbox poll interval in seconds")
                .env("ENSALUTI_OUTBOX_POLL_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("outbox-batch-size")
                .long("outbox-batch-size")
                .help("Delivery outbox batch size per poll")
                .env("ENSALUTI_OUTBOX_BATCH_SIZE")
                .default_value("10")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("outbox-max-attempts")
                .long("outbox-max-attempts")
                .help("Max attempts before marking a delivery as failed")
                .env("ENSALUTI_OUTBOX_MAX_ATTEMPTS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("outbox-backoff-base-seconds")
                .long("outbox-backoff-base-seconds")
                .help("Base delay for delivery retry backoff")
                .env("ENSALUTI_OUTBOX_BACKOFF_BASE_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("outbox-backoff-max-seconds")
                .long("outbox-backoff-max-seconds")
                .help("Max delay for delivery retry backoff")
                .env("ENSALUTI_OUTBOX_BACKOFF_MAX_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64)),
        )
}
