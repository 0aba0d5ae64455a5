//! User creation module
//!
//! `useradd` arguments are built from a fixed table: each row maps one
//! field of [`UserSpec`] to the flag it produces when the field is set.

use crate::CloudInitError;
use crate::config::{UserSpec, non_empty};
use crate::system::System;
use tracing::{debug, info};

/// One row of the field to flag table
enum UserArg {
    /// Flag followed by a value, emitted when the field yields one
    Value(&'static str, fn(&UserSpec) -> Option<String>),
    /// Bare flag, emitted when the predicate holds
    Switch(&'static str, fn(&UserSpec) -> bool),
}

const USERADD_ARGS: &[UserArg] = &[
    UserArg::Value("--password", |u| non_empty(&u.password_hash).map(str::to_string)),
    UserArg::Value("--comment", |u| non_empty(&u.gecos).map(quote)),
    UserArg::Value("--home-dir", |u| Some(u.effective_homedir())),
    UserArg::Switch("--no-create-home", |u| u.no_create_home),
    UserArg::Switch("--create-home", |u| !u.no_create_home),
    UserArg::Value("--gid", |u| non_empty(&u.primary_group).map(str::to_string)),
    UserArg::Value("--groups", |u| {
        (!u.groups.is_empty()).then(|| u.groups.join(","))
    }),
    UserArg::Switch("--no-user-group", |u| u.no_user_group),
    UserArg::Switch("--system", |u| u.system),
    UserArg::Switch("--no-log-init", |u| u.no_log_init),
    UserArg::Value("--shell", |u| non_empty(&u.shell).map(str::to_string)),
];

/// Double-quote a value, escaping quotes, backslashes and control characters
fn quote(value: &str) -> String {
    format!("{value:?}")
}

/// Build the `useradd` argument list; the account name always comes last
pub fn useradd_args(user: &UserSpec) -> Vec<String> {
    let mut args = Vec::new();

    for row in USERADD_ARGS {
        match row {
            UserArg::Value(flag, value) => {
                if let Some(value) = value(user) {
                    args.push(flag.to_string());
                    args.push(value);
                }
            }
            UserArg::Switch(flag, enabled) => {
                if enabled(user) {
                    args.push(flag.to_string());
                }
            }
        }
    }

    args.push(user.name.clone());
    args
}

/// Create a single user account
pub async fn create_user(system: &dyn System, user: &UserSpec) -> Result<(), CloudInitError> {
    info!("Creating user: {}", user.name);

    let args = useradd_args(user);
    debug!("useradd takes {} arguments for {}", args.len(), user.name);

    system
        .add_user(&args)
        .await
        .map_err(|cause| CloudInitError::UserCreation {
            name: user.name.clone(),
            cause: Box::new(cause),
        })
}
