//! Petition tracker CLI.
//!
//! # Responsibility
//! - Operate a local petition store from the shell.
//! - Print JSON bodies exactly as the API surface returns them.

mod cli;

use clap::Parser;
use cli::{Cli, Commands, PrincipalArgs};
use log::warn;
use petition_core::db::open_db;
use petition_core::{
    diff_words_with_limits, init_logging_from_config, render_inline, ApiResponse, CoreConfig,
    PetitionApi, Principal, Role, StaticAuthProvider,
};
use serde_json::json;
use std::process::ExitCode;
use uuid::Uuid;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match CoreConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::from(2);
            }
        },
        None => CoreConfig::default(),
    };
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    if let Err(err) = init_logging_from_config(&config.logging) {
        eprintln!("warning: logging disabled: {err}");
    }

    match run(cli.command, &config) {
        Ok(code) => code,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, config: &CoreConfig) -> Result<ExitCode, String> {
    match command {
        Commands::Init => {
            let conn = open_db(&config.database_path).map_err(|err| err.to_string())?;
            let version: u32 = conn
                .query_row("PRAGMA user_version;", [], |row| row.get(0))
                .map_err(|err| err.to_string())?;
            println!(
                "{}",
                json!({
                    "database": config.database_path.display().to_string(),
                    "schemaVersion": version,
                    "coreVersion": petition_core::core_version(),
                })
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Diff {
            before,
            after,
            inline,
        } => {
            let segments = diff_words_with_limits(&before, &after, config.diff)
                .map_err(|err| err.to_string())?;
            if inline {
                println!("{}", render_inline(&segments));
            } else {
                let body = serde_json::to_string_pretty(&segments).map_err(|err| err.to_string())?;
                println!("{body}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Assign {
            petition,
            committee,
            principal,
        } => with_api(config, &principal, |api| {
            api.assign(&petition, &json!({ "committeeId": committee }))
        }),
        Commands::Route {
            petition,
            principal,
        } => with_api(config, &principal, |api| api.route_petition(&petition)),
        Commands::SetAssignmentStatus {
            assignment,
            status,
            principal,
        } => with_api(config, &principal, |api| {
            api.update_assignment(&assignment, &json!({ "status": status }))
        }),
        Commands::Version {
            petition,
            version_id,
            compare_with,
        } => {
            let anonymous = PrincipalArgs {
                user: None,
                role: Role::Public.as_str().to_string(),
            };
            with_api(config, &anonymous, |api| {
                api.get_version(&petition, &version_id, compare_with.as_deref())
            })
        }
    }
}

fn with_api<F>(config: &CoreConfig, principal: &PrincipalArgs, call: F) -> Result<ExitCode, String>
where
    F: FnOnce(&PetitionApi<'_, StaticAuthProvider>) -> ApiResponse,
{
    let auth = auth_provider(principal)?;
    let conn = open_db(&config.database_path).map_err(|err| err.to_string())?;
    let api = PetitionApi::with_limits(&conn, auth, config.diff);
    let response = call(&api);

    let body = serde_json::to_string_pretty(&response.body).map_err(|err| err.to_string())?;
    println!("{body}");
    if response.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(
            "event=cli_request module=cli status=error http_status={}",
            response.status
        );
        Ok(ExitCode::FAILURE)
    }
}

fn auth_provider(args: &PrincipalArgs) -> Result<StaticAuthProvider, String> {
    let Some(user) = args.user.as_deref() else {
        return Ok(StaticAuthProvider::anonymous());
    };
    let id = Uuid::parse_str(user.trim()).map_err(|_| format!("--user is not a valid id: `{user}`"))?;
    let role = Role::parse(&args.role).ok_or_else(|| format!("unknown role `{}`", args.role))?;
    Ok(StaticAuthProvider::authenticated(Principal::new(id, role)))
}
