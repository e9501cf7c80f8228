use roster_core::query::{highest_salary, search_by_name, top_earner_names};
use roster_core::{RecordInput, RecordRepository, RosterConfig, RosterError};
use serde::Serialize;

use super::args::{Cli, Command, GlobalArgs};
use crate::exit_codes::SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let config = resolve_config(RosterConfig::from_env(), &cli.global);
    tracing::debug!(
        api_url = %config.api_url,
        cache = %config.cache_addr(),
        "resolved configuration"
    );

    let repository = match RecordRepository::from_config(&config) {
        Ok(repository) => repository,
        Err(e) => return Ok(report(&e)),
    };

    match run(&repository, cli.cmd).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(SUCCESS)
        }
        Err(e) => Ok(report(&e)),
    }
}

/// Apply command-line overrides on top of the environment.
pub fn resolve_config(mut config: RosterConfig, global: &GlobalArgs) -> RosterConfig {
    if let Some(url) = &global.api_url {
        config.api_url = url.clone();
    }
    if let Some(host) = &global.cache_host {
        config.cache_host = host.clone();
    }
    if let Some(port) = global.cache_port {
        config.cache_port = port;
    }
    config
}

async fn run(
    repository: &RecordRepository,
    cmd: Command,
) -> Result<serde_json::Value, RosterError> {
    match cmd {
        Command::List => to_json(repository.fetch_all().await?),
        Command::Get(args) => to_json(repository.fetch_by_id(&args.id).await?),
        Command::Create(args) => {
            let input = RecordInput {
                name: args.name,
                salary: args.salary,
                age: args.age,
                title: args.title,
                email: args.email,
            };
            to_json(repository.create(&input).await?)
        }
        Command::Delete(args) => to_json(repository.delete_by_id(&args.id).await?),
        Command::Search(args) => {
            let records = repository.fetch_all().await?;
            to_json(search_by_name(&records, &args.fragment))
        }
        Command::HighestSalary => to_json(highest_salary(&repository.fetch_all().await?)),
        Command::TopEarners(args) => {
            to_json(top_earner_names(&repository.fetch_all().await?, args.limit))
        }
    }
}

fn to_json<T: Serialize>(value: T) -> Result<serde_json::Value, RosterError> {
    serde_json::to_value(value).map_err(|e| RosterError::InvalidResponse {
        message: format!("failed to encode output: {}", e),
    })
}

fn report(e: &RosterError) -> i32 {
    eprintln!("error: {}", e);
    e.exit_code()
}
