use std::sync::Arc;

use clap::{Arg, ArgMatches, Command};
use senate_core::{
    Chronicle, Elder, GatewayConfig, JsonFileStorage, Mission, MockReasoner, Reasoner, RoutedReasoner, Senate,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn cli() -> Command {
    Command::new("senate")
        .version(VERSION)
        .about("Operator CLI for the governed code-generation gateway")
        .subcommand(
            Command::new("mission")
                .about("Submit a mission for deliberation")
                .arg(Arg::new("text").required(true).help("The mission text")),
        )
        .subcommand(
            Command::new("appeal")
                .about("Appeal a refused or overridden case")
                .arg(Arg::new("case-id").required(true))
                .arg(Arg::new("reason").required(true).help("Why the appellant believes the ruling should change")),
        )
        .subcommand(
            Command::new("martial-law")
                .about("Invoke Article 50: bypass deliberation entirely (KEEPER liability)")
                .arg(Arg::new("text").required(true)),
        )
        .subcommand(
            Command::new("chronicle")
                .about("Query the case-law store")
                .subcommand(Command::new("search").arg(Arg::new("query").required(true)))
                .subcommand(Command::new("get").arg(Arg::new("case-id").required(true)))
                .subcommand(Command::new("appeals").arg(Arg::new("case-id").required(true))),
        )
}

async fn build_elder() -> anyhow::Result<Elder> {
    let config = GatewayConfig::load()?;
    let storage = Arc::new(JsonFileStorage::new(&config.chronicle_data_dir));
    let chronicle = Arc::new(Chronicle::open(storage).await?);

    let reasoner: Arc<dyn Reasoner> = if config.reasoner.cloud_url.is_some() || config.reasoner.sovereign_url.is_some()
    {
        Arc::new(RoutedReasoner::new(config.reasoner))
    } else {
        Arc::new(MockReasoner)
    };
    let senate = Senate::new(reasoner);
    Ok(Elder::new(chronicle, senate).await?)
}

async fn run(matches: ArgMatches) -> anyhow::Result<()> {
    let elder = build_elder().await?;

    match matches.subcommand() {
        Some(("mission", sub)) => {
            let text = sub.get_one::<String>("text").expect("required");
            let outcome = elder.run_mission(Mission::new(text.clone()), false).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Some(("appeal", sub)) => {
            let case_id = sub.get_one::<String>("case-id").expect("required");
            let reason = sub.get_one::<String>("reason").expect("required");
            let outcome = elder
                .process_appeal(case_id, serde_json::json!({}), serde_json::json!({}), reason)
                .await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Some(("martial-law", sub)) => {
            let text = sub.get_one::<String>("text").expect("required");
            let outcome = elder.invoke_article_50(Mission::new(text.clone())).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Some(("chronicle", sub)) => match sub.subcommand() {
            Some(("search", s)) => {
                let query = s.get_one::<String>("query").expect("required");
                let results = elder.chronicle().retrieve_precedent(query).await;
                println!("{}", serde_json::to_string_pretty(&results)?);
            }
            Some(("get", s)) => {
                let case_id = s.get_one::<String>("case-id").expect("required");
                match elder.chronicle().get_case_by_id(case_id).await {
                    Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                    None => eprintln!("case not found: {case_id}"),
                }
            }
            Some(("appeals", s)) => {
                let case_id = s.get_one::<String>("case-id").expect("required");
                let appeals = elder.chronicle().get_appeals_for_case(case_id).await;
                println!("{}", serde_json::to_string_pretty(&appeals)?);
            }
            _ => eprintln!("unknown chronicle subcommand; see --help"),
        },
        _ => eprintln!("no subcommand given; see --help"),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    senate_core::logging::init_tracing();
    let matches = cli().get_matches();
    run(matches).await
}
