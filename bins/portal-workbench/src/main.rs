mod gateway;
mod transcript;
mod workspace;

use anyhow::Result;
use clap::Parser;
use portal_common::config::PortalConfig;
use portal_common::types::ChallengeSummary;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing::{error, info};

use gateway::PortalApi;
use workspace::{Dispatch, Outcome, Workspace, WorkspaceState};

#[derive(Parser)]
#[command(name = "portal-workbench")]
#[command(about = "Terminal workbench for the portal's programming challenges", long_about = None)]
struct Cli {
    /// Base URL of the portal API (overrides PORTAL_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Per-request deadline in milliseconds (overrides PORTAL_REQUEST_TIMEOUT_MS)
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = PortalConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }

    info!("Portal workbench booting...");
    info!("API: {}", config.api_url);
    info!("Request deadline: {}ms", config.request_timeout_ms);

    let api = Arc::new(PortalApi::new(&config)?);
    run_loop(api).await
}

async fn run_loop(api: Arc<PortalApi>) -> Result<()> {
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<Outcome>();
    let mut workspace = Workspace::new();
    let mut catalog = fetch_catalog(&api).await;
    print_catalog(&catalog);
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break; // EOF
                };
                let keep_going = handle_command(
                    line.trim(),
                    &mut workspace,
                    &api,
                    &mut catalog,
                    &outcome_tx,
                    &mut lines,
                )
                .await?;
                if !keep_going {
                    break;
                }
            }
            Some(outcome) = outcome_rx.recv() => {
                let is_history = matches!(outcome, Outcome::History { .. });
                let is_fresh = outcome.epoch() == workspace.epoch();
                if let Some(dispatch) = workspace.apply(outcome) {
                    spawn_dispatch(&api, &outcome_tx, dispatch);
                }
                if is_fresh {
                    render_settled(&workspace, is_history);
                }
            }
        }
    }

    info!("Workbench shutdown complete");
    Ok(())
}

/// Every catalog fetch re-reads the server. A failure degrades to an
/// empty list plus a banner; it never terminates the workbench.
async fn fetch_catalog(api: &PortalApi) -> Vec<ChallengeSummary> {
    match api.list_challenges().await {
        Ok(challenges) => challenges,
        Err(e) => {
            error!(error = %e, "Catalog fetch failed");
            println!("Erro ao carregar desafios");
            Vec::new()
        }
    }
}

async fn handle_command(
    line: &str,
    workspace: &mut Workspace,
    api: &Arc<PortalApi>,
    catalog: &mut Vec<ChallengeSummary>,
    outcome_tx: &mpsc::UnboundedSender<Outcome>,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<bool> {
    let (command, rest) = match line.split_once(' ') {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "list" => {
            if workspace.session().is_some() {
                println!("Use 'back' para voltar à lista de desafios.");
            } else {
                *catalog = fetch_catalog(api).await;
                print_catalog(catalog);
            }
        }
        "open" => {
            if workspace.session().is_some() {
                println!("Use 'back' antes de abrir outro desafio.");
            } else {
                open_challenge(rest, workspace, api, catalog, outcome_tx).await;
            }
        }
        "code" => {
            if workspace.session().is_none() {
                println!("Nenhum desafio selecionado.");
            } else {
                let code = read_code_block(lines).await?;
                if let Err(e) = workspace.set_code(code) {
                    println!("{}", e);
                }
            }
        }
        "run" => match workspace.start_run(rest) {
            Ok(dispatch) => {
                println!("Executando...");
                spawn_dispatch(api, outcome_tx, dispatch);
            }
            Err(e) => println!("{}", e),
        },
        "submit" => match workspace.start_submit() {
            Ok(dispatch) => {
                println!("Submetendo...");
                spawn_dispatch(api, outcome_tx, dispatch);
            }
            Err(e) => println!("{}", e),
        },
        "history" => match workspace.session() {
            None => println!("Nenhum desafio selecionado."),
            Some(session) => {
                if session.history_loading {
                    println!("Carregando histórico...");
                }
                print_history(session);
            }
        },
        "back" => {
            workspace.back();
            *catalog = fetch_catalog(api).await;
            print_catalog(catalog);
        }
        "quit" | "exit" => return Ok(false),
        _ => print_help(),
    }

    Ok(true)
}

async fn open_challenge(
    argument: &str,
    workspace: &mut Workspace,
    api: &Arc<PortalApi>,
    catalog: &[ChallengeSummary],
    outcome_tx: &mpsc::UnboundedSender<Outcome>,
) {
    let position: usize = match argument.parse() {
        Ok(position) => position,
        Err(_) => {
            println!("Uso: open <número do desafio>");
            return;
        }
    };

    let Some(summary) = position.checked_sub(1).and_then(|i| catalog.get(i)) else {
        println!("Desafio {} não está na lista.", position);
        return;
    };

    match api.get_challenge(summary.id).await {
        Ok(challenge) => {
            println!("{}", transcript::challenge_detail(&challenge));
            let dispatch = workspace.select_challenge(challenge);
            spawn_dispatch(api, outcome_tx, dispatch);
        }
        Err(e) => {
            error!(challenge_id = summary.id, error = %e, "Challenge detail fetch failed");
            println!("Erro ao carregar o desafio");
        }
    }
}

/// Multi-line code entry, terminated by a line holding a single '.'.
async fn read_code_block(lines: &mut Lines<BufReader<Stdin>>) -> Result<String> {
    println!("Digite seu código; finalize com uma linha contendo apenas '.'");
    let mut code = String::new();
    while let Some(line) = lines.next_line().await? {
        if line == "." {
            break;
        }
        code.push_str(&line);
        code.push('\n');
    }
    Ok(code)
}

/// Perform a dispatched gateway call off the interaction loop. The loop
/// stays responsive while the call is outstanding; the settled outcome
/// comes back through the channel tagged with its dispatch epoch.
fn spawn_dispatch(
    api: &Arc<PortalApi>,
    outcome_tx: &mpsc::UnboundedSender<Outcome>,
    dispatch: Dispatch,
) {
    let api = Arc::clone(api);
    let outcome_tx = outcome_tx.clone();

    tokio::spawn(async move {
        let outcome = match dispatch {
            Dispatch::Run { epoch, code, input } => Outcome::Run {
                epoch,
                output: api.execute_code(&code, &input).await,
            },
            Dispatch::Submit {
                epoch,
                challenge_id,
                code,
            } => Outcome::Submit {
                epoch,
                result: api.submit_solution(challenge_id, &code).await,
            },
            Dispatch::FetchHistory {
                epoch,
                challenge_id,
            } => Outcome::History {
                epoch,
                result: api.list_submissions(challenge_id).await,
            },
        };
        // Send only fails on shutdown, when nobody is left to render.
        let _ = outcome_tx.send(outcome);
    });
}

fn render_settled(workspace: &Workspace, is_history: bool) {
    let WorkspaceState::Viewing(session) = workspace.state() else {
        return;
    };

    if is_history {
        print_history(session);
    } else if let Some(output) = &session.last_output {
        println!("Resultado:\n{}", output);
    }
}

fn print_history(session: &workspace::Session) {
    if session.submissions.is_empty() {
        println!("Nenhuma submissão para este desafio.");
        return;
    }
    println!("Suas Submissões:");
    for (index, submission) in session.submissions.iter().enumerate() {
        println!("{}", transcript::history_row(index, submission));
    }
}

fn print_catalog(catalog: &[ChallengeSummary]) {
    if catalog.is_empty() {
        println!("Nenhum desafio disponível");
        return;
    }
    println!("Desafios Disponíveis:");
    for (index, challenge) in catalog.iter().enumerate() {
        println!("{}", transcript::catalog_row(index, challenge));
    }
}

fn print_help() {
    println!("Comandos:");
    println!("  list           recarrega a lista de desafios");
    println!("  open <n>       abre o desafio n da lista");
    println!("  code           edita o código (termine com '.')");
    println!("  run [entrada]  testa o código sem submeter");
    println!("  submit         submete a solução para avaliação");
    println!("  history        mostra suas submissões");
    println!("  back           volta para a lista de desafios");
    println!("  quit           encerra");
}
