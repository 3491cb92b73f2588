mod display;
mod import;

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use kl8_db::cache::SqliteCache;
use kl8_db::db::{count_draws, db_path, fetch_all_draws, fetch_last_draws, migrate, open_db};
use kl8_db::models::Pool;
use kl8_db::rusqlite::Connection;
use kl8_quant::analysis::convergence::simulate_convergence;
use kl8_quant::analysis::tails::tail_features;
use kl8_quant::assessment::{
    AssessmentRequest, OfflineAssessor, RecordedAssessor, StrategyAssessor, assess_or_fallback,
};
use kl8_quant::config::{QuantConfig, load_config, save_config};
use kl8_quant::pipeline::{EtlOutput, compute_all_with_modulus, run_etl};
use kl8_quant::rng::date_seed;

use crate::display::{
    SpinnerSink, display_assessment, display_convergence_chart, display_draws, display_features,
    display_import_summary, display_prediction, display_tails,
};

#[derive(Parser)]
#[command(name = "kl8", about = "Analyse quantitative du KL8 (20 numéros sur 80)")]
struct Cli {
    /// Fichier de configuration JSON (défauts si absent)
    #[arg(short, long, global = true, default_value = "kl8.json")]
    config: PathBuf,

    /// Journalisation détaillée (-v : info, -vv : debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Construire l'historique de travail (sources, cache, génération)
    Sync,

    /// Importer des tirages réels depuis un fichier CSV (période;date;n1..n20)
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long)]
        file: PathBuf,

        /// Remplacer les tirages déjà importés
        #[arg(long)]
        replace: bool,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages de l'historique de travail
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: usize,

        /// Uniquement les tirages importés en base
        #[arg(long)]
        stored: bool,
    },

    /// Afficher les caractéristiques par numéro
    Features {
        /// Numéros ancres, deux au plus (séparés par des virgules)
        #[arg(short, long, value_delimiter = ',')]
        anchors: Vec<u8>,
    },

    /// Calculer les sélections et les résumés
    Predict {
        /// Numéros ancres, deux au plus (séparés par des virgules)
        #[arg(short, long, value_delimiter = ',')]
        anchors: Vec<u8>,

        /// Taille du classement affiché
        #[arg(short, long, default_value = "20")]
        top: usize,
    },

    /// Statistiques des chiffres de terminaison
    Tails,

    /// Trajectoire de convergence illustrative
    Convergence {
        /// Seed pour la reproductibilité (défaut: date du jour YYYYMMDD)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Évaluer une stratégie (réponse enregistrée ou mode hors ligne)
    Assess {
        /// Description de la stratégie
        strategy: String,

        /// Réponse JSON enregistrée du service d'évaluation
        #[arg(short, long)]
        response: Option<PathBuf>,
    },

    /// Afficher la configuration effective
    Config {
        /// Écrire la configuration effective dans le fichier --config
        #[arg(long)]
        write: bool,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn resolve_config(path: &Path) -> Result<QuantConfig> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::info!(path = %path.display(), "configuration absente, valeurs par défaut");
        Ok(QuantConfig::default())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = resolve_config(&cli.config)?;
    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Sync => cmd_sync(&conn, &config),
        Command::Import { file, replace } => cmd_import(&conn, &file, replace),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last, stored } => cmd_list(&conn, &config, last, stored),
        Command::Features { anchors } => cmd_features(&conn, &config, &anchors),
        Command::Predict { anchors, top } => cmd_predict(&conn, &config, &anchors, top),
        Command::Tails => cmd_tails(&conn, &config),
        Command::Convergence { seed } => cmd_convergence(&config, seed),
        Command::Assess { strategy, response } => {
            cmd_assess(&conn, &config, &strategy, response.as_deref())
        }
        Command::Config { write } => cmd_config(&config, &cli.config, write),
    }
}

/// Nombre maximal de numéros ancres.
const MAX_ANCHORS: usize = 2;

fn validate_anchors(anchors: &[u8], pool: Pool) -> Result<()> {
    if anchors.len() > MAX_ANCHORS {
        bail!("Au plus {} ancres, {} reçues", MAX_ANCHORS, anchors.len());
    }
    for (i, &n) in anchors.iter().enumerate() {
        if n < 1 || n > pool.size {
            bail!("Ancre {} hors limites (1-{})", n, pool.size);
        }
        if anchors[..i].contains(&n) {
            bail!("Ancre en double : {}", n);
        }
    }
    Ok(())
}

/// Historique de travail : tirages réels et importés, complétés par génération.
fn load_history(conn: &Connection, config: &QuantConfig, anchors: &[u8]) -> Result<EtlOutput> {
    let pool = Pool::KL8;
    validate_anchors(anchors, pool)?;

    let stored = fetch_all_draws(conn)?;
    let mut cache = SqliteCache::new(conn, config.generator.cache_prefix);
    let mut progress = SpinnerSink::new()?;
    let output = run_etl(config, pool, &stored, &mut cache, anchors, &mut progress);
    progress.finish(&format!("Historique prêt : {} tirages", output.history.len()));
    Ok(output)
}

fn cmd_sync(conn: &Connection, config: &QuantConfig) -> Result<()> {
    let output = load_history(conn, config, &[])?;
    let stored = count_draws(conn)?;
    println!(
        "Historique de travail : {} tirages ({} importés, plus récent : {})",
        output.history.len(),
        stored,
        output.history.first().map(|d| d.issue.as_str()).unwrap_or("—"),
    );
    for poll in &output.polls {
        let state = if poll.ok { "ok" } else { "injoignable" };
        println!("  {} : {} (période {})", poll.provider, state, poll.latest_issue);
    }
    Ok(())
}

fn cmd_import(conn: &Connection, file: &Path, replace: bool) -> Result<()> {
    let result = import::import_csv(conn, file, Pool::KL8, replace)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, config: &QuantConfig, last: usize, stored: bool) -> Result<()> {
    if stored {
        if count_draws(conn)? == 0 {
            println!("Base vide. Lancez d'abord : kl8 import --file <csv>");
            return Ok(());
        }
        let limit = u32::try_from(last).unwrap_or(u32::MAX);
        display_draws(&fetch_last_draws(conn, limit)?);
        return Ok(());
    }
    let output = load_history(conn, config, &[])?;
    let n = last.min(output.history.len());
    display_draws(&output.history[..n]);
    Ok(())
}

fn cmd_features(conn: &Connection, config: &QuantConfig, anchors: &[u8]) -> Result<()> {
    let output = load_history(conn, config, anchors)?;
    display_features(&output.features, output.history.len(), anchors);
    Ok(())
}

fn cmd_predict(conn: &Connection, config: &QuantConfig, anchors: &[u8], top: usize) -> Result<()> {
    let output = load_history(conn, config, anchors)?;
    let result = compute_all_with_modulus(&output.history, Pool::KL8, anchors, config.modulus);
    display_prediction(&result, top);
    Ok(())
}

fn cmd_tails(conn: &Connection, config: &QuantConfig) -> Result<()> {
    let output = load_history(conn, config, &[])?;
    display_tails(&tail_features(&output.history));
    Ok(())
}

fn cmd_convergence(config: &QuantConfig, seed: Option<u64>) -> Result<()> {
    let seed = seed.unwrap_or_else(date_seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let trajectory = simulate_convergence(&config.convergence, &mut rng);
    display_convergence_chart(&trajectory);
    Ok(())
}

fn cmd_assess(
    conn: &Connection,
    config: &QuantConfig,
    strategy: &str,
    response: Option<&Path>,
) -> Result<()> {
    let output = load_history(conn, config, &[])?;
    let request = AssessmentRequest::new(strategy, &output.history, &output.features);

    let assessor: Box<dyn StrategyAssessor> = match response {
        Some(path) => Box::new(RecordedAssessor::new(path)),
        None => Box::new(OfflineAssessor),
    };
    let assessment = assess_or_fallback(assessor.as_ref(), &request);
    display_assessment(&assessment);
    Ok(())
}

fn cmd_config(config: &QuantConfig, path: &Path, write: bool) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    if write {
        save_config(config, path)?;
        println!("\nConfiguration écrite dans {}", path.display());
    }
    Ok(())
}
