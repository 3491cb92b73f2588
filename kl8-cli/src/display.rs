use anyhow::Result;
use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};
use indicatif::{ProgressBar, ProgressStyle};
use textplots::Plot;

use crate::import::ImportResult;
use kl8_db::models::Draw;
use kl8_quant::analysis::modulo::ModuloStats;
use kl8_quant::analysis::palace::PalaceState;
use kl8_quant::analysis::tails::TailFeature;
use kl8_quant::assessment::Assessment;
use kl8_quant::features::{HotLevel, NumberFeature};
use kl8_quant::pipeline::PredictionResult;
use kl8_quant::progress::{ProgressSink, StepStatus};
use kl8_quant::ranking::Confidence;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

/// Étapes du pipeline sur un spinner `indicatif`.
pub struct SpinnerSink {
    pb: ProgressBar,
}

impl SpinnerSink {
    pub fn new() -> Result<Self> {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Ok(Self { pb })
    }

    pub fn finish(&self, message: &str) {
        self.pb.finish_with_message(message.to_string());
    }
}

impl ProgressSink for SpinnerSink {
    fn report(&mut self, message: &str, status: StepStatus) {
        match status {
            StepStatus::Running => self.pb.set_message(message.to_string()),
            StepStatus::Success | StepStatus::Error => {
                self.pb.println(format!("  [{}] {}", status, message));
            }
        }
    }
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Période", "Date", "Numéros"]);
    for draw in draws {
        table.add_row(vec![&draw.issue, &draw.date, &join_numbers(&draw.numbers)]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

fn level_color(level: HotLevel) -> Color {
    match level {
        HotLevel::Hot => Color::Red,
        HotLevel::Warm => Color::Yellow,
        HotLevel::Cold => Color::Blue,
    }
}

pub fn display_features(features: &[NumberFeature], history_len: usize, anchors: &[u8]) {
    println!("\n📊 Caractéristiques sur {} tirages", history_len);
    if !anchors.is_empty() {
        println!("   Numéros ancres : {}", join_numbers(anchors));
    }
    println!();

    let mut table = new_table(vec![
        "Numéro", "Fréq.", "Retard", "Retard max", "MA30", "Niveau", "Tendance", "P(cond)", "Markov",
        "Bayes", "Score",
    ]);
    for f in features {
        table.add_row(vec![
            Cell::new(format!("{:2}", f.number)),
            Cell::new(f.freq.to_string()),
            Cell::new(f.current_gap.to_string()),
            Cell::new(f.max_gap.to_string()),
            Cell::new(format!("{:.3}", f.ma30)),
            Cell::new(f.hot_level.to_string()).fg(level_color(f.hot_level)),
            Cell::new(f.trend.to_string()),
            Cell::new(format!("{:.3}", f.cond_prob)),
            Cell::new(format!("{:.3}", f.markov_prob)),
            Cell::new(format!("{:.3}", f.bayesian_post)),
            Cell::new(format!("{:.3}", f.score())),
        ]);
    }
    println!("{table}");
}

pub fn display_prediction(result: &PredictionResult, top: usize) {
    println!("\n🎯 Sélections\n");
    let color = match result.confidence {
        Confidence::High => Color::Green,
        Confidence::Medium => Color::Yellow,
        Confidence::Low => Color::Red,
    };
    let mut table = new_table(vec!["Sélection", "Numéros"]);
    table.add_row(vec![Cell::new("Ancres suivies (6)"), Cell::new(join_numbers(&result.anchor_follow))]);
    table.add_row(vec![Cell::new("Noyau (4)"), Cell::new(join_numbers(&result.core_anchor))]);
    table.add_row(vec![Cell::new("Couverture (7)"), Cell::new(join_numbers(&result.covering))]);
    table.add_row(vec![Cell::new("Confiance"), Cell::new(result.confidence.to_string()).fg(color)]);
    println!("{table}");

    println!("\n── Classement (top {}) ──", top);
    let mut table = new_table(vec!["Rang", "Numéro", "Score"]);
    for (i, s) in result.ranking.iter().take(top).enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            format!("{:2}", s.number),
            format!("{:.4}", s.score),
        ]);
    }
    println!("{table}");

    display_palaces(&result.palaces);
    display_modulo(&result.modulo);
    display_spatial(&result.spatial_matrix);

    println!("\nEntropie normalisée : {:.4}", result.entropy);
    println!("Indicateurs décoratifs : r = {:.2}, fitness = {:.4}", result.r_ratio, result.pso_fitness);
}

pub fn display_palaces(palaces: &[PalaceState]) {
    println!("\n── Palais ──");
    let mut table = new_table(vec![
        "Palais", "Plage", "Actuel", "Précédent", "Prévu", "Confiance", "Figure",
    ]);
    for p in palaces {
        table.add_row(vec![
            p.palace.id.to_string(),
            format!("{:2}-{:2}", p.palace.start, p.palace.end),
            p.current_count.to_string(),
            p.previous_count.to_string(),
            p.predicted_next_count.to_string(),
            format!("{:.1}%", p.confidence * 100.0),
            p.trend_type.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_modulo(stats: &ModuloStats) {
    println!("\n── Restes modulo {} ──", stats.modulus);
    let mut table = new_table(vec!["Reste", "Effectif", "Attendu", "Cycle", "Candidats"]);
    for r in &stats.residues {
        let color = if r.cycle_score >= 1.0 { Color::Green } else { Color::White };
        table.add_row(vec![
            Cell::new(r.remainder.to_string()),
            Cell::new(r.count.to_string()),
            Cell::new(format!("{:.1}", r.expected)),
            Cell::new(format!("{:.2}", r.cycle_score)).fg(color),
            Cell::new(join_numbers(&r.predicted_numbers)),
        ]);
    }
    println!("{table}");
}

pub fn display_spatial(matrix: &[Vec<f64>]) {
    println!("\n── Matrice spatiale (apparitions récentes) ──");
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic);
    for (row, values) in matrix.iter().enumerate() {
        let cells: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(col, v)| format!("{:2}:{:>3}", row * 10 + col + 1, *v as u32))
            .collect();
        table.add_row(cells);
    }
    println!("{table}");
}

pub fn display_tails(tails: &[TailFeature]) {
    println!("\n── Terminaisons (100 derniers tirages) ──");
    let mut table = new_table(vec![
        "Chiffre", "Effectif", "Score", "Taille", "Impair", "Premier", "Yang", "Élément", "Couleur",
    ]);
    let yes_no = |b: bool| (if b { "oui" } else { "non" }).to_string();
    for t in tails {
        table.add_row(vec![
            t.tail.to_string(),
            t.count.to_string(),
            format!("{:.2}", t.trend_score),
            t.properties.size.to_string(),
            yes_no(t.properties.is_odd),
            yes_no(t.properties.is_prime),
            yes_no(t.properties.is_yang),
            t.properties.element.to_string(),
            t.properties.color.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_convergence_chart(trajectory: &[f64]) {
    println!("\n== Trajectoire de convergence (illustrative) ==\n");
    if trajectory.is_empty() {
        println!("  (Pas de données à afficher)");
        return;
    }

    let points: Vec<(f32, f32)> = trajectory
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f32, v as f32))
        .collect();
    let x_max = (trajectory.len().max(2) - 1) as f32;
    let shape = textplots::Shape::Lines(&points);
    let mut chart = textplots::Chart::new_with_y_range(120, 40, 0.0, x_max, 0.0, 1.0);
    println!("{}", chart.lineplot(&shape));

    if let Some(last) = trajectory.last() {
        println!("  Valeur finale : {:.4}", last);
    }
}

pub fn display_assessment(assessment: &Assessment) {
    println!("\n🧭 Évaluation de la stratégie\n");
    let mut table = new_table(vec!["Champ", "Valeur"]);
    table.add_row(vec!["Score".to_string(), format!("{:.1} / 100", assessment.score)]);
    table.add_row(vec!["Confiance".to_string(), assessment.confidence.to_string()]);
    table.add_row(vec!["Tendance".to_string(), assessment.trend.to_string()]);
    println!("{table}");

    println!("\nAlertes :");
    for alert in &assessment.alerts {
        println!("  ⚠ {}", alert);
    }
    println!("\n{}", assessment.reasoning);
}
