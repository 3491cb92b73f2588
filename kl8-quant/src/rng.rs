use chrono::Datelike;

/// Pseudo-aléatoire déterministe : même seed, même valeur, sur toutes les plateformes
/// qui partagent l'implémentation de `sin`.
///
/// `x = sin(seed) * 10000`, on garde la partie fractionnaire.
pub fn seeded_random(seed: u64) -> f64 {
    let x = (seed as f64).sin() * 10_000.0;
    let r = x - x.floor();
    // x - floor(x) peut arrondir à 1.0 pour un x négatif très proche de 0
    r.clamp(0.0, 1.0 - f64::EPSILON)
}

/// Tirage sans remise de `draw_size` numéros parmi `1..=pool_size`, trié croissant.
pub fn draw_without_replacement(seed: u64, pool_size: u8, draw_size: usize) -> Vec<u8> {
    let mut remaining: Vec<u8> = (1..=pool_size).collect();
    let count = draw_size.min(remaining.len());
    let mut picked = Vec::with_capacity(count);

    for j in 0..count {
        let r = seeded_random(seed.wrapping_add(j as u64));
        let idx = ((r * remaining.len() as f64).floor() as usize).min(remaining.len() - 1);
        picked.push(remaining.remove(idx));
    }

    picked.sort_unstable();
    picked
}

/// Seed du jour au format YYYYMMDD, pour les affichages non reproductibles d'un jour à l'autre.
pub fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    today.year() as u64 * 10_000 + today.month() as u64 * 100 + today.day() as u64
}
