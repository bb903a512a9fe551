use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};

const RANDOM_LEN: usize = 9;

/// Generates a document id of the form `{prefix}_{unix_millis}_{random}`.
pub fn generate_id(prefix: &str) -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_LEN)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("{}_{}_{}", prefix, Utc::now().timestamp_millis(), random)
}
