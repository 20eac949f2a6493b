use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Returns a random lowercase alphanumeric string, safe to use in urls.
pub fn random_string(length: usize) -> String {
    let mut rng = thread_rng();

    std::iter::repeat(())
        .map(|_| (rng.sample(Alphanumeric) as char).to_ascii_lowercase())
        .take(length)
        .collect()
}
