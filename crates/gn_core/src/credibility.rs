pub const BASE_SCORE: u8 = 5;
pub const MAX_SCORE: u8 = 10;

const RECOGNIZED_OUTLETS: &[&str] = &[
    "reuters",
    "ap",
    "bbc",
    "cnn",
    "fox news",
    "npr",
    "wall street journal",
    "new york times",
];

/// Heuristic reputation score in `[5, 10]`: +2 per recognized outlet, +1 per
/// other source.
pub fn score<S: AsRef<str>>(sources: &[S]) -> u8 {
    let total = sources.iter().fold(u32::from(BASE_SCORE), |acc, source| {
        acc + if is_recognized(source.as_ref()) { 2 } else { 1 }
    });
    total.min(u32::from(MAX_SCORE)) as u8
}

pub fn is_recognized(source: &str) -> bool {
    let source = source.to_lowercase();
    RECOGNIZED_OUTLETS.iter().any(|outlet| source.contains(outlet))
}
