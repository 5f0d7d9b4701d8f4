use rand::seq::SliceRandom;
use rand::Rng;

pub const GREETING: &str = "Hello! I'm the quality prediction assistant. Ask me anything about battery quality analysis.";

const REPLIES: &[&str] = &[
    "The defect rate is running high. Check the temperature and humidity conditions.",
    "Particle size is outside the optimal range. Try adjusting the mixing time in the process.",
    "Conductivity looks healthy. Keep the current process conditions.",
    "I can suggest quality improvements based on the prediction results.",
    "Upload more samples if you need further analysis.",
];

/// Canned advice; the question is not inspected.
pub fn reply<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    REPLIES.choose(rng).copied().unwrap_or(GREETING)
}
