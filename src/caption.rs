//! Caption composition for generated mandalas.
//!
//! Three styles are supported, selected at startup. `template` and
//! `keywords` are deterministic; `random` draws uniformly (with
//! replacement, so consecutive repeats are possible) from a fixed set of
//! sentences. Mood lookup is case-insensitive: the input is folded to
//! lowercase for matching, while the fallback sentence keeps the user's
//! casing for display.

use clap::ValueEnum;
use rand::Rng;
use rand::RngExt;

/// Which caption style a deployment uses.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum CaptionStyle {
    /// One fixed sentence embedding age and mood verbatim.
    #[default]
    Template,
    /// Mood keyword lookup plus an age-tier suffix.
    Keywords,
    /// Uniform choice among a fixed set of sentences.
    Random,
}

/// Derives a human-readable caption from (age, mood).
#[derive(Clone, Copy, Debug, Default)]
pub struct CaptionComposer {
    style: CaptionStyle,
}

const RANDOM_CAPTIONS: [&str; 5] = [
    "At {age}, feeling {mood} looks like this: every ring settles into place.",
    "A {mood} moment, captured in circles for your {age}th year.",
    "This is what {mood} looks like when you are {age} and paying attention.",
    "Rings within rings for a {mood} soul of {age} years.",
    "{age} years in, still {mood} at the centre of it all.",
];

impl CaptionComposer {
    /// Creates a composer with the given style.
    pub fn new(style: CaptionStyle) -> Self {
        Self { style }
    }

    /// Composes a caption, drawing any randomness from the process RNG.
    pub fn compose(self, age: u8, mood: &str) -> String {
        self.compose_with(&mut rand::rng(), age, mood)
    }

    /// Composes a caption using the supplied random source.
    ///
    /// Only the `random` style consumes the generator; tests pass a
    /// seeded one for reproducibility.
    pub fn compose_with<R: Rng>(self, rng: &mut R, age: u8, mood: &str) -> String {
        match self.style {
            CaptionStyle::Template => template_caption(age, mood),
            CaptionStyle::Keywords => keyword_caption(age, mood),
            CaptionStyle::Random => interpolate(
                RANDOM_CAPTIONS[rng.random_range(0..RANDOM_CAPTIONS.len())],
                age,
                mood,
            ),
        }
    }
}

fn template_caption(age: u8, mood: &str) -> String {
    format!(
        "Age {age}, feeling {mood} – this mandala reflects your moment. Like petals stretching from all directions, your energy is balanced and expressive."
    )
}

fn keyword_caption(age: u8, mood: &str) -> String {
    let folded = mood.to_lowercase();
    let phrase = match folded.as_str() {
        "peaceful" => "A peaceful stillness gathers at the centre and ripples outward.".to_string(),
        "joyful" => "A joyful burst of petals radiates in every direction.".to_string(),
        "excited" => "An excited spiral of lines leaps from ring to ring.".to_string(),
        "nostalgic" => {
            "A nostalgic weave of patterns folds old memories into new ones.".to_string()
        }
        "anxious" => "An anxious lattice steadies itself, line by careful line.".to_string(),
        "tired" => "A tired softness settles into slow, heavy curves.".to_string(),
        "curious" => "A curious path wanders inward, tracing question after question.".to_string(),
        "sad" => "A sad quiet rests in the spaces between the lines.".to_string(),
        _ => format!("Every line traces the shape of feeling {mood}."),
    };
    format!("{phrase} {}", age_tier_suffix(age))
}

fn age_tier_suffix(age: u8) -> String {
    if age < 20 {
        format!("At {age}, its petals are still unfolding.")
    } else if age < 60 {
        format!("At {age}, its rings hold the balance of full bloom.")
    } else {
        format!("At {age}, its circles carry the calm of a long journey.")
    }
}

fn interpolate(template: &str, age: u8, mood: &str) -> String {
    template
        .replace("{age}", &age.to_string())
        .replace("{mood}", mood)
}
