use rand::Rng;
use serde::Serialize;
use std::fmt;

/// One of the two people a question can be addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Participant {
    Nono,
    Mathou,
}

impl Participant {
    pub const ALL: [Participant; 2] = [Participant::Nono, Participant::Mathou];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Nono => "Nono",
            Self::Mathou => "Mathou",
        }
    }

    /// Badge shown above the question.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Nono => "Pour Nono",
            Self::Mathou => "Pour Mathou",
        }
    }

    /// Uniform pick, independent of whoever had the previous question.
    pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Self::Nono
        } else {
            Self::Mathou
        }
    }

    pub fn random() -> Self {
        Self::pick(&mut rand::thread_rng())
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_display_names() {
        assert_eq!(Participant::Nono.display_name(), "Nono");
        assert_eq!(Participant::Mathou.to_string(), "Mathou");
        assert_eq!(Participant::Nono.label(), "Pour Nono");
        assert_eq!(Participant::Mathou.label(), "Pour Mathou");
    }

    #[test]
    fn test_pick_reaches_both_variants() {
        let mut rng = StdRng::seed_from_u64(7);
        let picks: Vec<Participant> = (0..200).map(|_| Participant::pick(&mut rng)).collect();
        let nono = picks.iter().filter(|p| **p == Participant::Nono).count();
        assert!(nono > 50 && nono < 150, "skewed pick: {nono}/200");
    }

    #[test]
    fn test_pick_does_not_alternate() {
        // Re-rolled every turn: the same participant can come up twice in a row.
        let mut rng = StdRng::seed_from_u64(42);
        let picks: Vec<Participant> = (0..100).map(|_| Participant::pick(&mut rng)).collect();
        assert!(picks.windows(2).any(|w| w[0] == w[1]));
    }
}
