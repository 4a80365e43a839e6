pub const CORRECT_INPUT: u64 = 50;
pub const PERFECT_PATTERN: u64 = 100;
pub const COMBO_STEP: f64 = 0.1;

/// Point values for a run. Kept as data so the flat and combo-scaled
/// variants of the trainer can both be expressed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scoring {
    pub correct_input: u64,
    pub perfect_pattern: u64,
    /// Extra fraction of `correct_input` per combo step; 0 gives flat scoring.
    pub combo_step: f64,
    /// When set, a miss on the first pattern step also starts the miss pause.
    pub strict_first_input: bool,
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            correct_input: CORRECT_INPUT,
            perfect_pattern: PERFECT_PATTERN,
            combo_step: COMBO_STEP,
            strict_first_input: false,
        }
    }
}

impl Scoring {
    pub fn flat() -> Self {
        Self { combo_step: 0.0, ..Self::default() }
    }

    /// Points for a correct input given the combo held *before* this input.
    pub fn award(&self, combo: u32) -> u64 {
        if combo == 0 || self.combo_step <= 0.0 {
            return self.correct_input;
        }
        (self.correct_input as f64 * (1.0 + combo as f64 * self.combo_step)).floor() as u64
    }
}

/// Percentage of inputs that were correct; 100 before any input.
pub fn accuracy(perfect_inputs: u32, total_inputs: u32) -> f64 {
    if total_inputs == 0 {
        return 100.0;
    }
    perfect_inputs as f64 / total_inputs as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combo_scales_the_base_award() {
        let s = Scoring::default();
        assert_eq!(s.award(0), 50);
        assert_eq!(s.award(1), 55);
        assert_eq!(s.award(2), 60);
        assert_eq!(s.award(3), 65);
        assert_eq!(s.award(10), 100);
    }

    #[test]
    fn flat_scoring_ignores_combo() {
        let s = Scoring::flat();
        assert_eq!(s.award(0), 50);
        assert_eq!(s.award(7), 50);
    }

    #[test]
    fn accuracy_is_vacuously_full() {
        assert_eq!(accuracy(0, 0), 100.0);
        assert_eq!(accuracy(3, 4), 75.0);
        assert_eq!(accuracy(0, 2), 0.0);
    }
}
