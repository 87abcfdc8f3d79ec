//! Observed-mode classification for display.

use mirror_models::{LookAwayType, ObservedMode, ObservedModeReading, Scores, SignalQuality};

/// Tick state the classifier reads. Built after event detection.
#[derive(Debug, Clone, Copy)]
pub struct ObservedInputs {
    pub scores: Scores,
    pub quality: SignalQuality,
    pub face_present: bool,
    pub focus_streak_active: bool,
    pub look_away: Option<LookAwayType>,
    pub distraction_active: bool,
    pub energy_dip_active: bool,
}

/// First matching rule wins.
pub fn classify(inputs: &ObservedInputs) -> ObservedModeReading {
    let Scores { focus, energy, .. } = inputs.scores;

    if inputs.quality.q_total < 50.0 {
        let confidence = inputs.quality.q_total.round().clamp(0.0, 100.0) as u8;
        return ObservedModeReading::new(ObservedMode::LowSignal, confidence);
    }
    if !inputs.face_present {
        return ObservedModeReading::new(ObservedMode::Away, 100);
    }
    if inputs.focus_streak_active {
        return ObservedModeReading::new(ObservedMode::DeepFocus, focus);
    }
    if inputs.look_away == Some(LookAwayType::Thinking) {
        return ObservedModeReading::new(ObservedMode::Thinking, 75);
    }
    if inputs.distraction_active || focus <= 55 {
        return ObservedModeReading::new(ObservedMode::Distracted, 100 - focus.min(100));
    }
    if inputs.energy_dip_active || energy <= 50 {
        return ObservedModeReading::new(ObservedMode::Fatigued, 100 - energy.min(100));
    }
    if energy >= 80 && focus >= 70 {
        return ObservedModeReading::new(ObservedMode::HighEnergy, energy);
    }
    ObservedModeReading::new(ObservedMode::Neutral, 70)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(focus: u8, energy: u8) -> ObservedInputs {
        ObservedInputs {
            scores: Scores {
                focus,
                energy,
                confidence: 70,
            },
            quality: SignalQuality::default(),
            face_present: true,
            focus_streak_active: false,
            look_away: None,
            distraction_active: false,
            energy_dip_active: false,
        }
    }

    #[test]
    fn test_low_signal_wins() {
        let mut i = inputs(90, 90);
        i.quality.q_total = 42.4;
        i.face_present = false;
        let reading = classify(&i);
        assert_eq!(reading.mode, ObservedMode::LowSignal);
        assert_eq!(reading.confidence, 42);
    }

    #[test]
    fn test_away_then_deep_focus() {
        let mut i = inputs(90, 90);
        i.face_present = false;
        assert_eq!(classify(&i).mode, ObservedMode::Away);

        i.face_present = true;
        i.focus_streak_active = true;
        let reading = classify(&i);
        assert_eq!(reading.mode, ObservedMode::DeepFocus);
        assert_eq!(reading.confidence, 90);
        assert_eq!(reading.label, "Deep Focus");
    }

    #[test]
    fn test_thinking_look_away() {
        let mut i = inputs(50, 50);
        i.look_away = Some(LookAwayType::Thinking);
        assert_eq!(classify(&i).mode, ObservedMode::Thinking);
        i.look_away = Some(LookAwayType::Distracted);
        assert_eq!(classify(&i).mode, ObservedMode::Distracted);
    }

    #[test]
    fn test_score_based_modes() {
        let distracted = classify(&inputs(40, 90));
        assert_eq!(distracted.mode, ObservedMode::Distracted);
        assert_eq!(distracted.confidence, 60);

        let fatigued = classify(&inputs(70, 45));
        assert_eq!(fatigued.mode, ObservedMode::Fatigued);
        assert_eq!(fatigued.confidence, 55);

        assert_eq!(classify(&inputs(75, 85)).mode, ObservedMode::HighEnergy);
        assert_eq!(classify(&inputs(65, 65)).confidence, 70);
        assert_eq!(classify(&inputs(65, 65)).mode, ObservedMode::Neutral);
    }
}
