#![cfg(not(target_arch = "wasm32"))]

mod common;

use common::FakePage;
use glitch_wasm::keyseq::KeySequence;
use glitch_wasm::rng::seeded;
use glitch_wasm::{EffectController, GlitchConfig, TargetId};
use proptest::prelude::*;

proptest! {
    #[test]
    fn scramble_preserves_spaces_and_restores_text(text in "[a-zA-Z0-9 ]{0,24}", seed in any::<u64>()) {
        let page = FakePage::new(&[text.as_str()], 0, (1, 1));
        let mut c = EffectController::new(page, seeded(seed), GlitchConfig::default(), false, 0.0).unwrap();
        c.scramble_text(TargetId(0));

        let mut t = 0.0;
        while t <= 300.0 {
            c.tick(t);
            let shown = c.page().text_of(0).to_string();
            prop_assert_eq!(shown.chars().count(), text.chars().count());
            for (o, s) in text.chars().zip(shown.chars()) {
                if o == ' ' {
                    prop_assert_eq!(s, ' ');
                }
            }
            t += 5.0;
        }

        c.tick(300.0 + 30.0 * (text.chars().count() as f64 + 1.0));
        prop_assert_eq!(c.page().text_of(0), text.as_str());
        prop_assert!(!c.page().has_class(0, "text-scramble"));
    }

    #[test]
    fn key_sequence_matches_exactly_when_tail_equals_target(
        target in prop::collection::vec(0u32..6, 1..6),
        input in prop::collection::vec(0u32..6, 0..20),
    ) {
        let mut seq = KeySequence::new(target.clone());
        for (i, &code) in input.iter().enumerate() {
            let hit = seq.push(code);
            let seen = &input[..=i];
            let expected = seen.len() >= target.len() && seen[seen.len() - target.len()..] == target[..];
            prop_assert_eq!(hit, expected);
        }
    }
}
