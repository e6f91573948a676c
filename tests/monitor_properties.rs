use std::time::Duration;

use proptest::prelude::*;

use mlshim::monitor::{
    FAILED, FINISHED, LICENSE_ERROR, LogScan, MonitorCore, Observation, STARTED, Step, Verdict,
};
use mlshim::types::{CompletionPolicy, Phase};

// Noise lines never contain a sentinel or the license marker.
fn noise_line() -> impl Strategy<Value = String> {
    "[a-z0-9 .:>]{0,30}"
}

fn observation() -> impl Strategy<Value = Observation> {
    prop_oneof![
        Just(Observation::Missing),
        Just(Observation::Unreadable),
        (any::<bool>(), any::<bool>(), any::<bool>(), prop::bool::weighted(0.1)).prop_map(
            |(started, finished, failed, license_error)| {
                Observation::Content(LogScan {
                    started,
                    finished,
                    failed,
                    license_error,
                })
            }
        ),
    ]
}

proptest! {
    #[test]
    fn sentinels_are_found_anywhere_with_padding(
        noise in proptest::collection::vec(noise_line(), 0..20),
        at in any::<prop::sample::Index>(),
        pad in "[ \t]{0,3}",
    ) {
        let mut lines = noise.clone();
        let idx = at.index(lines.len() + 1);
        lines.insert(idx, format!("{pad}{STARTED}{pad}"));
        let scan = LogScan::from_text(&lines.join("\r\n"));

        prop_assert!(scan.started);
        prop_assert!(!scan.finished);
        prop_assert!(!scan.failed);
        prop_assert!(!scan.license_error);
    }

    #[test]
    fn sentinel_text_inside_a_longer_line_does_not_count(
        prefix in "[a-z]{1,10}",
    ) {
        let text = format!("{prefix}{FINISHED}\n{prefix} {FAILED}\n");
        let scan = LogScan::from_text(&text);
        prop_assert!(!scan.finished);
        prop_assert!(!scan.failed);
    }

    #[test]
    fn license_marker_wins_whenever_present(
        started in any::<bool>(),
        finished in any::<bool>(),
        failed in any::<bool>(),
        noise in noise_line(),
    ) {
        let mut text = format!("{noise} {LICENSE_ERROR} {noise}\n");
        for (on, line) in [(started, STARTED), (finished, FINISHED), (failed, FAILED)] {
            if on {
                text.push_str(line);
                text.push('\n');
            }
        }
        let scan = LogScan::from_text(&text);
        let mut core = MonitorCore::new(Duration::from_secs(60), CompletionPolicy::default());

        prop_assert_eq!(
            core.observe(Observation::Content(scan), Duration::from_secs(1)),
            Step::Finish(Verdict::LicenseError)
        );
    }

    #[test]
    fn phases_only_move_forward_and_verdicts_stick(
        steps in proptest::collection::vec((observation(), 0u64..50), 1..40),
        detach in any::<bool>(),
    ) {
        let completion = if detach {
            CompletionPolicy::Detach
        } else {
            CompletionPolicy::Wait(Duration::from_millis(300))
        };
        let mut core = MonitorCore::new(Duration::from_millis(200), completion);
        let mut elapsed = Duration::ZERO;
        let mut first_verdict = None;

        for (obs, advance) in steps {
            elapsed += Duration::from_millis(advance);
            let step = core.observe(obs, elapsed);

            match (first_verdict, step) {
                (None, Step::Finish(v)) => first_verdict = Some(v),
                (Some(v), s) => prop_assert_eq!(s, Step::Finish(v)),
                (None, Step::Poll) => prop_assert!(!core.phase().is_terminal()),
            }
        }

        let history = core.history();
        prop_assert_eq!(history[0], Phase::AwaitingLogCreation);
        prop_assert!(history.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(history.iter().filter(|p| p.is_terminal()).count() <= 1);
        if let Some(v) = first_verdict {
            prop_assert_eq!(core.phase(), v.phase());
            prop_assert_eq!(core.verdict(), Some(v));
        }
    }

    #[test]
    fn success_is_never_reported_without_started(
        steps in proptest::collection::vec((observation(), 0u64..50), 1..40),
    ) {
        let mut core = MonitorCore::new(Duration::from_millis(200), CompletionPolicy::default());
        let mut elapsed = Duration::ZERO;
        for (obs, advance) in steps {
            elapsed += Duration::from_millis(advance);
            if let Step::Finish(v) = core.observe(obs, elapsed) {
                if v == Verdict::Succeeded {
                    prop_assert!(core.started_at().is_some());
                }
                break;
            }
        }
    }
}
