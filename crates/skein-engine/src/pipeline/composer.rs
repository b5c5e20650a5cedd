use crate::pipeline::PipelineElement;
use crate::target::Capabilities;

/// Picks one winner per responsibility category and orders them.
///
/// For every distinct category among `candidates` (first-seen order), the
/// available candidate with the strictly greatest preference wins; ties keep
/// the first-registered candidate and log a warning. Categories with no
/// available candidate are dropped with a diagnostic, never an error.
///
/// Returns indices into `candidates`, stable-sorted by execution order.
/// Idempotent; meant to be re-run wholesale whenever the candidate set or the
/// backend capabilities change.
pub fn compose<T>(candidates: &[&T], capabilities: &Capabilities, element_kind: &str) -> Vec<usize>
where
    T: PipelineElement + ?Sized,
{
    let mut categories: Vec<&str> = Vec::new();
    for candidate in candidates {
        if !categories.contains(&candidate.category()) {
            categories.push(candidate.category());
        }
    }

    let mut winners: Vec<usize> = Vec::new();
    for category in categories {
        let mut best: Option<usize> = None;
        let mut tied = false;

        for (i, candidate) in candidates.iter().enumerate() {
            if candidate.category() != category || !candidate.is_available(capabilities) {
                continue;
            }

            match best {
                None => best = Some(i),
                Some(b) => {
                    let best_preference = candidates[b].preference_in_category();
                    let preference = candidate.preference_in_category();
                    if preference > best_preference {
                        best = Some(i);
                        tied = false;
                    } else if preference == best_preference {
                        tied = true;
                    }
                }
            }
        }

        match best {
            Some(i) => {
                if tied {
                    log::warn!(
                        "preference tie among available {element_kind}s in category '{category}'; \
                         keeping first-registered '{}'",
                        candidates[i].name()
                    );
                }
                log::info!(
                    "using best available {element_kind} '{}' for category '{category}'",
                    candidates[i].name()
                );
                winners.push(i);
            }
            None => {
                log::info!("no available {element_kind} for category '{category}'");
            }
        }
    }

    winners.sort_by_key(|&i| candidates[i].order());
    winners
}
