//! Reconciler: cross-checks agent candidates against the Reference Table.
//!
//! Per candidate, first matching rule wins:
//! 1. exact (code, title) match → keep
//! 2. title matches an entry   → take that entry's code
//! 3. code matches an entry    → take that entry's title
//! 4. otherwise                → discard
//!
//! After the rules, a candidate whose resolved code already appeared earlier in
//! the set is dropped as a duplicate; the first occurrence is kept.
//!
//! Title is consulted before code: the agent mis-remembers a digit far more
//! often than it invents a verbatim taxonomy title. Every surviving candidate
//! has an exact pair in the table, so reconciling the output again is a no-op.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classification::code::OccupationCode;
use crate::classification::models::{ClassificationCandidate, ClassificationResultSet};
use crate::reference::ReferenceTable;

/// What happened to one candidate, in agent order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CandidateOutcome {
    Kept {
        occupation_code: OccupationCode,
    },
    CodeRepaired {
        occupation_title: String,
        from: OccupationCode,
        to: OccupationCode,
    },
    TitleRepaired {
        occupation_code: OccupationCode,
        from: String,
        to: String,
    },
    /// Resolved to a code already surfaced by an earlier candidate.
    Duplicate {
        occupation_code: OccupationCode,
    },
    /// Matched nothing in the table by code or title.
    Discarded {
        occupation_code: OccupationCode,
        occupation_title: String,
    },
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub result_set: ClassificationResultSet,
    pub outcomes: Vec<CandidateOutcome>,
}

impl Reconciliation {
    pub fn repaired_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o,
                    CandidateOutcome::CodeRepaired { .. } | CandidateOutcome::TitleRepaired { .. }
                )
            })
            .count()
    }

    pub fn dropped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o,
                    CandidateOutcome::Discarded { .. } | CandidateOutcome::Duplicate { .. }
                )
            })
            .count()
    }
}

pub fn reconcile(set: ClassificationResultSet, table: &ReferenceTable) -> Reconciliation {
    let ClassificationResultSet {
        job_classifications,
        overall_explanation,
    } = set;

    let mut kept = Vec::with_capacity(job_classifications.len());
    let mut outcomes = Vec::with_capacity(job_classifications.len());
    let mut seen: HashSet<OccupationCode> = HashSet::new();

    for candidate in job_classifications {
        let (resolved, outcome) = resolve(candidate, table);
        let Some(candidate) = resolved else {
            outcomes.push(outcome);
            continue;
        };

        if !seen.insert(candidate.occupation_code.clone()) {
            debug!(code = %candidate.occupation_code, "Dropping duplicate candidate");
            outcomes.push(CandidateOutcome::Duplicate {
                occupation_code: candidate.occupation_code,
            });
            continue;
        }

        kept.push(candidate);
        outcomes.push(outcome);
    }

    Reconciliation {
        result_set: ClassificationResultSet {
            job_classifications: kept,
            overall_explanation,
        },
        outcomes,
    }
}

fn resolve(
    candidate: ClassificationCandidate,
    table: &ReferenceTable,
) -> (Option<ClassificationCandidate>, CandidateOutcome) {
    if table.contains_pair(&candidate.occupation_code, &candidate.occupation_title) {
        let outcome = CandidateOutcome::Kept {
            occupation_code: candidate.occupation_code.clone(),
        };
        return (Some(candidate), outcome);
    }

    if let Some(entry) = table.by_title(&candidate.occupation_title) {
        info!(
            title = %candidate.occupation_title,
            from = %candidate.occupation_code,
            to = %entry.occupation_code,
            "Repaired occupation code from title"
        );
        let outcome = CandidateOutcome::CodeRepaired {
            occupation_title: candidate.occupation_title.clone(),
            from: candidate.occupation_code,
            to: entry.occupation_code.clone(),
        };
        let repaired = ClassificationCandidate {
            occupation_code: entry.occupation_code.clone(),
            occupation_title: candidate.occupation_title,
            explanation: candidate.explanation,
        };
        return (Some(repaired), outcome);
    }

    if let Some(entry) = table.by_code(&candidate.occupation_code) {
        info!(
            code = %candidate.occupation_code,
            from = %candidate.occupation_title,
            to = %entry.occupation_title,
            "Repaired occupation title from code"
        );
        let outcome = CandidateOutcome::TitleRepaired {
            occupation_code: candidate.occupation_code.clone(),
            from: candidate.occupation_title,
            to: entry.occupation_title.clone(),
        };
        let repaired = ClassificationCandidate {
            occupation_code: candidate.occupation_code,
            occupation_title: entry.occupation_title.clone(),
            explanation: candidate.explanation,
        };
        return (Some(repaired), outcome);
    }

    warn!(
        code = %candidate.occupation_code,
        title = %candidate.occupation_title,
        "Discarding candidate with no reference match"
    );
    (
        None,
        CandidateOutcome::Discarded {
            occupation_code: candidate.occupation_code,
            occupation_title: candidate.occupation_title,
        },
    )
}
